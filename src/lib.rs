//! Sonar Scope - a submarine sonar display toy
//!
//! Core modules:
//! - `sim`: Deterministic simulation (sweep, contacts, detection, countdown)
//! - `renderer`: Canvas 2D painting of the scope and particle field
//! - `audio`: Procedural Web Audio pings and explosion
//! - `settings`: User preferences persisted in LocalStorage

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Scope configuration constants
pub mod consts {
    /// Sweep rotation rate (radians per second; one revolution ~13s)
    pub const SWEEP_RATE: f32 = 0.48;
    /// Angular window within which the sweep paints a contact
    pub const HIT_THRESHOLD: f32 = 0.05;

    /// Contacts fade out and are dropped after this age
    pub const CONTACT_MAX_AGE_MS: f64 = 8000.0;
    /// Periodic spawn window: base + uniform jitter
    pub const SPAWN_BASE_MS: f64 = 3000.0;
    pub const SPAWN_JITTER_MS: f64 = 7000.0;
    /// First automatic contact appears this long after startup
    pub const FIRST_SPAWN_DELAY_MS: f64 = 2000.0;
    /// Minimum interval between click-spawned contacts
    pub const CLICK_DEBOUNCE_MS: f64 = 500.0;

    /// Detection popup auto-dismisses after this long
    pub const POPUP_DISMISS_MS: f64 = 6000.0;
    /// Missile countdown: starting count, tick period, and post-impact rearm delay
    pub const COUNTDOWN_START: u8 = 3;
    pub const COUNTDOWN_STEP_MS: f64 = 1000.0;
    pub const REARM_DELAY_MS: f64 = 4000.0;

    /// Square sonar surface is capped at this side length (CSS pixels)
    pub const MAX_SURFACE: f32 = 600.0;
    /// Gap between the outermost range ring and the canvas edge
    pub const SCOPE_MARGIN: f32 = 20.0;
    /// Automatic spawns keep this distance from center and rim
    pub const SPAWN_RING_INSET: f32 = 40.0;

    /// Probability that a spawned contact is hostile
    pub const TARGET_PROBABILITY: f64 = 0.3;
    /// Click-spawned contacts are hostile more often
    pub const CLICK_TARGET_PROBABILITY: f64 = 0.5;

    /// Cosmetic range readout baseline and wobble amplitude
    pub const RANGE_BASELINE: f32 = 5.2;
    pub const RANGE_WOBBLE: f32 = 0.3;
    /// Popup distance readout spans 0..=5 notional units across the scope radius
    pub const DISTANCE_UNITS: f32 = 5.0;

    /// Fictional reference position for synthesized coordinates
    pub const BASE_LAT: f64 = 35.2851;
    pub const BASE_LON: f64 = 23.4567;
    /// Coordinates jitter within ±half of this (degrees)
    pub const COORD_JITTER_DEG: f64 = 0.1;

    /// Sweep trail: number of fading arc segments and angular step between them
    pub const TRAIL_SEGMENTS: u32 = 30;
    pub const TRAIL_STEP: f32 = 0.02;

    /// Detection ping parameters (frequency Hz, duration ms, volume)
    pub const PING_TARGET: (f32, f64, f32) = (440.0, 800.0, 0.7);
    pub const PING_CONTACT: (f32, f64, f32) = (520.0, 450.0, 0.5);
    pub const PING_COUNTDOWN: (f32, f64, f32) = (800.0, 200.0, 0.4);
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_sweep(angle: f32) -> f32 {
    angle.rem_euclid(std::f32::consts::TAU)
}

/// Shorter-arc angular separation between two angles, in [0, π]
#[inline]
pub fn angular_separation(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(std::f32::consts::TAU);
    diff.min(std::f32::consts::TAU - diff)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    #[test]
    fn test_normalize_sweep_range() {
        assert!((normalize_sweep(TAU + 0.25) - 0.25).abs() < 1e-6);
        assert!((normalize_sweep(-0.25) - (TAU - 0.25)).abs() < 1e-6);
        assert_eq!(normalize_sweep(0.0), 0.0);
    }

    #[test]
    fn test_angular_separation_wraps() {
        // Sweep at 0 vs contact just shy of a full turn: short way around
        assert!((angular_separation(0.0, TAU - 0.01) - 0.01).abs() < 1e-5);
        assert!((angular_separation(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-5);
        assert!(angular_separation(1.0, 1.0).abs() < 1e-6);
    }
}
