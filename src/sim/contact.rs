//! Contact spawning and detection report synthesis

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{Contact, ContactReport, ScopeState, ThreatLevel};
use crate::consts::*;
use crate::polar_to_cartesian;

/// Spawn a contact at a random position inside the scope ring
pub fn spawn_periodic(state: &mut ScopeState, now_ms: f64) {
    let angle = state.rng.random_range(0.0..TAU);
    let max_dist = (state.scope_radius() - SPAWN_RING_INSET).max(SPAWN_RING_INSET);
    let dist = state.rng.random_range(SPAWN_RING_INSET..=max_dist);
    let pos = state.center() + polar_to_cartesian(dist, angle);
    let is_target = state.rng.random_bool(TARGET_PROBABILITY);
    push_contact(state, pos, is_target, now_ms);
}

/// Spawn a contact at a clicked surface coordinate
pub fn spawn_at_point(state: &mut ScopeState, pos: Vec2, now_ms: f64) {
    let is_target = state.rng.random_bool(CLICK_TARGET_PROBABILITY);
    push_contact(state, pos, is_target, now_ms);
}

fn push_contact(state: &mut ScopeState, pos: Vec2, is_target: bool, now_ms: f64) {
    let id = state.next_contact_id();
    state.contacts.push(Contact {
        id,
        pos,
        born_ms: now_ms,
        is_target,
        detected: false,
    });
    state.contacts_observed += 1;
}

impl ContactReport {
    /// Synthesize the popup intelligence for a painted contact.
    ///
    /// `half_surface` scales pixel distance onto the 0-5 unit readout.
    pub fn compile(
        contact: &Contact,
        center: Vec2,
        half_surface: f32,
        now_ms: f64,
        rng: &mut Pcg32,
    ) -> Self {
        let delta_x = contact.pos.x - center.x;
        // Screen Y grows downward; invert so bearing 0 points up
        let delta_y = center.y - contact.pos.y;
        let bearing_deg = (delta_x.atan2(delta_y).to_degrees() + 360.0) % 360.0;
        let distance_units =
            (delta_x * delta_x + delta_y * delta_y).sqrt() / half_surface * DISTANCE_UNITS;

        let lat = BASE_LAT + (rng.random::<f64>() - 0.5) * COORD_JITTER_DEG;
        let lon = BASE_LON + (rng.random::<f64>() - 0.5) * COORD_JITTER_DEG;

        Self {
            latitude: format_degrees_minutes(lat, 'N', 'S'),
            longitude: format_degrees_minutes(lon, 'E', 'W'),
            bearing_deg,
            distance_units,
            threat: draw_threat(contact.is_target, rng),
            logged_at: format_clock(now_ms),
        }
    }
}

/// Uniform draw within the pair allowed for the contact class
fn draw_threat(is_target: bool, rng: &mut Pcg32) -> ThreatLevel {
    let high = rng.random_bool(0.5);
    match (is_target, high) {
        (true, true) => ThreatLevel::Critical,
        (true, false) => ThreatLevel::High,
        (false, true) => ThreatLevel::Medium,
        (false, false) => ThreatLevel::Low,
    }
}

/// Military-style degrees-minutes, e.g. `35°17.201'N`
fn format_degrees_minutes(value: f64, positive: char, negative: char) -> String {
    let direction = if value >= 0.0 { positive } else { negative };
    let abs = value.abs();
    let degrees = abs.floor();
    let minutes = (abs - degrees) * 60.0;
    format!("{}\u{b0}{:.3}'{}", degrees as u32, minutes, direction)
}

/// `HH:MM:SSZ` from epoch milliseconds (UTC)
fn format_clock(now_ms: f64) -> String {
    let day_secs = ((now_ms / 1000.0) as i64).rem_euclid(86_400);
    let hours = day_secs / 3600;
    let minutes = (day_secs % 3600) / 60;
    let seconds = day_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}Z")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn contact_at(pos: Vec2, is_target: bool) -> Contact {
        Contact {
            id: 1,
            pos,
            born_ms: 0.0,
            is_target,
            detected: false,
        }
    }

    #[test]
    fn test_bearing_cardinals() {
        let mut rng = Pcg32::seed_from_u64(7);
        let center = Vec2::splat(300.0);

        // Straight up is north
        let report =
            ContactReport::compile(&contact_at(Vec2::new(300.0, 100.0), false), center, 300.0, 0.0, &mut rng);
        assert!(report.bearing_deg.abs() < 0.5);

        // Straight right is east
        let report =
            ContactReport::compile(&contact_at(Vec2::new(500.0, 300.0), false), center, 300.0, 0.0, &mut rng);
        assert!((report.bearing_deg - 90.0).abs() < 0.5);

        // Straight down is south
        let report =
            ContactReport::compile(&contact_at(Vec2::new(300.0, 500.0), false), center, 300.0, 0.0, &mut rng);
        assert!((report.bearing_deg - 180.0).abs() < 0.5);
    }

    #[test]
    fn test_distance_scaling() {
        let mut rng = Pcg32::seed_from_u64(7);
        let center = Vec2::splat(300.0);
        // Contact at the surface edge reads the full 5 units
        let report =
            ContactReport::compile(&contact_at(Vec2::new(600.0, 300.0), false), center, 300.0, 0.0, &mut rng);
        assert!((report.distance_units - 5.0).abs() < 0.01);
        // Contact at center reads zero
        let report = ContactReport::compile(&contact_at(center, false), center, 300.0, 0.0, &mut rng);
        assert!(report.distance_units.abs() < 0.01);
    }

    #[test]
    fn test_clock_format() {
        assert_eq!(format_clock(0.0), "00:00:00Z");
        // 13:45:07 UTC on some day
        let ms = ((13 * 3600 + 45 * 60 + 7) * 1000) as f64 + 86_400_000.0 * 3.0;
        assert_eq!(format_clock(ms), "13:45:07Z");
    }

    #[test]
    fn test_coordinate_format() {
        assert_eq!(format_degrees_minutes(35.5, 'N', 'S'), "35\u{b0}30.000'N");
        assert_eq!(format_degrees_minutes(-23.25, 'E', 'W'), "23\u{b0}15.000'W");
    }

    proptest! {
        #[test]
        fn prop_threat_matches_class(seed in any::<u64>(), is_target in any::<bool>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let threat = draw_threat(is_target, &mut rng);
            prop_assert_eq!(threat.is_hostile(), is_target);
        }

        #[test]
        fn prop_bearing_in_range(seed in any::<u64>(), x in 0.0f32..600.0, y in 0.0f32..600.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let report = ContactReport::compile(
                &contact_at(Vec2::new(x, y), false),
                Vec2::splat(300.0),
                300.0,
                0.0,
                &mut rng,
            );
            prop_assert!((0.0..360.0).contains(&report.bearing_deg));
            prop_assert!(report.distance_units >= 0.0);
        }
    }
}
