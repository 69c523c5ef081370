//! Ambient background particle field
//!
//! Purely cosmetic and fully independent of the sonar state. The field is
//! recreated wholesale on every resize; no particle identity survives.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

/// One particle per this much viewport area (square pixels)
pub const AREA_PER_PARTICLE: f32 = 15_000.0;
/// Pulse phase advance, radians per second
const PULSE_RATE: f32 = 1.2;
/// Particles closer than this get a connecting line
pub const LINK_DISTANCE: f32 = 100.0;

#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    /// Pixels per second
    pub vel: Vec2,
    pub size: f32,
    pub opacity: f32,
    pub pulse_phase: f32,
}

impl Particle {
    /// Pulsing brightness/size multiplier, oscillating in [0.4, 1.0]
    pub fn pulse(&self) -> f32 {
        self.pulse_phase.sin() * 0.3 + 0.7
    }
}

/// Viewport-sized drifting dot field
#[derive(Debug, Default)]
pub struct ParticleField {
    pub particles: Vec<Particle>,
    pub width: f32,
    pub height: f32,
}

impl ParticleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the field for a new viewport size
    pub fn resize(&mut self, width: f32, height: f32, rng: &mut Pcg32) {
        self.width = width;
        self.height = height;
        self.particles.clear();
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let count = ((width * height) / AREA_PER_PARTICLE) as usize;
        self.particles.reserve(count);
        for _ in 0..count {
            self.particles.push(Particle {
                pos: Vec2::new(rng.random_range(0.0..width), rng.random_range(0.0..height)),
                vel: Vec2::new(rng.random_range(-15.0..15.0), rng.random_range(-15.0..15.0)),
                size: rng.random_range(1.0..3.0),
                opacity: rng.random_range(0.1..0.6),
                pulse_phase: rng.random_range(0.0..std::f32::consts::TAU),
            });
        }
    }

    /// Drift, wrap at the edges, and advance the pulse
    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            if p.pos.x < 0.0 {
                p.pos.x = self.width;
            } else if p.pos.x > self.width {
                p.pos.x = 0.0;
            }
            if p.pos.y < 0.0 {
                p.pos.y = self.height;
            } else if p.pos.y > self.height {
                p.pos.y = 0.0;
            }
            p.pulse_phase = (p.pulse_phase + PULSE_RATE * dt).rem_euclid(std::f32::consts::TAU);
        }
    }
}
