//! Deterministic simulation module
//!
//! All scope behavior lives here. This module must stay pure and deterministic:
//! - Time passed in explicitly (milliseconds), never sampled
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod contact;
pub mod field;
pub mod state;
pub mod tick;

pub use field::{Particle, ParticleField};
pub use state::{
    Contact, ContactReport, CountdownState, PopupState, ScopeEvent, ScopeState, ThreatLevel,
};
pub use tick::{TickInput, tick};
