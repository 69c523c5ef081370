//! Canvas 2D rendering
//!
//! Pure read-only views of the simulation state. Contact expiry and every
//! other mutation happens in `sim::tick`, never here.

pub mod particles;
pub mod sweep;

pub use particles::ParticleRenderer;
pub use sweep::SweepRenderer;
