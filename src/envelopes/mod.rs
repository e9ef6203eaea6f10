//! Grain amplitude envelopes.
//!
//! [`GrainEnvelope`] is the closed set of window shapes a grain can use, and
//! [`Curve`] shapes the individual rise and fall segments of those windows.

mod curve;
mod grain;

pub use curve::Curve;
pub use grain::{DEFAULT_ATTACK, DEFAULT_REVERSE_ATTACK, GrainEnvelope};
