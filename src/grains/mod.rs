//! Grain voices and the fixed-capacity pool that allocates them.

mod pool;
mod voice;

pub use pool::GrainPool;
pub use voice::{Grain, GrainRequest};

pub(crate) use voice::seconds_to_samples;
