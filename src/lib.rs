//! Graincloud - granular synthesis over a live audio input
//!
//! The engine records its input into a rolling history and, on clock ticks,
//! spawns short *grains*: voices that copy a window of the history and replay
//! it with their own speed, volume, pan and envelope. A fixed pool of voices
//! is allocated up front and recycled by stealing the oldest grain, so the
//! audio path never allocates.
//!
//! # Quick start
//!
//! ```
//! use graincloud::{EngineConfig, GrainEngine, GrainSettings, TriggerStrategy};
//!
//! let config = EngineConfig::default()
//!     .with_strategy(TriggerStrategy::cloud(4800.0, 1200.0))
//!     .with_settings(GrainSettings::default().with_density(0.8));
//! let mut engine = GrainEngine::<48000, 32>::new(&config).unwrap();
//!
//! // feed input audio and a clock voltage, one frame at a time
//! let out = engine.process(0.25, 10.0);
//! assert!(out.abs() <= 1.0);
//! ```
//!
//! The building blocks are usable on their own: [`grains::GrainPool`] only
//! needs something implementing [`history::HistoryBuffer`], and
//! [`triggers::TriggerStrategy`] can schedule into any pool.

pub mod clock;
pub mod envelopes;
pub mod frame;
pub mod grains;
pub mod history;
pub mod triggers;

mod config;
mod engine;
mod error;

// Re-export commonly used types at the crate root
pub use clock::ClockMode;
pub use config::EngineConfig;
pub use engine::GrainEngine;
pub use envelopes::{Curve, GrainEnvelope};
pub use error::{GrainError, Result};
pub use frame::{Frame, Stereo};
pub use grains::{Grain, GrainPool, GrainRequest};
pub use history::{HistoryBuffer, RingBuffer};
pub use triggers::{Cloud, GrainSettings, Periodic, RandomWindow, SpeedMapping, TriggerStrategy};
