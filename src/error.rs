//! Error type for engine construction and configuration.
//!
//! Nothing in the per-sample audio path returns an error. Degenerate runtime
//! input (zero-length grains, exhausted pools, out-of-range positions) degrades
//! to shorter or silent output instead.

use thiserror::Error;

/// Errors raised while building or reconfiguring a grain engine.
#[derive(Debug, Error)]
pub enum GrainError {
    /// A duration was non-finite, non-positive, or rounds to zero samples.
    #[error("invalid {name}: {value} (must be finite and at least one sample long)")]
    InvalidDuration {
        /// Name of the offending setting
        name: &'static str,
        /// The rejected value in seconds
        value: f64,
    },

    /// The requested polyphony limit is zero or exceeds the pool capacity.
    #[error("invalid max active grains: {requested} (pool capacity is {capacity})")]
    InvalidMaxActiveGrains {
        /// Requested limit
        requested: usize,
        /// Number of voices in the pool
        capacity: usize,
    },

    /// A clock subdivision of zero was requested.
    #[error("clock subdivision must be at least 1")]
    InvalidSubdivision,

    /// The internal clock tempo was non-finite or non-positive.
    #[error("invalid tempo: {0} BPM")]
    InvalidTempo(f64),

    /// The WAV file could not be read.
    #[cfg(feature = "wav")]
    #[error("failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),

    /// The WAV file contained no frames.
    #[cfg(feature = "wav")]
    #[error("WAV file contains no samples")]
    EmptyWav,
}

/// Result alias used by fallible constructors in this crate.
pub type Result<T> = std::result::Result<T, GrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = GrainError::InvalidDuration {
            name: "history_seconds",
            value: -1.0,
        };
        assert_eq!(
            err.to_string(),
            "invalid history_seconds: -1 (must be finite and at least one sample long)"
        );

        let err = GrainError::InvalidMaxActiveGrains {
            requested: 9,
            capacity: 8,
        };
        assert_eq!(
            err.to_string(),
            "invalid max active grains: 9 (pool capacity is 8)"
        );

        assert_eq!(GrainError::InvalidTempo(0.0).to_string(), "invalid tempo: 0 BPM");
    }
}
