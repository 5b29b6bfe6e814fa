//! Signal Error Types

use thiserror::Error;

/// Errors raised while validating signal configuration
#[derive(Debug, Clone, Error)]
pub enum SignalError {
    /// Bound pair where the lower end exceeds the upper end
    #[error("{field}: lower bound {min} exceeds upper bound {max}")]
    InvertedBounds {
        field: &'static str,
        min: f64,
        max: f64,
    },

    /// Value outside the 0-100 score scale
    #[error("{field} value {value} is out of range [0, 100]")]
    OutOfScale { field: &'static str, value: f64 },

    /// Per-tick step that is negative or not finite
    #[error("{field} step {value} must be finite and non-negative")]
    InvalidStep { field: &'static str, value: f64 },
}
