//! Error types for the flock core.

use std::fmt;

/// Errors raised when a manager is configured or asked to spawn with
/// values it cannot simulate.
#[derive(Debug, Clone, PartialEq)]
pub enum FlockError {
    /// A settings field is out of its accepted range.
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
        value: f32,
    },
    /// Arguments passed directly to a spawn call are out of range.
    InvalidSpawn { reason: &'static str, value: f32 },
}

impl FlockError {
    pub(crate) fn config(field: &'static str, reason: &'static str, value: f32) -> Self {
        FlockError::InvalidConfig {
            field,
            reason,
            value,
        }
    }
}

impl fmt::Display for FlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlockError::InvalidConfig {
                field,
                reason,
                value,
            } => write!(f, "invalid setting `{}` = {}: {}", field, value, reason),
            FlockError::InvalidSpawn { reason, value } => {
                write!(f, "invalid spawn request ({}): {}", value, reason)
            }
        }
    }
}

impl std::error::Error for FlockError {}
