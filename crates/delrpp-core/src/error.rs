//! Error types for delrpp

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelrppError {
    #[error("Unrecognized condition value: {0:#04x}")]
    UnrecognizedCondition(u8),
}

pub type Result<T> = std::result::Result<T, DelrppError>;
