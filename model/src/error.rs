//! Error kinds for the registry model (spec section 7).
//!
//! All are fatal: the loader, resolver, and gate never return a partially
//! built `Registry` on error, they return `Err` and leave the caller with
//! nothing to act on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VenusError {
    #[error("malformed C declaration: {input:?}")]
    MalformedDecl { input: String },

    #[error("type {name:?} referenced but not defined in the registry")]
    MissingType { name: String },

    #[error("command {command:?} is in scope but {enum_name:?} is not defined in VkCommandTypeEXT")]
    OpcodeMissing { command: String, enum_name: String },

    #[error("opcode table has {actual} values, expected {expected} (commands + aliases)")]
    OpcodeMismatch { expected: usize, actual: usize },

    #[error("invariant violation: {detail}")]
    InvariantViolation { detail: String },

    #[error("failed to read registry XML")]
    Io(#[from] std::io::Error),

    #[error("failed to parse registry XML")]
    Xml(#[from] roxmltree::Error),
}

pub type Result<T> = std::result::Result<T, VenusError>;
