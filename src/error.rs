//! Error types and result aliases for fparse.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used throughout the crate
//! - [`FatalError`]: the few conditions that abort a parse outright
//!
//! Everything recoverable (mismatched end names, unclassifiable statements,
//! duplicate declarations) is *not* an error in this sense; it is collected
//! as a [`crate::diag::Diagnostic`] and the parse continues.

use anyhow::Result as AnyhowResult;
use thiserror::Error;

pub type Result<T> = AnyhowResult<T>;

/// Unrecoverable parse failures.
#[derive(Debug, Error)]
pub enum FatalError {
    /// Block nesting exceeded the configured maximum. Guards against
    /// pathological inputs driving unbounded recursion.
    #[error("line {line}: block nesting depth exceeds the configured maximum of {max}")]
    NestingTooDeep { line: usize, max: usize },

    /// A single logical line spanned more continuation lines than allowed.
    #[error("line {line}: logical line exceeds {max} continuation lines")]
    TooManyContinuations { line: usize, max: usize },
}
