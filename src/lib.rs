//! fparse - Fortran source parser and semantic analyzer
//!
//! Parses fixed-form 77, free-form 90/95, and signature-file sources into
//! a tree of typed statement nodes, then resolves implicit typing and
//! builds per-scope symbol tables.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod diag;
pub mod error;
pub mod parse;
pub mod sema;
pub mod source;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Config;
pub use diag::{DiagKind, Diagnostic, Diagnostics, Severity};
pub use error::{FatalError, Result};
pub use parse::{parse_items, parse_source, render_tree, Parsed};
pub use sema::analyze;
pub use source::{Dialect, FortranReader, Item, ItemSource, Span};
