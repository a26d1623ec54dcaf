//! CLI support for quill
//!
//! Provides programmatic access to the `quill` subcommands so they can be
//! embedded in other tools and exercised from tests without a process.

mod check;
mod convert;
mod docs;
mod stream;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use convert::{json_to_value, parse_type, value_to_json};
pub use docs::{DocCategory, describe_type, get_doc_category, get_docs_overview, list_types};
pub use stream::{StreamOptions, StreamSummary, execute_stream};

use std::io;

use thiserror::Error;

use crate::{BuildError, EvaluationFault};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("evaluation fault: {0}")]
    Fault(#[from] EvaluationFault),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Input JSON that does not fit the declared input type
    #[error("cannot read {found} as {expected}")]
    Decode { expected: String, found: String },

    #[error("no input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("unknown type: '{0}'\nRun 'quill types' to see available types.")]
    UnknownType(String),

    #[error("unknown category: '{0}'\nRun 'quill docs' to see available categories.")]
    UnknownCategory(String),

    #[error("{faulted} of {processed} elements faulted")]
    Faulted { processed: usize, faulted: usize },
}
