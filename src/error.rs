//! Crate-wide error type.

use std::path::PathBuf;

use crate::data::expr::ExprError;

/// Errors surfaced by graph building, log reading and export.
///
/// Per-record expression failures never show up here: the extraction pipeline
/// skips the offending field for that record instead.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}:{line}: malformed log record: {msg}")]
    LogParse {
        path: PathBuf,
        line: usize,
        msg: String,
    },

    #[error("expression error: {0}")]
    Expr(#[from] ExprError),

    #[error("Number of labels ({labels}) must match number of fields ({expected})")]
    LabelCount { labels: usize, expected: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No data to graph")]
    NoData,

    #[error("unsupported output format: {0}")]
    UnsupportedOutput(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("GUI error: {0}")]
    Gui(String),
}

impl From<eframe::Error> for GraphError {
    fn from(e: eframe::Error) -> Self {
        GraphError::Gui(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
