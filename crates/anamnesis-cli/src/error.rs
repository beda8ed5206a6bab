use std::path::PathBuf;

use thiserror::Error;

use anamnesis_export::error::ExportError;
use anamnesis_gemini::error::GeminiError;
use anamnesis_storage::error::StorageError;

/// Rejections raised while reading an input file, before any model call.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type {extension:?} for {path}; expected {expected}")]
    UnsupportedType {
        path: PathBuf,
        extension: String,
        expected: &'static str,
    },

    #[error("file is empty: {0}")]
    Empty(PathBuf),

    #[error("file is too large for inline upload ({size} bytes, limit {limit}): {path}")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("file is not valid UTF-8 text: {0}")]
    Encoding(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Queixa Principal + HDA must have at least {min} characters (got {len})")]
    ComplaintTooShort { len: usize, min: usize },

    #[error("no diagnosis selected")]
    NothingSelected,

    #[error("no training case in progress")]
    NotTraining,

    #[error("investigation request is empty")]
    EmptyRequest,

    #[error("student analysis needs a principal hypothesis")]
    MissingHypothesis,

    #[error("training cases are not saved to the history")]
    TrainingCaseNotSaved,

    #[error("case history is not available in this session")]
    NoCaseStore,

    #[error("saved case not found: {0}")]
    CaseNotFound(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Gemini(#[from] GeminiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
