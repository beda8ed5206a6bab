//! Input file validation for document and audio imports.
//!
//! Everything here runs before the model is called: unsupported types, empty
//! files and files too large for an inline upload never reach the network.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ImportError;

/// Inline request payloads are capped at 20 MiB.
pub const MAX_INLINE_BYTES: u64 = 20 * 1024 * 1024;

const DOCUMENT_TYPES: &str = ".txt or .pdf";
const AUDIO_TYPES: &str = ".wav, .mp3, .ogg, .webm, .m4a, .aac or .flac";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
}

/// A validated document, read into memory.
#[derive(Debug, Clone)]
pub enum Document {
    Text(String),
    Pdf(Vec<u8>),
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn unsupported(path: &Path, extension: String, expected: &'static str) -> ImportError {
    ImportError::UnsupportedType {
        path: path.to_path_buf(),
        extension,
        expected,
    }
}

pub fn document_kind(path: &Path) -> Result<DocumentKind, ImportError> {
    match extension(path).as_str() {
        "txt" => Ok(DocumentKind::Text),
        "pdf" => Ok(DocumentKind::Pdf),
        other => Err(unsupported(path, other.to_string(), DOCUMENT_TYPES)),
    }
}

/// MIME type sent with an audio upload, from the file extension.
pub fn audio_mime_type(path: &Path) -> Result<&'static str, ImportError> {
    match extension(path).as_str() {
        "wav" => Ok("audio/wav"),
        "mp3" => Ok("audio/mp3"),
        "ogg" => Ok("audio/ogg"),
        "webm" => Ok("audio/webm"),
        "m4a" => Ok("audio/mp4"),
        "aac" => Ok("audio/aac"),
        "flac" => Ok("audio/flac"),
        other => Err(unsupported(path, other.to_string(), AUDIO_TYPES)),
    }
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>, ImportError> {
    let io_error = |source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = tokio::fs::metadata(path).await.map_err(io_error)?.len();
    if size == 0 {
        return Err(ImportError::Empty(path.to_path_buf()));
    }
    if size > MAX_INLINE_BYTES {
        return Err(ImportError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_INLINE_BYTES,
        });
    }
    let bytes = tokio::fs::read(path).await.map_err(io_error)?;
    debug!(path = %path.display(), bytes = bytes.len(), "file read");
    Ok(bytes)
}

/// Read a `.txt` or `.pdf` file. Text files must hold non-blank UTF-8.
pub async fn read_document(path: &Path) -> Result<Document, ImportError> {
    let kind = document_kind(path)?;
    let bytes = read_bytes(path).await?;
    match kind {
        DocumentKind::Pdf => Ok(Document::Pdf(bytes)),
        DocumentKind::Text => {
            let text = String::from_utf8(bytes).map_err(|_| ImportError::Encoding(path.to_path_buf()))?;
            if text.trim().is_empty() {
                return Err(ImportError::Empty(path.to_path_buf()));
            }
            Ok(Document::Text(text))
        }
    }
}

/// A validated audio recording.
#[derive(Debug, Clone)]
pub struct Recording {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

pub async fn read_audio(path: &Path) -> Result<Recording, ImportError> {
    let mime_type = audio_mime_type(path)?;
    let bytes = read_bytes(path).await?;
    Ok(Recording {
        path: path.to_path_buf(),
        mime_type,
        bytes,
    })
}
