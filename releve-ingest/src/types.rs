use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSource {
    /// Text layer read straight from the PDF
    Direct,
    /// Recognized from a rendered image of the page
    Ocr,
}

/// Text of one PDF page. `number` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub number: u32,
    pub text: String,
    pub source: PageSource,
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("cannot read PDF {}: {message}", .path.display())]
    Pdf { path: PathBuf, message: String },

    /// No recognition engine to fall back on (disabled or binary missing).
    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("OCR failed on page {page}: {message}")]
    Ocr { page: u32, message: String },

    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
