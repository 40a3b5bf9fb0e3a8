//! releve-ingest: PDF statement text extraction with an OCR fallback.

pub mod ocr;
pub mod pdf;
pub mod types;

pub use ocr::{NoOcr, OcrEngine, TesseractOcr};
pub use pdf::{PdfTextExtractor, render_pages, write_text};
pub use types::{ExtractionError, PageSource, PageText};
