//! Per-page PDF text extraction with OCR fallback.
//!
//! Output layout of the intermediate text file:
//!
//!   Page 1:
//!   <text of page 1>
//!
//!   Page 2:
//!   <text of page 2>

use lopdf::Document;
use std::fs;
use std::path::Path;

use crate::ocr::OcrEngine;
use crate::types::{ExtractionError, PageSource, PageText};

pub struct PdfTextExtractor {
    ocr: Box<dyn OcrEngine>,
}

impl PdfTextExtractor {
    pub fn new(ocr: impl OcrEngine + 'static) -> Self {
        Self { ocr: Box::new(ocr) }
    }

    /// Extract every page in document order.
    ///
    /// A page whose text layer is empty (or only whitespace) is handed to
    /// the OCR engine; its error aborts the whole extraction.
    pub fn extract_pages(&self, path: impl AsRef<Path>) -> Result<Vec<PageText>, ExtractionError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ExtractionError::InputNotFound(path.to_path_buf()));
        }

        let doc = Document::load(path).map_err(|e| ExtractionError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        // BTreeMap keyed by page number, so iteration is already ordered
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut out = Vec::with_capacity(page_numbers.len());

        for number in page_numbers {
            let direct = match doc.extract_text(&[number]) {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!(page = number, error = %e, "no usable text layer");
                    String::new()
                }
            };

            let page = if direct.trim().is_empty() {
                tracing::warn!(page = number, path = %path.display(), "empty text layer, falling back to OCR");
                PageText {
                    number,
                    text: self.ocr.recognize_page(path, number)?,
                    source: PageSource::Ocr,
                }
            } else {
                PageText {
                    number,
                    text: direct,
                    source: PageSource::Direct,
                }
            };
            out.push(page);
        }

        tracing::info!(
            path = %path.display(),
            pages = out.len(),
            ocr_pages = out.iter().filter(|p| p.source == PageSource::Ocr).count(),
            "extracted PDF text"
        );
        Ok(out)
    }

    /// Extract and render in one step.
    pub fn extract_text(&self, path: impl AsRef<Path>) -> Result<String, ExtractionError> {
        Ok(render_pages(&self.extract_pages(path)?))
    }
}

/// Concatenate pages with their `Page N:` markers and a blank-line separator.
pub fn render_pages(pages: &[PageText]) -> String {
    let mut s = String::new();
    for p in pages {
        s.push_str(&format!("Page {}:\n", p.number));
        s.push_str(&p.text);
        s.push_str("\n\n");
    }
    s
}

/// Write rendered pages to `path`, replacing any previous content.
pub fn write_text(path: impl AsRef<Path>, pages: &[PageText]) -> Result<(), ExtractionError> {
    let path = path.as_ref();
    let io_err = |source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    fs::write(path, render_pages(pages)).map_err(io_err)
}
