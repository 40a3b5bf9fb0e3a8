//! OCR fallback for pages without a text layer.
//!
//! The Tesseract engine shells out to two Poppler/Tesseract binaries:
//!
//!   pdftoppm -f N -l N -r 300 -png -singlefile statement.pdf /tmp/x/page
//!   tesseract /tmp/x/page.png stdout -l fra+eng

use std::io;
use std::path::Path;
use std::process::{Command, Output};

use crate::types::ExtractionError;

/// Recognizes the text of a single PDF page from its rendered image.
pub trait OcrEngine {
    fn recognize_page(&self, pdf: &Path, page: u32) -> Result<String, ExtractionError>;
}

/// Engine used when OCR is turned off: every image-only page is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn recognize_page(&self, _pdf: &Path, page: u32) -> Result<String, ExtractionError> {
        Err(ExtractionError::OcrUnavailable(format!(
            "page {page} has no text layer and OCR is disabled"
        )))
    }
}

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pub pdftoppm: String,
    pub tesseract: String,
    pub language: String,
    pub dpi: u32,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            pdftoppm: "pdftoppm".to_string(),
            tesseract: "tesseract".to_string(),
            language: "fra+eng".to_string(),
            dpi: 300,
        }
    }
}

fn run(cmd: &mut Command, bin: &str, page: u32) -> Result<Output, ExtractionError> {
    let out = cmd.output().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            ExtractionError::OcrUnavailable(format!("`{bin}` not found on PATH"))
        }
        _ => ExtractionError::Ocr {
            page,
            message: format!("spawning {bin}: {e}"),
        },
    })?;

    if !out.status.success() {
        return Err(ExtractionError::Ocr {
            page,
            message: format!(
                "{bin} exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        });
    }
    Ok(out)
}

impl OcrEngine for TesseractOcr {
    fn recognize_page(&self, pdf: &Path, page: u32) -> Result<String, ExtractionError> {
        let scratch = tempfile::tempdir().map_err(|source| ExtractionError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        let prefix = scratch.path().join("page");
        let image = prefix.with_extension("png");

        let page_arg = page.to_string();
        let dpi_arg = self.dpi.to_string();
        let mut render = Command::new(&self.pdftoppm);
        render
            .args(["-f", page_arg.as_str(), "-l", page_arg.as_str()])
            .args(["-r", dpi_arg.as_str(), "-png", "-singlefile"])
            .arg(pdf)
            .arg(&prefix);
        run(&mut render, &self.pdftoppm, page)?;

        let mut recognize = Command::new(&self.tesseract);
        recognize
            .arg(&image)
            .args(["stdout", "-l", self.language.as_str()]);
        let out = run(&mut recognize, &self.tesseract, page)?;

        tracing::debug!(page, bytes = out.stdout.len(), "tesseract finished");
        // scratch dir (and the rendered image) is removed on drop
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ocr_refuses() {
        let err = NoOcr.recognize_page(Path::new("x.pdf"), 2).unwrap_err();
        assert!(matches!(err, ExtractionError::OcrUnavailable(ref m) if m.contains("page 2")));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let ocr = TesseractOcr {
            pdftoppm: "releve-test-no-such-pdftoppm".to_string(),
            ..TesseractOcr::default()
        };
        let err = ocr.recognize_page(Path::new("x.pdf"), 1).unwrap_err();
        assert!(matches!(err, ExtractionError::OcrUnavailable(_)));
    }
}
