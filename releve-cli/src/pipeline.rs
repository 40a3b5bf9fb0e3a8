//! Outer driver: file discovery, stage sequencing, report printing.
//!
//! Each stage reads files and writes files; nothing here is shared between
//! documents, and the first error stops the run.

use anyhow::{Context, Result, bail};
use releve_core::{AccountStatement, Reconciler, Reconciliation, write_statement};
use releve_ingest::{PdfTextExtractor, write_text};
use releve_llm::StatementStructurer;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `<output_dir>/<input stem>.<ext>`
pub fn output_path(output_dir: &Path, input: &Path, ext: &str) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "statement".into());
    name.push(".");
    name.push(ext);
    output_dir.join(name)
}

fn is_pdf(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// PDFs directly inside `dir`, sorted by file name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("input directory not found: {}", dir.display());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let p = entry.with_context(|| format!("read {}", dir.display()))?.path();
        if p.is_file() && is_pdf(&p) {
            out.push(p);
        }
    }
    out.sort();
    Ok(out)
}

/// Stage 1: PDF → text file. Returns the number of pages written.
pub fn extract(extractor: &PdfTextExtractor, pdf: &Path, out: &Path) -> Result<usize> {
    let pages = extractor
        .extract_pages(pdf)
        .with_context(|| format!("extracting {}", pdf.display()))?;
    write_text(out, &pages).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(pdf = %pdf.display(), out = %out.display(), "text extracted");
    Ok(pages.len())
}

/// Statement text from a `.pdf` (extracted on the fly) or any text file.
pub fn read_statement_text(extractor: &PdfTextExtractor, input: &Path) -> Result<String> {
    if !input.exists() {
        bail!("input not found: {}", input.display());
    }
    if is_pdf(input) {
        return extractor
            .extract_text(input)
            .with_context(|| format!("extracting {}", input.display()));
    }
    fs::read_to_string(input).with_context(|| format!("read {}", input.display()))
}

/// Stage 2: text → structured JSON file.
pub fn structure(
    structurer: &dyn StatementStructurer,
    extractor: &PdfTextExtractor,
    input: &Path,
    out: &Path,
) -> Result<AccountStatement> {
    let text = read_statement_text(extractor, input)?;
    let statement = structurer
        .structure(&text)
        .with_context(|| format!("structuring {}", input.display()))?;
    write_statement(out, &statement).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(input = %input.display(), out = %out.display(), "statement written");
    Ok(statement)
}

/// Stage 2 over every PDF of a directory. Returns the JSON files written.
pub fn structure_dir(
    structurer: &dyn StatementStructurer,
    extractor: &PdfTextExtractor,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let pdfs = list_pdfs(input_dir)?;
    if pdfs.is_empty() {
        tracing::warn!(dir = %input_dir.display(), "no PDF found");
    }

    let mut written = Vec::with_capacity(pdfs.len());
    for pdf in pdfs {
        let out = output_path(output_dir, &pdf, "json");
        structure(structurer, extractor, &pdf, &out)?;
        written.push(out);
    }
    Ok(written)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub balanced: usize,
    pub mismatched: usize,
}

impl ReconcileSummary {
    fn record(&mut self, r: &Reconciliation) {
        if r.is_balanced() {
            self.balanced += 1;
        } else {
            self.mismatched += 1;
        }
    }
}

/// Stage 3: print one report per JSON file.
///
/// A header line naming the file precedes each report when there is more
/// than one document.
pub fn reconcile_paths(
    reconciler: &Reconciler,
    paths: &[PathBuf],
    out: &mut impl Write,
) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();
    for p in paths {
        let r = reconciler
            .reconcile_file(p)
            .with_context(|| format!("reconciling {}", p.display()))?;
        if paths.len() > 1 {
            writeln!(out, "== {}", p.display())?;
        }
        writeln!(out, "{r}")?;
        summary.record(&r);
    }
    Ok(summary)
}

/// All three stages for every PDF of `input_dir`.
pub fn run_all(
    structurer: &dyn StatementStructurer,
    extractor: &PdfTextExtractor,
    reconciler: &Reconciler,
    input_dir: &Path,
    output_dir: &Path,
    out: &mut impl Write,
) -> Result<ReconcileSummary> {
    let mut summary = ReconcileSummary::default();
    for pdf in list_pdfs(input_dir)? {
        let txt = output_path(output_dir, &pdf, "txt");
        let json = output_path(output_dir, &pdf, "json");

        extract(extractor, &pdf, &txt)?;
        let statement = structure(structurer, extractor, &txt, &json)?;
        let r = reconciler
            .reconcile(&statement)
            .with_context(|| format!("reconciling {}", json.display()))?;

        writeln!(out, "== {}", pdf.display())?;
        writeln!(out, "{r}")?;
        summary.record(&r);
    }
    Ok(summary)
}
