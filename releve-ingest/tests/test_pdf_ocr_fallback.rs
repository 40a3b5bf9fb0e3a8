use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use releve_ingest::{ExtractionError, NoOcr, OcrEngine, PageSource, PdfTextExtractor, render_pages};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Build a PDF whose pages carry the given text (`None` = image-only page).
fn build_pdf(dir: &Path, pages: &[Option<&str>]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = match text {
            Some(t) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*t)]),
                Operation::new("ET", vec![]),
            ],
            None => vec![],
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join("releve.pdf");
    doc.save(&path).unwrap();
    path
}

/// Records which pages were sent to OCR and answers with a canned line.
#[derive(Clone, Default)]
struct RecordingOcr {
    seen: Rc<RefCell<Vec<u32>>>,
}

impl OcrEngine for RecordingOcr {
    fn recognize_page(&self, _pdf: &Path, page: u32) -> Result<String, ExtractionError> {
        self.seen.borrow_mut().push(page);
        Ok(format!("SCANNED PAGE {page}"))
    }
}

#[test]
fn test_text_pages_skip_ocr() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = build_pdf(dir.path(), &[Some("SOLDE CREDITEUR"), Some("VIREMENT RECU")]);

    let ocr = RecordingOcr::default();
    let pages = PdfTextExtractor::new(ocr.clone()).extract_pages(&pdf).unwrap();

    assert_eq!(pages.len(), 2);
    assert!(pages[0].text.contains("SOLDE"));
    assert!(pages[1].text.contains("VIREMENT"));
    assert!(pages.iter().all(|p| p.source == PageSource::Direct));
    assert!(ocr.seen.borrow().is_empty());
}

#[test]
fn test_empty_page_falls_back_to_ocr_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = build_pdf(dir.path(), &[Some("SOLDE CREDITEUR"), None, Some("NOUVEAU SOLDE")]);

    let ocr = RecordingOcr::default();
    let pages = PdfTextExtractor::new(ocr.clone()).extract_pages(&pdf).unwrap();

    assert_eq!(pages.iter().map(|p| p.number).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(pages[1].source, PageSource::Ocr);
    assert_eq!(pages[1].text, "SCANNED PAGE 2");
    assert_eq!(*ocr.seen.borrow(), vec![2]);

    let rendered = render_pages(&pages);
    assert!(rendered.starts_with("Page 1:\n"));
    assert!(rendered.contains("\n\nPage 2:\nSCANNED PAGE 2\n\nPage 3:\n"));
}

#[test]
fn test_image_only_page_without_ocr_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = build_pdf(dir.path(), &[None]);

    let err = PdfTextExtractor::new(NoOcr).extract_pages(&pdf).unwrap_err();
    assert!(matches!(err, ExtractionError::OcrUnavailable(_)));
}
