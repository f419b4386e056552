//! Document loaders turning raw bytes into ordered page records.
//!
//! - [`PdfLoader`]: one page per physical PDF page, via `lopdf`
//! - [`TextLoader`]: UTF-8 text with form-feed page breaks (`pdftotext` output)
//! - [`ExtensionLoader`]: dispatches on the document's file extension, falling
//!   back to the `%PDF-` signature for unknown or missing extensions

use tracing::{debug, warn};

use crate::document::{Page, SourceDocument};
use crate::error::{RagError, Result};

/// Turns one [`SourceDocument`] into its pages, in page order.
pub trait DocumentLoader: Send + Sync {
    /// Extract the pages of `document`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::LoadError`] when the bytes are not a parseable
    /// document of the expected format.
    fn load(&self, document: &SourceDocument) -> Result<Vec<Page>>;
}

/// Extracts per-page text from PDF bytes.
///
/// A page whose text cannot be extracted is kept with empty text so that
/// page indices stay aligned with physical pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    /// Create a new PDF loader.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, document: &SourceDocument) -> Result<Vec<Page>> {
        let pdf = lopdf::Document::load_mem(&document.bytes)
            .map_err(|e| RagError::load(&document.name, format!("not a readable PDF: {e}")))?;

        if pdf.is_encrypted() {
            return Err(RagError::load(&document.name, "encrypted PDFs are not supported"));
        }

        // get_pages is keyed by 1-based page number in document order.
        let pages: Vec<Page> = pdf
            .get_pages()
            .keys()
            .enumerate()
            .map(|(index, &number)| {
                let text = pdf.extract_text(&[number]).unwrap_or_else(|e| {
                    warn!(document = %document.name, page = index, error = %e, "page text extraction failed");
                    String::new()
                });
                Page::new(&document.name, index, text)
            })
            .collect();

        debug!(document = %document.name, page_count = pages.len(), "loaded PDF");
        Ok(pages)
    }
}

/// Loads UTF-8 text, splitting pages at form-feed characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl TextLoader {
    /// Create a new text loader.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, document: &SourceDocument) -> Result<Vec<Page>> {
        let text = std::str::from_utf8(&document.bytes)
            .map_err(|e| RagError::load(&document.name, format!("not valid UTF-8: {e}")))?;

        let pages: Vec<Page> = text
            .split('\u{0c}')
            .enumerate()
            .map(|(index, page)| Page::new(&document.name, index, page))
            .collect();

        debug!(document = %document.name, page_count = pages.len(), "loaded text");
        Ok(pages)
    }
}

/// Picks a loader from the document's file extension.
///
/// `.pdf` uses [`PdfLoader`] and `.txt` uses [`TextLoader`]. A document with
/// no extension or an unknown one is still loaded as a PDF when its bytes
/// start with the PDF signature (Drive titles usually carry no suffix);
/// otherwise it is a [`RagError::LoadError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionLoader {
    pdf: PdfLoader,
    text: TextLoader,
}

impl ExtensionLoader {
    /// Create a new dispatching loader.
    pub fn new() -> Self {
        Self::default()
    }
}

const PDF_SIGNATURE: &[u8] = b"%PDF-";

impl DocumentLoader for ExtensionLoader {
    fn load(&self, document: &SourceDocument) -> Result<Vec<Page>> {
        let extension = document.extension();
        match extension.as_deref() {
            Some("pdf") => return self.pdf.load(document),
            Some("txt") => return self.text.load(document),
            _ => {}
        }
        if document.bytes.starts_with(PDF_SIGNATURE) {
            debug!(document = %document.name, ?extension, "no known extension; content is a PDF");
            return self.pdf.load(document);
        }
        match extension {
            Some(other) => {
                Err(RagError::load(&document.name, format!("unsupported file type '.{other}'")))
            }
            None => Err(RagError::load(&document.name, "file has no extension")),
        }
    }
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    use super::*;
    use crate::document::Origin;

    fn doc(name: &str, bytes: &[u8]) -> SourceDocument {
        SourceDocument::new(name, Origin::Memory, bytes.to_vec())
    }

    /// Build a minimal PDF with one text line per page.
    fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = pdf.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                pdf.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = pdf.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_texts.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        pdf.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        pdf.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pdf_pages_are_ordered_and_indexed() {
        let bytes = build_pdf(&["First page", "Second page", "Third page"]);
        let pages = PdfLoader::new().load(&doc("report.pdf", &bytes)).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(pages.iter().all(|p| p.document == "report.pdf"));
    }

    #[test]
    fn garbage_bytes_are_a_load_error() {
        let err = PdfLoader::new().load(&doc("broken.pdf", b"definitely not a pdf")).unwrap_err();
        assert!(matches!(err, RagError::LoadError { ref document, .. } if document == "broken.pdf"));
    }

    #[test]
    fn text_loader_splits_on_form_feed() {
        let pages = TextLoader::new().load(&doc("notes.txt", b"one\x0ctwo\x0cthree")).unwrap();
        let texts: Vec<&str> = pages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(pages[2].index, 2);
    }

    #[test]
    fn text_loader_rejects_invalid_utf8() {
        assert!(TextLoader::new().load(&doc("bad.txt", &[0xff, 0xfe, 0x00])).is_err());
    }

    #[test]
    fn extension_loader_dispatches() {
        let loader = ExtensionLoader::new();
        assert_eq!(loader.load(&doc("a.TXT", b"hello")).unwrap().len(), 1);
        assert!(loader.load(&doc("a.docx", b"hello")).is_err());
        assert!(loader.load(&doc("README", b"hello")).is_err());
    }

    #[test]
    fn pdf_content_is_detected_without_a_pdf_suffix() {
        let loader = ExtensionLoader::new();
        let bytes = build_pdf(&["Quarterly numbers"]);

        let pages = loader.load(&doc("Quarterly report", &bytes)).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].document, "Quarterly report");

        assert_eq!(loader.load(&doc("scan.bin", &bytes)).unwrap().len(), 1);
    }

    #[test]
    fn signature_alone_does_not_make_a_readable_pdf() {
        let err = ExtensionLoader::new().load(&doc("Untitled", b"%PDF-1.7 truncated")).unwrap_err();
        assert!(err.to_string().contains("not a readable PDF"));
    }
}
