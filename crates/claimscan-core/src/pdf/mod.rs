//! Local PDF pre-flight checks run before a document is sent for extraction.

use lopdf::Document;
use tracing::{debug, trace};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// How far into the buffer the header may start (some producers prepend junk).
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Size and page limits a document must fit within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_bytes: usize,
    pub max_pages: u32,
}

/// What the pre-flight learned about a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInfo {
    /// Size in bytes.
    pub size: usize,
    /// Page count, when the document structure could be parsed locally.
    pub page_count: Option<u32>,
    /// Whether the document is encrypted.
    pub encrypted: bool,
}

/// Check that `data` looks like a PDF the service will accept.
///
/// The header and size are hard requirements. The page limit applies when
/// lopdf can read the page tree; a body it cannot parse is passed through,
/// since the service reads it independently.
pub fn inspect(data: &[u8], limits: &Limits) -> Result<PdfInfo> {
    if data.is_empty() {
        return Err(PdfError::Empty);
    }

    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    if !window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Err(PdfError::NotPdf);
    }

    if data.len() > limits.max_bytes {
        return Err(PdfError::TooLarge {
            size: data.len(),
            limit: limits.max_bytes,
        });
    }

    let (page_count, encrypted) = match Document::load_mem(data) {
        Ok(doc) => (Some(doc.get_pages().len() as u32), doc.is_encrypted()),
        Err(e) => {
            trace!("lopdf could not parse document: {}", e);
            (None, false)
        }
    };

    if let Some(pages) = page_count.filter(|&p| p > limits.max_pages) {
        return Err(PdfError::TooManyPages {
            pages,
            limit: limits.max_pages,
        });
    }

    debug!(
        size = data.len(),
        pages = ?page_count,
        encrypted,
        "PDF pre-flight passed"
    );

    Ok(PdfInfo {
        size: data.len(),
        page_count,
        encrypted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, dictionary};
    use pretty_assertions::assert_eq;

    fn limits(max_bytes: usize) -> Limits {
        Limits {
            max_bytes,
            max_pages: 1000,
        }
    }

    fn pdf_with_pages(count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..count)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(595),
                        Object::Integer(842),
                    ],
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(inspect(b"", &limits(100)), Err(PdfError::Empty));
    }

    #[test]
    fn test_not_a_pdf() {
        assert_eq!(
            inspect(b"PK\x03\x04 zip archive", &limits(100)),
            Err(PdfError::NotPdf)
        );
    }

    #[test]
    fn test_too_large() {
        let data = b"%PDF-1.7\n0123456789";
        assert_eq!(
            inspect(data, &limits(8)),
            Err(PdfError::TooLarge {
                size: data.len(),
                limit: 8
            })
        );
    }

    #[test]
    fn test_unparsable_body_is_not_fatal() {
        let data = b"%PDF-1.4\nnot really a pdf body";
        let info = inspect(data, &limits(1024)).unwrap();

        assert_eq!(info.page_count, None);
        assert!(!info.encrypted);
        assert_eq!(info.size, data.len());
    }

    #[test]
    fn test_header_after_leading_bytes() {
        assert!(inspect(b"\xEF\xBB\xBF%PDF-1.4\n", &limits(1024)).is_ok());
    }

    #[test]
    fn test_page_count_is_read() {
        let data = pdf_with_pages(3);
        let info = inspect(&data, &limits(1024 * 1024)).unwrap();

        assert_eq!(info.page_count, Some(3));
        assert!(!info.encrypted);
    }

    #[test]
    fn test_too_many_pages() {
        let data = pdf_with_pages(3);
        let limits = Limits {
            max_bytes: 1024 * 1024,
            max_pages: 2,
        };

        assert_eq!(
            inspect(&data, &limits),
            Err(PdfError::TooManyPages { pages: 3, limit: 2 })
        );
    }
}
