//! PDF metadata extraction

use std::path::Path;
use lopdf::{Document, Object};
use crate::error::{Error, Result};
use crate::pdf::merge::load_document;

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages, `None` when the page tree is locked behind a password
    pub page_count: Option<usize>,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Whether the trailer carries an Encrypt dictionary
    pub encrypted: bool,
}

/// Extract metadata from a PDF file
///
/// A `password` is checked against the document's security handler and
/// rejected with [`Error::IncorrectPassword`] if it does not open the file.
/// lopdf only reads the objects of files whose user password is empty, so
/// for any other protected file the page count and Info fields stay unset
/// even when the password is right.
pub fn extract_metadata(path: &Path, password: Option<&str>) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let encrypted = doc.is_encrypted();

    if let (true, Some(password)) = (encrypted, password) {
        doc.authenticate_user_password(password)
            .map_err(|_| Error::IncorrectPassword(path.to_path_buf()))?;
    }

    if doc.get_pages().is_empty() && encrypted {
        return Ok(PdfMetadata {
            page_count: None,
            title: None,
            author: None,
            encrypted,
        });
    }

    Ok(PdfMetadata {
        page_count: Some(page_count(&doc)),
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
        encrypted,
    })
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    let doc = load_document(path)?;
    Ok(page_count(&doc))
}

/// Page count from the root `Count` entry, walking the tree when the entry
/// is missing or unusable
fn page_count(doc: &Document) -> usize {
    let declared = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .and_then(|pages_id| doc.get_dictionary(pages_id))
        .and_then(|pages| pages.get(b"Count"))
        .and_then(Object::as_i64)
        .ok()
        .and_then(|count| usize::try_from(count).ok());

    match declared {
        Some(count) => count,
        None => {
            tracing::debug!("Page tree has no usable Count, walking it");
            doc.get_pages().len()
        }
    }
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };

    let bytes = info.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Two pages hanging off a root whose `Count` is `count`
    fn two_page_doc(count: Option<i64>) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..2)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                })
                .into()
            })
            .collect();

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
        };
        if let Some(count) = count {
            pages.set("Count", count);
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_page_count_prefers_declared_count() {
        assert_eq!(page_count(&two_page_doc(Some(7))), 7);
    }

    #[test]
    fn test_page_count_walks_tree_without_count() {
        assert_eq!(page_count(&two_page_doc(None)), 2);
        assert_eq!(page_count(&two_page_doc(Some(-1))), 2);
    }

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_extract_metadata_nonexistent_file() {
        let result = extract_metadata(Path::new("nonexistent.pdf"), None);
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    // Integration tests with actual PDFs are in the tests/ directory
}
