//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use lopdf::{Document, Object, ObjectId, Dictionary};
use crate::error::{Error, Result};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Merge multiple PDF files into a single PDF
///
/// Pages appear in the output in input order, each input's pages in their
/// original order.
///
/// # Example
///
/// ```no_run
/// use pdf_workbench::pdf::{MergeOptions, merge_pdfs};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("first.pdf"),
///         PathBuf::from("second.pdf"),
///     ],
///     output_path: PathBuf::from("merged.pdf"),
/// };
///
/// let pages = merge_pdfs(&options).expect("Failed to merge");
/// println!("{} pages", pages);
/// ```
pub fn merge_pdfs(options: &MergeOptions) -> Result<usize> {
    if options.input_paths.is_empty() {
        return Err(Error::NoInputFiles);
    }

    let documents = options
        .input_paths
        .iter()
        .map(|path| load_document(path))
        .collect::<Result<Vec<_>>>()?;

    let mut merged_doc = assemble_documents(documents)?;
    let page_count = merged_doc.get_pages().len();

    merged_doc.compress();
    merged_doc.save(&options.output_path)?;

    Ok(page_count)
}

/// Load a document from disk, rejecting files with no pages
///
/// Files encrypted with an empty user password are decrypted on load. Any
/// other encrypted file comes back without its objects and is reported as
/// locked.
pub(crate) fn load_document(path: &Path) -> Result<Document> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;

    if doc.get_pages().is_empty() {
        if doc.is_encrypted() {
            return Err(Error::Locked(path.to_path_buf()));
        }
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }

    Ok(doc)
}

/// Build one fresh document whose page tree holds every page of `documents`
///
/// Objects of each input are renumbered into a shared id space, then a new
/// catalog and a flat `Pages` node are created above them.
pub(crate) fn assemble_documents(documents: Vec<Document>) -> Result<Document> {
    if documents.is_empty() {
        return Err(Error::NoInputFiles);
    }

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages() is keyed by page number, so this keeps document order
        let pages = doc.get_pages();
        for &page_id in pages.values() {
            flatten_inherited_attributes(&mut doc, page_id);
        }
        page_ids.extend(pages.into_values());

        objects.extend(doc.objects);
    }

    let mut assembled = Document::with_version("1.5");
    assembled.objects.extend(objects);

    // new_object_id() must hand out ids above everything copied in
    assembled.max_id = max_id - 1;

    let pages_id = assembled.new_object_id();
    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = assembled.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    assembled.objects.insert(catalog_id, Object::Dictionary(catalog));
    assembled.objects.insert(pages_id, Object::Dictionary(pages_object));
    assembled.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = assembled.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    // Old intermediate Pages nodes and catalogs are now unreachable
    assembled.prune_objects();

    Ok(assembled)
}

/// Copy inheritable attributes from a page's ancestors onto the page itself
///
/// Once the page is re-parented under the new flat `Pages` node the old
/// ancestors no longer apply, so anything the page relied on must live on
/// the page.
fn flatten_inherited_attributes(doc: &mut Document, page_id: ObjectId) {
    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();

    if let Ok(Object::Dictionary(page)) = doc.get_object(page_id) {
        let mut missing: Vec<&[u8]> = INHERITABLE_KEYS
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();

        let mut parent = parent_of(page);
        // Guard against malformed trees that loop back on themselves
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth > 64 {
                break;
            }
            depth += 1;

            let Ok(Object::Dictionary(node)) = doc.get_object(parent_id) else {
                break;
            };

            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((key.to_vec(), value.clone()));
                    false
                }
                Err(_) => true,
            });

            parent = parent_of(node);
        }
    }

    if inherited.is_empty() {
        return;
    }

    if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    match dict.get(b"Parent") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    }
}
