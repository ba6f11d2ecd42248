//! Password protection using lopdf's standard security handler

use std::path::PathBuf;
use lopdf::{EncryptionState, EncryptionVersion, Object, Permissions, StringFormat};
use uuid::Uuid;
use crate::error::{Error, Result};
use crate::pdf::merge::{assemble_documents, load_document};

/// Key length in bits for the RC4 (V2) handler
const KEY_LENGTH: usize = 128;

/// Options for protecting a PDF
#[derive(Debug, Clone)]
pub struct ProtectOptions {
    /// PDF to protect
    pub input_path: PathBuf,
    /// Where the encrypted copy is written
    pub output_path: PathBuf,
    /// Password required to open the output
    pub password: String,
}

/// Copy every page of a PDF into a fresh document and encrypt it
///
/// The same password is used as user and owner password, and all
/// permissions are granted once the document is opened. Returns the number
/// of pages written.
pub fn protect_pdf(options: &ProtectOptions) -> Result<usize> {
    if options.password.is_empty() {
        return Err(Error::Encryption("password must not be empty".to_string()));
    }

    let source = load_document(&options.input_path)?;
    let mut doc = assemble_documents(vec![source])?;
    let page_count = doc.get_pages().len();

    // The key derivation mixes in the first element of the file ID
    let file_id = Uuid::new_v4().as_bytes().to_vec();
    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id, StringFormat::Hexadecimal),
        ]),
    );

    doc.compress();

    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: &options.password,
        user_password: &options.password,
        key_length: KEY_LENGTH,
        permissions: Permissions::all(),
    };
    let state = EncryptionState::try_from(version)
        .map_err(|e| Error::Encryption(e.to_string()))?;
    doc.encrypt(&state)
        .map_err(|e| Error::Encryption(e.to_string()))?;

    doc.save(&options.output_path)?;

    Ok(page_count)
}
