//! Multipart intake and per-request scratch space
//!
//! Uploads are buffered in memory (the body is already capped), then staged
//! into a directory owned by the request. Nothing on disk outlives the
//! handler that created it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::StatusCode;
use tempfile::TempDir;
use uuid::Uuid;

use crate::web::error::WebError;

/// Name used when sanitizing leaves nothing behind
const FALLBACK_FILENAME: &str = "upload.pdf";

/// One file part of a multipart form
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub field: String,
    pub file_name: String,
    pub data: Bytes,
}

impl UploadPart {
    /// Browsers send an empty, unnamed part when no file was chosen
    fn is_blank(&self) -> bool {
        self.file_name.is_empty() && self.data.is_empty()
    }
}

/// A fully read multipart form
#[derive(Debug, Default)]
pub struct UploadForm {
    files: Vec<UploadPart>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain `multipart`, keeping file parts in submission order
    pub async fn read(mut multipart: Multipart, max_mb: usize) -> Result<Self, WebError> {
        let mut form = UploadForm::default();
        let reject = |e: axum::extract::multipart::MultipartError| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                WebError::PayloadTooLarge { max_mb }
            } else {
                WebError::BadRequest(e.body_text())
            }
        };

        while let Some(field) = multipart.next_field().await.map_err(reject)? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let data = field.bytes().await.map_err(reject)?;
                    let part = UploadPart {
                        field: name,
                        file_name,
                        data,
                    };
                    if !part.is_blank() {
                        form.files.push(part);
                    }
                }
                None => {
                    let value = field.text().await.map_err(reject)?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Non-blank file parts submitted under `field`, in order
    pub fn files<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a UploadPart> + 'a {
        self.files.iter().filter(move |part| part.field == field)
    }

    /// A text field's value, if it was submitted
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// Scratch directories owned by a single request
///
/// Both directories are removed when the workspace is dropped.
pub struct RequestWorkspace {
    id: Uuid,
    staging: TempDir,
    output: TempDir,
}

impl RequestWorkspace {
    pub async fn create(upload_root: &Path, output_root: &Path) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(upload_root).await?;
        tokio::fs::create_dir_all(output_root).await?;

        let id = Uuid::new_v4();
        let prefix = format!("{}-", id);
        let staging = tempfile::Builder::new().prefix(&prefix).tempdir_in(upload_root)?;
        let output = tempfile::Builder::new().prefix(&prefix).tempdir_in(output_root)?;

        tracing::debug!("Request {} staging in {}", id, staging.path().display());

        Ok(Self { id, staging, output })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Write an upload into the staging directory and return its path
    ///
    /// `index` keeps same-named uploads within one request apart.
    pub async fn stage(&self, index: usize, part: &UploadPart) -> std::io::Result<PathBuf> {
        let path = self
            .staging
            .path()
            .join(format!("{:03}_{}", index, secure_filename(&part.file_name)));
        tokio::fs::write(&path, &part.data).await?;
        Ok(path)
    }

    /// Where an output artifact named `file_name` should be written
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output.path().join(secure_filename(file_name))
    }
}

/// Reduce a client-supplied filename to a safe single path component
///
/// Keeps ASCII letters, digits, `.`, `_` and `-`. Path separators and runs
/// of whitespace become a single `_`; leading and trailing dots and
/// underscores are stripped.
pub fn secure_filename(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c == '/' || c == '\\' || c.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
            continue;
        }
        if pending_separator && !cleaned.is_empty() {
            cleaned.push('_');
        }
        pending_separator = false;
        cleaned.push(c);
    }

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn part(file_name: &str, data: &'static [u8]) -> UploadPart {
        UploadPart {
            field: "pdfs".to_string(),
            file_name: file_name.to_string(),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("report.pdf"), "report.pdf");
        assert_eq!(secure_filename("My Cool   File.pdf"), "My_Cool_File.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\doc.pdf"), "C_Users_me_doc.pdf");
        assert_eq!(secure_filename("  .hidden.pdf"), "hidden.pdf");
        assert_eq!(secure_filename("naïve.pdf"), "nave.pdf");
    }

    #[test]
    fn test_secure_filename_fallback() {
        assert_eq!(secure_filename(""), FALLBACK_FILENAME);
        assert_eq!(secure_filename("../.."), FALLBACK_FILENAME);
        assert_eq!(secure_filename("日本語"), FALLBACK_FILENAME);
    }

    #[test]
    fn test_blank_parts() {
        assert!(part("", b"").is_blank());
        assert!(!part("a.pdf", b"").is_blank());
        assert!(!part("", b"%PDF").is_blank());
    }

    #[tokio::test]
    async fn test_workspace_is_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let uploads = root.path().join("uploads");
        let outputs = root.path().join("outputs");

        let workspace = RequestWorkspace::create(&uploads, &outputs).await.unwrap();
        let staged = workspace.stage(0, &part("a.pdf", b"%PDF-1.5")).await.unwrap();
        let output = workspace.output_path("merged.pdf");
        std::fs::write(&output, b"out").unwrap();

        assert!(staged.exists());
        assert!(staged.starts_with(&uploads));
        assert!(output.starts_with(&outputs));

        drop(workspace);

        assert!(!staged.exists());
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 0);
        assert_eq!(std::fs::read_dir(&outputs).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_collide() {
        let root = TempDir::new().unwrap();
        let workspace = RequestWorkspace::create(root.path(), root.path()).await.unwrap();

        let first = workspace.stage(0, &part("a.pdf", b"one")).await.unwrap();
        let second = workspace.stage(1, &part("a.pdf", b"two")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_workspaces_are_distinct() {
        let root = TempDir::new().unwrap();
        let a = RequestWorkspace::create(root.path(), root.path()).await.unwrap();
        let b = RequestWorkspace::create(root.path(), root.path()).await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.output_path("merged.pdf"), b.output_path("merged.pdf"));
    }
}
