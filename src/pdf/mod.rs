//! PDF manipulation module
//!
//! Everything that touches PDF structure goes through here; callers hand in
//! paths and get page counts back.

pub mod merge;
pub mod metadata;
pub mod protect;

// Re-export commonly used items
pub use merge::{merge_pdfs, MergeOptions};
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
pub use protect::{protect_pdf, ProtectOptions};
