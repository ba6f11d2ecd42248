//! PDF Workbench Library
//!
//! A small web service for working with PDFs under a shared daily quota.
//! This library provides functionality to:
//! - Merge multiple PDF files
//! - Password-protect a PDF
//! - Extract metadata (page counts, etc.)
//! - Track per-day usage and decide whether another action is allowed
//! - Serve all of the above over HTTP
//!
//! # Example
//!
//! ```no_run
//! use pdf_workbench::pdf::{MergeOptions, merge_pdfs};
//! use std::path::PathBuf;
//!
//! let options = MergeOptions {
//!     input_paths: vec![
//!         PathBuf::from("intro.pdf"),
//!         PathBuf::from("advanced.pdf"),
//!     ],
//!     output_path: PathBuf::from("merged.pdf"),
//! };
//!
//! merge_pdfs(&options).expect("Failed to merge PDFs");
//! ```

pub mod config;
pub mod date;
pub mod error;
pub mod pdf;
pub mod usage;
pub mod web;

// Re-export commonly used items
pub use config::Config;
pub use error::{Error, Result};
