//! Data structures and types for document intake.
//!
//! This module defines the shared types used across the estimator: the
//! error enum, the estimation options, the per-file input view and the
//! per-file estimate returned to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced at the boundary of the quote pipeline.
///
/// Page-count estimation itself never fails outward; these variants cover
/// rejected caller input and (de)serialization of the JSON surface.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// A value could not be parsed into the expected shape or enum.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A parsed value violated a field constraint (copies, address, ...).
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
    /// Base64 or data-URL payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// A result could not be serialized back to JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A document container could not be opened or read.
    #[error("Archive error: {0}")]
    Archive(String),
}

/// The kind a file was classified as, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Image,
    Unsupported,
}

/// Which rule produced a page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMethod {
    /// `/Count` inside the dictionary following a `/Pages` reference.
    PagesCount,
    /// First bare `/Count` anywhere in the file.
    AnyCount,
    /// Number of `/Type /Page` object markers.
    PageMarkers,
    /// DOCX page-break runs plus section properties.
    BreakMarkers,
    /// DOCX size rule (kilobytes per page).
    FileSize,
    /// `<Pages>` field of the OOXML extended properties part.
    DocumentMetadata,
    /// Images and unsupported files always count as one page.
    FixedSingle,
    /// Nothing usable was found; one page assumed.
    Fallback,
}

/// How page counts are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateStrategy {
    /// Textual heuristics over the raw bytes. This is what prices are billed on.
    #[default]
    Heuristic,
    /// Read DOCX page metadata from the container, heuristics otherwise.
    Metadata,
}

/// Default number of kilobytes assumed per DOCX page by the size rule.
pub const DEFAULT_DOCX_KB_PER_PAGE: u32 = 50;

/// Configuration options for page-count estimation.
///
/// All fields are optional. This structure is deserialized from the
/// `options_json` argument of the wasm exports.
///
/// ```json
/// { "strategy": "metadata", "docx_kb_per_page": 40 }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateOptions {
    /// Counting strategy; heuristic when not given.
    pub strategy: Option<EstimateStrategy>,
    /// Kilobytes per page for the DOCX size rule. Zero is treated as unset.
    pub docx_kb_per_page: Option<u32>,
}

impl EstimateOptions {
    pub fn strategy(&self) -> EstimateStrategy {
        self.strategy.unwrap_or_default()
    }

    pub fn docx_kb_per_page(&self) -> u32 {
        match self.docx_kb_per_page {
            Some(kb) if kb > 0 => kb,
            _ => DEFAULT_DOCX_KB_PER_PAGE,
        }
    }
}

/// One user-selected file, borrowed for the duration of estimation.
#[derive(Debug, Clone, Copy)]
pub struct DocumentInput<'a> {
    /// Original filename, used for kind inference and display.
    pub name: &'a str,
    /// Declared MIME type, if the browser supplied one.
    pub mime: Option<&'a str>,
    /// Full binary content.
    pub bytes: &'a [u8],
}

impl<'a> DocumentInput<'a> {
    pub fn new(name: &'a str, mime: Option<&'a str>, bytes: &'a [u8]) -> Self {
        Self { name, mime, bytes }
    }

    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }
}

/// The estimate assigned to one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEstimate {
    pub name: String,
    pub kind: DocumentKind,
    pub byte_length: usize,
    /// Always at least 1.
    pub page_count: u32,
    pub method: EstimateMethod,
    /// Explanations of how the count was reached.
    pub notes: Vec<String>,
}
