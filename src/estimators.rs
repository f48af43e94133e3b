//! # Page Count Estimators
//!
//! This module provides the page-count heuristics used to bill print orders.
//! Each estimator looks at the raw bytes of one file and returns a page count
//! along with the rule that produced it and processing notes.
//!
//! ## Supported Formats
//!
//! - **PDF** (`.pdf`) - `/Count` fields and `/Type /Page` markers in the raw text
//! - **Word** (`.docx`) - page-break and section markers, else file size
//! - **Images** (`.jpg`, `.jpeg`, `.png`) - always one page
//! - Anything else counts as one page
//!
//! ## Estimation Strategy
//!
//! These are textual heuristics, not format parsers. They scan the file once
//! and never fail: every problem degrades to a single page. Prices are billed
//! on these counts, so the fallback order below is part of the contract.
//! Accurate counting belongs behind the [`PageCounter`] trait (see
//! [`crate::ooxml`]).

use crate::file_utils::classify;
use crate::ooxml::OoxmlMetadataCounter;
use crate::schema::{
    DocumentInput, DocumentKind, EstimateMethod, EstimateOptions, EstimateStrategy, FileEstimate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// ASCII digits only: lossy decoding can leave other Unicode digits after `/Count`
static PDF_PAGES_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Pages\s+[0-9]+\s+[0-9]+\s+R\s*<<[^>]*/Count\s+([0-9]+)").unwrap());
static PDF_ANY_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Count\s+([0-9]+)").unwrap());
// a marker is followed by the next name's `/` or the end of the text; the `/` is consumed
static PDF_PAGE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"/Type\s*/Page\s*(?:/|$)").unwrap());

static DOCX_PAGE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<w:br[^>]*w:type="page"[^>]*>"#).unwrap());
static DOCX_SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:sectPr[^>]*>").unwrap());

/// A page count together with how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCount {
    pub pages: u32,
    pub method: EstimateMethod,
    pub notes: Vec<String>,
}

impl PageCount {
    fn new(pages: u32, method: EstimateMethod, note: String) -> Self {
        Self {
            pages,
            method,
            notes: vec![note],
        }
    }

    fn single(method: EstimateMethod, note: &str) -> Self {
        Self::new(1, method, note.to_string())
    }
}

/// Produces a page estimate for one document.
///
/// Implementations must be pure: the same input always yields the same
/// estimate, and the page count is never below 1.
pub trait PageCounter {
    fn count(&self, doc: &DocumentInput<'_>) -> PageCount;

    fn estimate(&self, doc: &DocumentInput<'_>) -> FileEstimate {
        let kind = classify(doc.name, doc.mime);
        let counted = self.count(doc);
        debug!(
            file = doc.name,
            kind = ?kind,
            method = ?counted.method,
            pages = counted.pages,
            "estimated page count"
        );
        FileEstimate {
            name: doc.name.to_string(),
            kind,
            byte_length: doc.byte_length(),
            page_count: counted.pages.max(1),
            method: counted.method,
            notes: counted.notes,
        }
    }
}

/// The textual heuristics described in this module.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicCounter {
    docx_kb_per_page: u32,
}

impl HeuristicCounter {
    pub fn new(options: &EstimateOptions) -> Self {
        Self {
            docx_kb_per_page: options.docx_kb_per_page(),
        }
    }
}

impl Default for HeuristicCounter {
    fn default() -> Self {
        Self::new(&EstimateOptions::default())
    }
}

impl PageCounter for HeuristicCounter {
    fn count(&self, doc: &DocumentInput<'_>) -> PageCount {
        match classify(doc.name, doc.mime) {
            DocumentKind::Pdf => estimate_pdf_pages(doc.bytes),
            DocumentKind::Docx => estimate_docx_pages(doc.bytes, self.docx_kb_per_page),
            DocumentKind::Image => estimate_image_pages(),
            DocumentKind::Unsupported => {
                PageCount::single(EstimateMethod::FixedSingle, "Unsupported file type; counted as 1 page")
            }
        }
    }
}

/// Builds the counter selected by `options.strategy`.
pub fn counter_for(options: &EstimateOptions) -> Box<dyn PageCounter> {
    match options.strategy() {
        EstimateStrategy::Heuristic => Box::new(HeuristicCounter::new(options)),
        EstimateStrategy::Metadata => Box::new(OoxmlMetadataCounter::new(HeuristicCounter::new(options))),
    }
}

/// Estimates one document with the counter selected by `options`.
pub fn estimate_document(doc: &DocumentInput<'_>, options: &EstimateOptions) -> FileEstimate {
    counter_for(options).estimate(doc)
}

/// Estimates the number of pages in a PDF from its raw text.
///
/// The bytes are decoded lossily, the way a browser `TextDecoder` does, and
/// three rules are tried in order:
///
/// 1. `/Count N` inside the dictionary that directly follows a
///    `/Pages <obj> <gen> R` reference
/// 2. the first `/Count N` anywhere in the file
/// 3. the number of `/Type /Page` markers directly followed by another name
///    or the end of the file (never `/Pages`, never `/Type /Page >>`)
///
/// # Returns
///
/// The first rule that matches wins. A count that does not fit in `u32`
/// gives 1 page, a count of zero is raised to 1, and no markers at all
/// gives 1 page.
pub fn estimate_pdf_pages(bytes: &[u8]) -> PageCount {
    let text = String::from_utf8_lossy(bytes);

    if let Some(caps) = PDF_PAGES_COUNT.captures(&text) {
        return count_field(&caps[1], EstimateMethod::PagesCount, "Pages object /Count");
    }
    if let Some(caps) = PDF_ANY_COUNT.captures(&text) {
        return count_field(&caps[1], EstimateMethod::AnyCount, "bare /Count");
    }

    let markers = PDF_PAGE_MARKER.find_iter(&text).count();
    if markers == 0 {
        return PageCount::single(EstimateMethod::Fallback, "No page structure found in PDF; assuming 1 page");
    }
    PageCount::new(
        saturating_u32(markers),
        EstimateMethod::PageMarkers,
        format!("Counted {} /Type /Page markers", markers),
    )
}

fn count_field(digits: &str, method: EstimateMethod, source: &str) -> PageCount {
    match digits.parse::<u32>() {
        Ok(0) => PageCount::new(1, method, format!("{} is 0; raised to 1 page", source)),
        Ok(n) => PageCount::new(n, method, format!("{}: {}", source, n)),
        Err(_) => PageCount::single(
            EstimateMethod::Fallback,
            "PDF page count field out of range; assuming 1 page",
        ),
    }
}

/// Estimates the number of pages in a DOCX file.
///
/// The container bytes are searched as text without unzipping. Explicit
/// page-break runs (`<w:br w:type="page"/>`) and section properties
/// (`<w:sectPr>`) each add a page on top of the first one. Word compresses
/// the document part, so on most real files neither marker is visible and
/// the size rule applies instead: one page per `kb_per_page` kilobytes,
/// rounded up, at least one page.
///
/// # Arguments
///
/// * `bytes` - The raw bytes of the DOCX container
/// * `kb_per_page` - Kilobytes per page for the size rule (normally 50)
pub fn estimate_docx_pages(bytes: &[u8], kb_per_page: u32) -> PageCount {
    let text = String::from_utf8_lossy(bytes);
    let breaks = DOCX_PAGE_BREAK.find_iter(&text).count();
    let sections = DOCX_SECTION.find_iter(&text).count();

    if breaks > 0 || sections > 0 {
        let pages = saturating_u32(breaks.saturating_add(sections).saturating_add(1));
        return PageCount::new(
            pages,
            EstimateMethod::BreakMarkers,
            format!("page breaks: {}, sections: {}", breaks, sections),
        );
    }

    let bytes_per_page = 1024usize * kb_per_page.max(1) as usize;
    let pages = saturating_u32(bytes.len().div_ceil(bytes_per_page)).max(1);
    PageCount::new(
        pages,
        EstimateMethod::FileSize,
        format!(
            "No page breaks found; estimated from size {:.2}KB at {}KB per page",
            crate::file_utils::kilobytes(bytes.len()),
            kb_per_page
        ),
    )
}

/// Images always print on exactly one page.
pub fn estimate_image_pages() -> PageCount {
    PageCount::single(EstimateMethod::FixedSingle, "Image file; 1 page")
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(body: &str) -> Vec<u8> {
        format!("%PDF-1.4\n{}\n%%EOF", body).into_bytes()
    }

    #[test]
    fn pdf_uses_pages_object_count() {
        let bytes = pdf("1 0 obj << /Type /Catalog /Pages 3 0 R << /Type /Pages /Count 7 >> >> endobj");
        let est = estimate_pdf_pages(&bytes);
        assert_eq!(est.pages, 7);
        assert_eq!(est.method, EstimateMethod::PagesCount);
    }

    #[test]
    fn pdf_pages_count_beats_earlier_bare_count() {
        let bytes = pdf("/Outlines << /Count 2 >> /Pages 3 0 R << /Type /Pages /Count 9 >>");
        assert_eq!(estimate_pdf_pages(&bytes).pages, 9);
    }

    #[test]
    fn pdf_falls_back_to_bare_count() {
        let bytes = pdf("2 0 obj << /Type /Pages /Kids [3 0 R] /Count 4 >> endobj");
        let est = estimate_pdf_pages(&bytes);
        assert_eq!(est.pages, 4);
        assert_eq!(est.method, EstimateMethod::AnyCount);
    }

    #[test]
    fn pdf_count_after_closing_bracket_is_not_pages_count() {
        // the `>` ends the dictionary, so only the bare rule sees this /Count
        let bytes = pdf("/Pages 2 0 R << /Kids [] >> /Count 5");
        let est = estimate_pdf_pages(&bytes);
        assert_eq!(est.pages, 5);
        assert_eq!(est.method, EstimateMethod::AnyCount);
    }

    #[test]
    fn pdf_counts_page_markers() {
        let bytes = pdf(
            "<< /Type /Pages /Kids [] >>\n\
             3 0 obj << /Type /Page /Parent 2 0 R >> endobj\n\
             4 0 obj <</Type/Page/Parent 2 0 R>> endobj\n\
             5 0 obj << /Type /Page >> endobj",
        );
        let est = estimate_pdf_pages(&bytes);
        assert_eq!(est.pages, 2);
        assert_eq!(est.method, EstimateMethod::PageMarkers);
    }

    #[test]
    fn pdf_page_marker_needs_following_name_or_end() {
        let closed = b"<< /Parent 2 0 R /Type /Page >>".repeat(3);
        let est = estimate_pdf_pages(&closed);
        assert_eq!(est.pages, 1);
        assert_eq!(est.method, EstimateMethod::Fallback);

        // each match swallows the `/` the next marker would start with
        assert_eq!(estimate_pdf_pages(b"/Type /Page /Type /Page /Type /Page").pages, 2);
        assert_eq!(estimate_pdf_pages(b"/Type /Page /Type /Page").pages, 1);
        assert_eq!(estimate_pdf_pages(b"<< /Type /Page\n").pages, 1);
        assert_eq!(estimate_pdf_pages(b"<< /Type /Page /Contents 4 0 R >>").pages, 1);
    }

    #[test]
    fn pdf_count_needs_ascii_digits() {
        let est = estimate_pdf_pages("/Count \u{0663} /Count 5".as_bytes());
        assert_eq!(est.pages, 5);
        assert_eq!(est.method, EstimateMethod::AnyCount);

        let est = estimate_pdf_pages("/Pages \u{0661} 0 R << /Count 4 >>".as_bytes());
        assert_eq!(est.method, EstimateMethod::AnyCount);
        assert_eq!(est.pages, 4);
    }

    #[test]
    fn pdf_without_structure_is_one_page() {
        let est = estimate_pdf_pages(&pdf("<< /Type /Pages >>"));
        assert_eq!(est.pages, 1);
        assert_eq!(est.method, EstimateMethod::Fallback);
        assert_eq!(estimate_pdf_pages(b"").pages, 1);
    }

    #[test]
    fn pdf_zero_and_overflowing_counts_become_one() {
        assert_eq!(estimate_pdf_pages(&pdf("/Count 0")).pages, 1);
        let huge = estimate_pdf_pages(&pdf("/Count 99999999999999999999"));
        assert_eq!(huge.pages, 1);
        assert_eq!(huge.method, EstimateMethod::Fallback);
    }

    #[test]
    fn pdf_tolerates_binary_noise() {
        let mut bytes = vec![0xff, 0xfe, 0x00, 0xc3];
        bytes.extend_from_slice(b"/Pages 1 0 R << /Count 12 >>");
        bytes.extend_from_slice(&[0x80, 0x81]);
        assert_eq!(estimate_pdf_pages(&bytes).pages, 12);
    }

    #[test]
    fn docx_counts_breaks_and_sections() {
        let xml = r#"<w:body><w:p><w:r><w:br w:type="page"/></w:r></w:p>
            <w:p><w:r><w:br w:type="page"/></w:r></w:p>
            <w:p><w:r><w:br/></w:r></w:p>
            <w:sectPr w:rsidR="00AB"></w:sectPr></w:body>"#;
        let est = estimate_docx_pages(xml.as_bytes(), 50);
        assert_eq!(est.pages, 4);
        assert_eq!(est.method, EstimateMethod::BreakMarkers);
    }

    #[test]
    fn docx_without_markers_uses_file_size() {
        let bytes = vec![0u8; 130 * 1024];
        let est = estimate_docx_pages(&bytes, 50);
        assert_eq!(est.pages, 3);
        assert_eq!(est.method, EstimateMethod::FileSize);

        assert_eq!(estimate_docx_pages(&vec![0u8; 50 * 1024], 50).pages, 1);
        assert_eq!(estimate_docx_pages(&vec![0u8; 50 * 1024 + 1], 50).pages, 2);
        assert_eq!(estimate_docx_pages(b"", 50).pages, 1);
    }

    #[test]
    fn docx_size_rule_honours_configured_density() {
        let bytes = vec![0u8; 100 * 1024];
        assert_eq!(estimate_docx_pages(&bytes, 25).pages, 4);
    }

    #[test]
    fn images_and_unsupported_files_are_one_page() {
        let counter = HeuristicCounter::default();
        let big = vec![7u8; 5 * 1024 * 1024];
        for (name, mime) in [("a.jpg", None), ("b.png", None), ("c", Some("image/jpeg"))] {
            let est = counter.estimate(&DocumentInput::new(name, mime, &big));
            assert_eq!(est.page_count, 1);
            assert_eq!(est.kind, DocumentKind::Image);
        }
        let est = counter.estimate(&DocumentInput::new("notes.txt", Some("text/plain"), b"/Count 40"));
        assert_eq!(est.page_count, 1);
        assert_eq!(est.kind, DocumentKind::Unsupported);
    }

    #[test]
    fn estimate_dispatches_on_kind() {
        let counter = HeuristicCounter::default();
        let bytes = pdf("/Pages 3 0 R << /Type /Pages /Count 7 >>");
        let est = counter.estimate(&DocumentInput::new("upload", Some("application/pdf"), &bytes));
        assert_eq!(est.kind, DocumentKind::Pdf);
        assert_eq!(est.page_count, 7);
        assert_eq!(est.byte_length, bytes.len());
        assert_eq!(est.name, "upload");
    }

    #[test]
    fn estimation_is_repeatable() {
        let bytes = pdf("/Type /Page /Parent 2 0 R /Type /Page /Parent 2 0 R");
        let doc = DocumentInput::new("x.pdf", None, &bytes);
        let options = EstimateOptions::default();
        assert_eq!(estimate_document(&doc, &options), estimate_document(&doc, &options));
    }
}
