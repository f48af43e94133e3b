//! Metadata-based page counting for Office Open XML documents.
//!
//! Word stores the page count of the last save in the extended properties
//! part (`docProps/app.xml`, `<Pages>`). Reading it means unzipping the
//! container, which the default heuristic deliberately does not do. This
//! counter is opt-in through `EstimateStrategy::Metadata` and hands every
//! other case to the heuristic.

use crate::estimators::{HeuristicCounter, PageCount, PageCounter};
use crate::file_utils::classify;
use crate::schema::{DocumentInput, DocumentKind, EstimateMethod, QuoteError};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

const APP_PROPERTIES_PART: &str = "docProps/app.xml";

/// Reads DOCX page counts from document metadata, heuristics otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct OoxmlMetadataCounter {
    fallback: HeuristicCounter,
}

impl OoxmlMetadataCounter {
    pub fn new(fallback: HeuristicCounter) -> Self {
        Self { fallback }
    }
}

impl PageCounter for OoxmlMetadataCounter {
    fn count(&self, doc: &DocumentInput<'_>) -> PageCount {
        if classify(doc.name, doc.mime) != DocumentKind::Docx {
            return self.fallback.count(doc);
        }

        let reason = match read_app_pages(doc.bytes) {
            Ok(Some(pages)) => {
                return PageCount {
                    pages,
                    method: EstimateMethod::DocumentMetadata,
                    notes: vec![format!("{} <Pages>: {}", APP_PROPERTIES_PART, pages)],
                };
            }
            Ok(None) => format!("{} has no usable <Pages> field", APP_PROPERTIES_PART),
            Err(err) => err.to_string(),
        };

        debug!(file = doc.name, %reason, "docx metadata unavailable, using heuristic");
        let mut counted = self.fallback.count(doc);
        counted.notes.insert(0, reason);
        counted
    }
}

/// Opens a DOCX container and returns the positive `<Pages>` value of its
/// extended properties, or `None` when the part or field is missing.
pub fn read_app_pages(bytes: &[u8]) -> Result<Option<u32>, QuoteError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| QuoteError::Archive(e.to_string()))?;
    let mut part = match archive.by_name(APP_PROPERTIES_PART) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(QuoteError::Archive(e.to_string())),
    };

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| QuoteError::Archive(format!("{}: {}", APP_PROPERTIES_PART, e)))?;
    parse_pages_field(&xml)
}

fn parse_pages_field(xml: &str) -> Result<Option<u32>, QuoteError> {
    let mut reader = Reader::from_str(xml);
    let mut in_pages = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => in_pages = e.local_name().as_ref() == b"Pages",
            Ok(Event::Text(t)) if in_pages => {
                let text = t
                    .unescape()
                    .map_err(|e| QuoteError::Archive(format!("{}: {}", APP_PROPERTIES_PART, e)))?;
                return Ok(text.trim().parse::<u32>().ok().filter(|n| *n > 0));
            }
            Ok(Event::End(_)) => in_pages = false,
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(QuoteError::Archive(format!("{}: {}", APP_PROPERTIES_PART, e))),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const DOCUMENT_XML: &str = r#"<w:document><w:body>
        <w:p><w:r><w:br w:type="page"/></w:r></w:p>
        <w:sectPr/></w:body></w:document>"#;

    fn docx_with(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, body) in parts {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn app_xml(pages: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>Microsoft Office Word</Application><Pages>{}</Pages><Words>2100</Words>
</Properties>"#,
            pages
        )
    }

    #[test]
    fn reads_pages_from_app_properties() {
        let app = app_xml("12");
        let bytes = docx_with(&[("word/document.xml", DOCUMENT_XML), (APP_PROPERTIES_PART, app.as_str())]);
        assert_eq!(read_app_pages(&bytes).unwrap(), Some(12));

        let counter = OoxmlMetadataCounter::default();
        let est = counter.estimate(&DocumentInput::new("thesis.docx", None, &bytes));
        assert_eq!(est.page_count, 12);
        assert_eq!(est.method, EstimateMethod::DocumentMetadata);
    }

    #[test]
    fn heuristic_cannot_see_compressed_markers() {
        let app = app_xml("12");
        let bytes = docx_with(&[("word/document.xml", DOCUMENT_XML), (APP_PROPERTIES_PART, app.as_str())]);
        let est = HeuristicCounter::default().estimate(&DocumentInput::new("thesis.docx", None, &bytes));
        assert_eq!(est.method, EstimateMethod::FileSize);
        assert_eq!(est.page_count, 1);
    }

    #[test]
    fn missing_or_bad_field_falls_back_to_heuristic() {
        let no_app = docx_with(&[("word/document.xml", DOCUMENT_XML)]);
        assert_eq!(read_app_pages(&no_app).unwrap(), None);

        let zero = app_xml("0");
        let zero_pages = docx_with(&[(APP_PROPERTIES_PART, zero.as_str())]);
        assert_eq!(read_app_pages(&zero_pages).unwrap(), None);

        let counter = OoxmlMetadataCounter::default();
        for bytes in [no_app, zero_pages] {
            let est = counter.estimate(&DocumentInput::new("a.docx", None, &bytes));
            assert_eq!(est.method, EstimateMethod::FileSize);
            assert_eq!(est.page_count, 1);
        }
    }

    #[test]
    fn broken_archive_falls_back_to_heuristic() {
        let bytes = br#"PK not really a zip <w:br w:type="page"/>"#;
        assert!(matches!(read_app_pages(bytes), Err(QuoteError::Archive(_))));

        let est = OoxmlMetadataCounter::default().estimate(&DocumentInput::new("a.docx", None, bytes));
        assert_eq!(est.method, EstimateMethod::BreakMarkers);
        assert_eq!(est.page_count, 2);
        assert!(est.notes.len() >= 2);
    }

    #[test]
    fn non_docx_files_use_heuristic() {
        let bytes = b"/Pages 3 0 R << /Count 6 >>";
        let est = OoxmlMetadataCounter::default().estimate(&DocumentInput::new("a.pdf", None, bytes));
        assert_eq!(est.page_count, 6);
        assert_eq!(est.method, EstimateMethod::PagesCount);
    }
}
