use crate::schema::{DocumentKind, QuoteError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const MIME_IMAGES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];
const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Classifies a file from its declared MIME type or filename extension.
///
/// # Detection Strategy
///
/// Kinds are checked in priority order and the first match wins:
/// 1. PDF (`application/pdf` or `.pdf`)
/// 2. DOCX (the wordprocessingml MIME type or `.docx`)
/// 3. Image (`image/jpeg`, `image/jpg`, `image/png` or `.jpg`/`.jpeg`/`.png`)
/// 4. Anything else is unsupported
///
/// Both checks are case-insensitive. File content is never sniffed: a file
/// with neither a useful name nor a MIME type is unsupported.
pub fn classify(filename: &str, mime: Option<&str>) -> DocumentKind {
    let name = filename.to_lowercase();
    let mime = mime.map(normalize_mime).unwrap_or_default();

    if mime == MIME_PDF || name.ends_with(".pdf") {
        return DocumentKind::Pdf;
    }
    if mime == MIME_DOCX || name.ends_with(".docx") {
        return DocumentKind::Docx;
    }
    if MIME_IMAGES.contains(&mime.as_str()) || IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        return DocumentKind::Image;
    }
    DocumentKind::Unsupported
}

/// Lowercases a MIME type and drops any parameters (`; charset=...`).
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_lowercase()
}

/// Best MIME type for a file, used when building data URLs.
pub fn mime_for(filename: &str, declared: Option<&str>) -> String {
    if let Some(m) = declared.map(normalize_mime).filter(|m| !m.is_empty()) {
        return m;
    }
    let lower = filename.to_lowercase();
    match classify(filename, None) {
        DocumentKind::Pdf => MIME_PDF.into(),
        DocumentKind::Docx => MIME_DOCX.into(),
        DocumentKind::Image if lower.ends_with(".png") => "image/png".into(),
        DocumentKind::Image => "image/jpeg".into(),
        DocumentKind::Unsupported => "application/octet-stream".into(),
    }
}

/// Converts a byte length to kilobytes (1 KB = 1024 bytes).
pub fn kilobytes(byte_length: usize) -> f64 {
    byte_length as f64 / 1024.0
}

/// A decoded file payload as sent by the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    /// MIME type carried by a `data:` URL header, if any.
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Decodes either plain base64 or a `data:<mime>;base64,<payload>` URL.
///
/// Browsers produce the latter from `FileReader.readAsDataURL`, so both forms
/// are accepted wherever file bytes travel as text.
pub fn decode_payload(input: &str) -> Result<DecodedPayload, QuoteError> {
    let input = input.trim();
    let (mime, encoded) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest
                .split_once(',')
                .ok_or_else(|| QuoteError::Decode("data URL has no payload separator".into()))?;
            if !header.ends_with(";base64") {
                return Err(QuoteError::Decode("only base64 data URLs are supported".into()));
            }
            let mime = normalize_mime(header.trim_end_matches(";base64"));
            (Some(mime).filter(|m| !m.is_empty()), body)
        }
        None => (None, input),
    };

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| QuoteError::Decode(format!("base64 decode failed: {:?}", e)))?;
    Ok(DecodedPayload { mime, bytes })
}

/// Encodes bytes as a base64 `data:` URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
