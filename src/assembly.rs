//! # Assembly Module
//!
//! This module provides the WASM-exported functions called by the order form.
//! It is the bridge between JavaScript and the Rust estimation and pricing
//! logic.
//!
//! ## Overview
//!
//! Every export takes plain values or JSON strings and returns a `JsValue`
//! holding a JSON string. Failures never throw; they come back as
//! `{"error": "..."}` objects. Each export has a `*_json` twin returning the
//! same string so the behavior can be exercised outside a browser.
//!
//! - `estimate_document` / `estimate_document_base64`: one file's page estimate
//! - `quote_order`: estimates for a batch of files plus the priced quote
//! - `price_quote`: price for a known page total
//! - `checkout_summary`: delivery charge and payable amount
//! - `order_draft`: the order record handed to the order store
//! - `init_console_logging`: route `tracing` output to the browser console

use crate::estimators::estimate_document as estimate_input;
use crate::file_utils::decode_payload;
use crate::logging;
use crate::pricing::{PriceQuote, PricingTable, PrintConfiguration, calculate_price};
use crate::quote::{
    CheckoutRequest, CheckoutSummary, FilePayload, IntakeFile, QuoteResult, build_order_draft,
    checkout_summary as summarize, quote_order as quote_inputs,
};
use crate::schema::{DocumentInput, EstimateOptions, QuoteError};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::wasm_bindgen;

fn parse_options(options_json: Option<&str>) -> EstimateOptions {
    match options_json.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => serde_json::from_str(s).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring invalid estimate options");
            EstimateOptions::default()
        }),
        None => EstimateOptions::default(),
    }
}

fn parse_files(files_json: &str) -> Result<Vec<IntakeFile>, QuoteError> {
    let payloads: Vec<FilePayload> = serde_json::from_str(files_json)
        .map_err(|e| QuoteError::InvalidInput(format!("files: {}", e)))?;
    payloads.iter().map(IntakeFile::from_payload).collect()
}

fn respond<T: Serialize>(result: Result<T, QuoteError>) -> String {
    match result.and_then(|value| serde_json::to_string(&value).map_err(QuoteError::from)) {
        Ok(body) => body,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn estimate_document_json(
    bytes: &[u8],
    filename: Option<&str>,
    mime: Option<&str>,
    options_json: Option<&str>,
) -> String {
    let options = parse_options(options_json);
    let doc = DocumentInput::new(filename.unwrap_or_default(), mime, bytes);
    respond(Ok(estimate_input(&doc, &options)))
}

pub fn estimate_document_base64_json(
    payload: &str,
    filename: Option<&str>,
    mime: Option<&str>,
    options_json: Option<&str>,
) -> String {
    match decode_payload(payload) {
        Ok(decoded) => {
            let mime = mime.filter(|m| !m.trim().is_empty()).or(decoded.mime.as_deref());
            estimate_document_json(&decoded.bytes, filename, mime, options_json)
        }
        Err(err) => respond::<()>(Err(err)),
    }
}

fn quote_files(
    files_json: &str,
    config_json: &str,
    options_json: Option<&str>,
    rates_json: Option<&str>,
) -> Result<(Vec<IntakeFile>, PrintConfiguration, QuoteResult), QuoteError> {
    let files = parse_files(files_json)?;
    let config = PrintConfiguration::from_json(config_json)?;
    let table = PricingTable::from_json(rates_json)?;
    let inputs: Vec<DocumentInput<'_>> = files.iter().map(IntakeFile::as_input).collect();
    let quoted = quote_inputs(&inputs, &config, &parse_options(options_json), &table)?;
    Ok((files, config, quoted))
}

fn price_for_pages(total_pages: u32, config_json: &str, rates_json: Option<&str>) -> Result<PriceQuote, QuoteError> {
    let config = PrintConfiguration::from_json(config_json)?;
    let table = PricingTable::from_json(rates_json)?;
    calculate_price(u64::from(total_pages), &config, &table)
}

fn summarize_checkout(request_json: &str, rates_json: Option<&str>) -> Result<CheckoutSummary, QuoteError> {
    let request: CheckoutRequest = serde_json::from_str(request_json)
        .map_err(|e| QuoteError::InvalidInput(format!("checkout request: {}", e)))?;
    let table = PricingTable::from_json(rates_json)?;
    summarize(&request, &table)
}

pub fn quote_order_json(
    files_json: &str,
    config_json: &str,
    options_json: Option<&str>,
    rates_json: Option<&str>,
) -> String {
    respond(quote_files(files_json, config_json, options_json, rates_json).map(|(_, _, quoted)| quoted))
}

pub fn price_quote_json(total_pages: u32, config_json: &str, rates_json: Option<&str>) -> String {
    respond(price_for_pages(total_pages, config_json, rates_json))
}

pub fn checkout_summary_json(request_json: &str, rates_json: Option<&str>) -> String {
    respond(summarize_checkout(request_json, rates_json))
}

pub fn order_draft_json(
    user_id: &str,
    user_email: &str,
    files_json: &str,
    config_json: &str,
    options_json: Option<&str>,
    rates_json: Option<&str>,
) -> String {
    respond(
        quote_files(files_json, config_json, options_json, rates_json).and_then(|(files, config, quoted)| {
            build_order_draft(user_id, user_email, &files, &config, &quoted.quote)
        }),
    )
}

/// Estimates the page count of one file from raw bytes.
///
/// # Parameters
///
/// * `bytes` - The complete binary content of the file.
/// * `filename` - Original filename; its extension drives classification.
/// * `mime` - Declared MIME type from the file input, if any.
/// * `options_json` - Optional `EstimateOptions` JSON. Invalid JSON falls back
///   to the defaults.
///
/// # Returns
///
/// A JSON string with `name`, `kind`, `byte_length`, `page_count`, `method`
/// and `notes`. This never returns an error: unreadable files count as 1 page.
///
/// # Example
///
/// ```javascript
/// const est = JSON.parse(estimate_document(new Uint8Array(buf), file.name, file.type, null));
/// console.log(`${file.name}: ${est.page_count} pages`);
/// ```
#[wasm_bindgen]
pub fn estimate_document(
    bytes: &[u8],
    filename: Option<String>,
    mime: Option<String>,
    options_json: Option<String>,
) -> JsValue {
    JsValue::from_str(&estimate_document_json(
        bytes,
        filename.as_deref(),
        mime.as_deref(),
        options_json.as_deref(),
    ))
}

/// Same as `estimate_document` for base64 text or a `data:` URL, as produced
/// by `FileReader.readAsDataURL`. A `data:` URL's MIME type is used when
/// `mime` is not given.
#[wasm_bindgen]
pub fn estimate_document_base64(
    payload: &str,
    filename: Option<String>,
    mime: Option<String>,
    options_json: Option<String>,
) -> JsValue {
    JsValue::from_str(&estimate_document_base64_json(
        payload,
        filename.as_deref(),
        mime.as_deref(),
        options_json.as_deref(),
    ))
}

/// Estimates a batch of files and prices the order.
///
/// `files_json` is an array of `{ "name", "mime"?, "data" }` where `data` is
/// base64 or a `data:` URL. `config_json` is a print configuration:
///
/// ```json
/// { "paperSize": "A4", "paperType": "glossy", "color": "blackAndWhite",
///   "binding": "spiral", "copies": 2 }
/// ```
///
/// Returns `{ "files": [...], "quote": { "totalPages", "totalAmount", "breakdown" } }`
/// or an error object for an empty batch, zero copies or unknown option values.
#[wasm_bindgen]
pub fn quote_order(
    files_json: &str,
    config_json: &str,
    options_json: Option<String>,
    rates_json: Option<String>,
) -> JsValue {
    JsValue::from_str(&quote_order_json(
        files_json,
        config_json,
        options_json.as_deref(),
        rates_json.as_deref(),
    ))
}

/// Prices a page total that already includes copies.
#[wasm_bindgen]
pub fn price_quote(total_pages: u32, config_json: &str, rates_json: Option<String>) -> JsValue {
    JsValue::from_str(&price_quote_json(total_pages, config_json, rates_json.as_deref()))
}

/// Adds the delivery charge to a quote amount and converts it to paise.
#[wasm_bindgen]
pub fn checkout_summary(request_json: &str, rates_json: Option<String>) -> JsValue {
    JsValue::from_str(&checkout_summary_json(request_json, rates_json.as_deref()))
}

#[wasm_bindgen]
pub fn order_draft(
    user_id: &str,
    user_email: &str,
    files_json: &str,
    config_json: &str,
    options_json: Option<String>,
    rates_json: Option<String>,
) -> JsValue {
    JsValue::from_str(&order_draft_json(
        user_id,
        user_email,
        files_json,
        config_json,
        options_json.as_deref(),
        rates_json.as_deref(),
    ))
}

/// Routes `tracing` events to the browser console.
#[wasm_bindgen]
pub fn init_console_logging(level: Option<String>) -> JsValue {
    let body = match logging::init_console_logging(level.as_deref()) {
        Ok(()) => json!({ "ok": true }).to_string(),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    };
    JsValue::from_str(&body)
}
