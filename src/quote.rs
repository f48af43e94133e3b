//! Batch intake: per-file estimates joined into a priced quote.
//!
//! Every file is estimated on its own; the quote only needs all of them to be
//! done before the pages are summed and multiplied by the copy count. The
//! checkout and order-draft helpers shape the payloads the UI hands to the
//! hosted payment widget and the order store.

use crate::estimators::counter_for;
use crate::file_utils::{decode_payload, encode_data_url, mime_for};
use crate::pricing::{
    DeliveryType, PriceQuote, PricingTable, PrintConfiguration, calculate_price, delivery_charge,
    final_amount, to_minor_units,
};
use crate::schema::{DocumentInput, EstimateOptions, FileEstimate, QuoteError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

/// Address recorded for orders collected at the counter.
pub const PICKUP_ADDRESS: &str = "Pick up from shop";

/// A file as it arrives over the JSON surface.
#[derive(Debug, Clone, Deserialize)]
pub struct FilePayload {
    pub name: String,
    #[serde(default)]
    pub mime: Option<String>,
    /// Plain base64 or a `data:` URL.
    pub data: String,
}

/// An owned, decoded file ready for estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl IntakeFile {
    pub fn new(name: impl Into<String>, mime: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime,
            bytes,
        }
    }

    /// Decodes a payload. A declared MIME type wins over the data-URL header.
    pub fn from_payload(payload: &FilePayload) -> Result<Self, QuoteError> {
        let decoded = decode_payload(&payload.data).map_err(|e| match e {
            QuoteError::Decode(msg) => QuoteError::Decode(format!("{}: {}", payload.name, msg)),
            other => other,
        })?;
        let mime = payload
            .mime
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or(decoded.mime);
        Ok(Self::new(payload.name.clone(), mime, decoded.bytes))
    }

    pub fn as_input(&self) -> DocumentInput<'_> {
        DocumentInput::new(&self.name, self.mime.as_deref(), &self.bytes)
    }
}

/// Per-file estimates and the resulting price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteResult {
    pub files: Vec<FileEstimate>,
    pub quote: PriceQuote,
}

/// Estimates every file and prices the order.
///
/// # Errors
///
/// Returns `QuoteError::InvalidInput` for an empty batch or a price that
/// overflows, and `QuoteError::Validation` when `copies` is below 1.
/// Estimation itself never fails.
pub fn quote_order(
    files: &[DocumentInput<'_>],
    config: &PrintConfiguration,
    options: &EstimateOptions,
    table: &PricingTable,
) -> Result<QuoteResult, QuoteError> {
    if files.is_empty() {
        warn!("quote requested without files");
        return Err(QuoteError::InvalidInput("Please select at least one file".into()));
    }
    config.validate().inspect_err(|e| warn!(error = %e, "rejected print configuration"))?;
    let config = config.normalized();

    let counter = counter_for(options);
    let estimates: Vec<FileEstimate> = files.iter().map(|doc| counter.estimate(doc)).collect();

    let pages: u64 = estimates.iter().map(|e| u64::from(e.page_count)).sum();
    let total_pages = pages.saturating_mul(u64::from(config.copies));
    let quote = calculate_price(total_pages, &config, table)?;

    info!(
        files = estimates.len(),
        total_pages,
        total_amount = %quote.total_amount,
        "priced print order"
    );
    Ok(QuoteResult {
        files: estimates,
        quote,
    })
}

/// Decodes JSON file payloads and quotes them.
pub fn quote_payloads(
    payloads: &[FilePayload],
    config: &PrintConfiguration,
    options: &EstimateOptions,
    table: &PricingTable,
) -> Result<QuoteResult, QuoteError> {
    let files = payloads
        .iter()
        .map(IntakeFile::from_payload)
        .collect::<Result<Vec<_>, _>>()?;
    let inputs: Vec<DocumentInput<'_>> = files.iter().map(IntakeFile::as_input).collect();
    quote_order(&inputs, config, options, table)
}

/// What the customer chose on the confirmation step.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// `totalAmount` of the quote.
    pub quote_amount: Decimal,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub address: String,
}

/// Amounts shown on the confirmation step and passed to the payment widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub base_amount: Decimal,
    pub delivery_charge: Decimal,
    pub final_amount: Decimal,
    /// Final amount in paise.
    pub amount_minor_units: i64,
    pub address: String,
}

pub fn checkout_summary(request: &CheckoutRequest, table: &PricingTable) -> Result<CheckoutSummary, QuoteError> {
    if request.quote_amount.is_sign_negative() && !request.quote_amount.is_zero() {
        return Err(QuoteError::InvalidInput("quote amount must not be negative".into()));
    }
    let address = match request.delivery_type {
        DeliveryType::Delivery if request.address.trim().is_empty() => {
            return Err(QuoteError::InvalidInput("Please enter your delivery address".into()));
        }
        DeliveryType::Delivery => request.address.trim().to_string(),
        DeliveryType::Pickup => PICKUP_ADDRESS.to_string(),
    };

    let final_amount = final_amount(request.quote_amount, request.delivery_type, table)?;
    Ok(CheckoutSummary {
        base_amount: request.quote_amount,
        delivery_charge: delivery_charge(request.delivery_type, table),
        final_amount,
        amount_minor_units: to_minor_units(final_amount)?,
        address,
    })
}

/// Lifecycle of an order in the external order store. Orders are saved as
/// `paid` once the payment widget confirms; the shop moves them on from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFile {
    pub file_name: String,
    /// Base64 `data:` URL of the file content.
    pub file_data: String,
}

/// The order record handed to the order store once a quote is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub user_id: String,
    pub user_email: String,
    pub files: Vec<DraftFile>,
    #[serde(flatten)]
    pub config: PrintConfiguration,
    pub total_amount: Decimal,
    pub total_pages: u64,
    /// Unset on a draft; the order store records the status after payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderDraft {
    /// The record to store once the payment widget confirms payment.
    pub fn into_paid(self) -> Self {
        Self {
            status: Some(OrderStatus::Paid),
            ..self
        }
    }
}

pub fn build_order_draft(
    user_id: &str,
    user_email: &str,
    files: &[IntakeFile],
    config: &PrintConfiguration,
    quote: &PriceQuote,
) -> Result<OrderDraft, QuoteError> {
    if user_id.trim().is_empty() {
        return Err(QuoteError::InvalidInput("Please log in to place an order".into()));
    }
    if files.is_empty() {
        return Err(QuoteError::InvalidInput("Please select at least one file".into()));
    }
    config.validate().inspect_err(|e| warn!(error = %e, "rejected print configuration"))?;

    let files = files
        .iter()
        .map(|f| DraftFile {
            file_name: f.name.clone(),
            file_data: encode_data_url(&mime_for(&f.name, f.mime.as_deref()), &f.bytes),
        })
        .collect();

    Ok(OrderDraft {
        user_id: user_id.to_string(),
        user_email: user_email.to_string(),
        files,
        config: config.normalized(),
        total_amount: quote.total_amount,
        total_pages: quote.total_pages,
        status: None,
    })
}
