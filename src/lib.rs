//! Page-count estimation and pricing for print orders.
//!
//! The order form calls into this crate (compiled to WebAssembly) to estimate
//! how many pages each uploaded file will print, and to price the order from
//! the chosen paper, color, binding and copy count. See [`assembly`] for the
//! JavaScript surface and [`quote::quote_order`] for the Rust entry point.

pub mod assembly;
pub mod estimators;
pub mod file_utils;
pub mod logging;
pub mod ooxml;
pub mod pricing;
pub mod quote;
pub mod schema;

pub use estimators::{HeuristicCounter, PageCount, PageCounter, estimate_document};
pub use ooxml::OoxmlMetadataCounter;
pub use pricing::{
    Binding, ColorMode, DeliveryType, PaperSize, PaperType, PriceBreakdown, PriceQuote, PricingTable,
    PrintConfiguration, calculate_price, final_amount,
};
pub use quote::{
    CheckoutRequest, CheckoutSummary, FilePayload, IntakeFile, OrderDraft, OrderStatus, QuoteResult,
    build_order_draft, checkout_summary, quote_order,
};
pub use schema::{
    DocumentInput, DocumentKind, EstimateMethod, EstimateOptions, EstimateStrategy, FileEstimate,
    QuoteError,
};
