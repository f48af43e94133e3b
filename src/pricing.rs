//! Print configuration and price calculation.
//!
//! Prices are built from three additive parts, all in whole currency units
//! unless the rate table says otherwise:
//!
//! - a base rate per page (A3 flat, otherwise color or black & white)
//! - a paper surcharge per page (A4/Letter only)
//! - a flat binding charge stepped on the total page count
//!
//! Delivery is not part of the quote; it is added on top by
//! [`final_amount`] once the customer picks a delivery type.

use crate::schema::QuoteError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperType {
    Normal,
    Glossy,
    Matte,
    Bond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    /// Older order forms sent `blackwhite` or `black`.
    #[serde(rename = "blackAndWhite", alias = "blackwhite", alias = "black")]
    BlackAndWhite,
    #[serde(rename = "color")]
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    None,
    Spiral,
    Hardcover,
}

/// Options chosen by the customer for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PrintConfiguration {
    pub paper_size: PaperSize,
    pub paper_type: PaperType,
    pub color: ColorMode,
    pub binding: Binding,
    #[validate(range(min = 1, message = "Copies must be at least 1"))]
    pub copies: u32,
}

impl PrintConfiguration {
    /// A3 is only printed black & white on normal paper.
    pub fn normalized(self) -> Self {
        match self.paper_size {
            PaperSize::A3 => Self {
                paper_type: PaperType::Normal,
                color: ColorMode::BlackAndWhite,
                ..self
            },
            _ => self,
        }
    }

    /// Parses a configuration from JSON, validates it and applies the A3 rule.
    pub fn from_json(json: &str) -> Result<Self, QuoteError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| QuoteError::InvalidInput(format!("print configuration: {}", e)))?;
        config.validate()?;
        Ok(config.normalized())
    }
}

/// How a paid order reaches the customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    #[default]
    Pickup,
    Delivery,
}

/// Rates used by the calculator.
///
/// Every field defaults to the shop's standard price list, so a rate override
/// only needs the fields it changes:
///
/// ```json
/// { "colorPerPage": 12, "deliveryCharge": 60 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PricingTable {
    pub a3_per_page: Decimal,
    pub color_per_page: Decimal,
    pub black_and_white_per_page: Decimal,
    pub glossy_per_page: Decimal,
    pub matte_per_page: Decimal,
    pub bond_per_page: Decimal,
    pub spiral_small: Decimal,
    pub spiral_medium: Decimal,
    pub spiral_large: Decimal,
    /// First page total charged `spiral_medium`.
    pub spiral_medium_from_pages: u64,
    /// First page total charged `spiral_large`.
    pub spiral_large_from_pages: u64,
    pub hardcover: Decimal,
    pub delivery_charge: Decimal,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            a3_per_page: Decimal::from(10),
            color_per_page: Decimal::from(10),
            black_and_white_per_page: Decimal::from(3),
            glossy_per_page: Decimal::from(40),
            matte_per_page: Decimal::from(40),
            bond_per_page: Decimal::from(5),
            spiral_small: Decimal::from(40),
            spiral_medium: Decimal::from(60),
            spiral_large: Decimal::from(80),
            spiral_medium_from_pages: 50,
            spiral_large_from_pages: 100,
            hardcover: Decimal::from(50),
            delivery_charge: Decimal::from(50),
        }
    }
}

impl PricingTable {
    /// Parses a rate override. `None` or an empty string yields the defaults.
    pub fn from_json(json: Option<&str>) -> Result<Self, QuoteError> {
        let table: Self = match json.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => serde_json::from_str(s)
                .map_err(|e| QuoteError::InvalidInput(format!("pricing table: {}", e)))?,
            None => Self::default(),
        };
        table.check()?;
        Ok(table)
    }

    fn check(&self) -> Result<(), QuoteError> {
        let rates = [
            self.a3_per_page,
            self.color_per_page,
            self.black_and_white_per_page,
            self.glossy_per_page,
            self.matte_per_page,
            self.bond_per_page,
            self.spiral_small,
            self.spiral_medium,
            self.spiral_large,
            self.hardcover,
            self.delivery_charge,
        ];
        if rates.iter().any(|r| r.is_sign_negative() && !r.is_zero()) {
            return Err(QuoteError::InvalidInput("pricing table: rates must not be negative".into()));
        }
        if self.spiral_medium_from_pages > self.spiral_large_from_pages {
            return Err(QuoteError::InvalidInput(
                "pricing table: spiral tiers are out of order".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base_cost: Decimal,
    pub paper_type_cost: Decimal,
    pub binding_cost: Decimal,
}

/// Total pages and price for a candidate order, before delivery and payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Pages of all files multiplied by copies.
    pub total_pages: u64,
    pub total_amount: Decimal,
    pub breakdown: PriceBreakdown,
}

/// Prices `total_pages` (copies already applied) under `config`.
///
/// # Errors
///
/// Returns `QuoteError::InvalidInput` when a cost does not fit in a
/// `Decimal`, which only happens with absurd page counts or rate overrides.
pub fn calculate_price(
    total_pages: u64,
    config: &PrintConfiguration,
    table: &PricingTable,
) -> Result<PriceQuote, QuoteError> {
    let config = config.normalized();
    let pages = Decimal::from(total_pages);

    let per_page = match (config.paper_size, config.color) {
        (PaperSize::A3, _) => table.a3_per_page,
        (_, ColorMode::Color) => table.color_per_page,
        (_, ColorMode::BlackAndWhite) => table.black_and_white_per_page,
    };
    let base_cost = pages.checked_mul(per_page).ok_or_else(|| overflow("base cost"))?;

    let surcharge = match (config.paper_size, config.paper_type) {
        (PaperSize::A3, _) | (_, PaperType::Normal) => Decimal::ZERO,
        (_, PaperType::Glossy) => table.glossy_per_page,
        (_, PaperType::Matte) => table.matte_per_page,
        (_, PaperType::Bond) => table.bond_per_page,
    };
    let paper_type_cost = pages.checked_mul(surcharge).ok_or_else(|| overflow("paper cost"))?;

    let binding_cost = match config.binding {
        Binding::None => Decimal::ZERO,
        Binding::Spiral if total_pages < table.spiral_medium_from_pages => table.spiral_small,
        Binding::Spiral if total_pages < table.spiral_large_from_pages => table.spiral_medium,
        Binding::Spiral => table.spiral_large,
        Binding::Hardcover => table.hardcover,
    };

    let total = base_cost
        .checked_add(paper_type_cost)
        .and_then(|sum| sum.checked_add(binding_cost))
        .ok_or_else(|| overflow("total amount"))?;

    Ok(PriceQuote {
        total_pages,
        total_amount: round_currency(total),
        breakdown: PriceBreakdown {
            base_cost,
            paper_type_cost,
            binding_cost,
        },
    })
}

pub fn delivery_charge(delivery: DeliveryType, table: &PricingTable) -> Decimal {
    match delivery {
        DeliveryType::Pickup => Decimal::ZERO,
        DeliveryType::Delivery => table.delivery_charge,
    }
}

/// Quote amount plus the delivery charge.
pub fn final_amount(
    quote_amount: Decimal,
    delivery: DeliveryType,
    table: &PricingTable,
) -> Result<Decimal, QuoteError> {
    quote_amount
        .checked_add(delivery_charge(delivery, table))
        .map(round_currency)
        .ok_or_else(|| overflow("final amount"))
}

/// Converts an amount to integer minor units (paise), rounding half up.
pub fn to_minor_units(amount: Decimal) -> Result<i64, QuoteError> {
    amount
        .checked_mul(Decimal::from(100))
        .and_then(|minor| {
            minor
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .ok_or_else(|| QuoteError::InvalidInput(format!("amount {} out of range", amount)))
}

fn overflow(what: &str) -> QuoteError {
    QuoteError::InvalidInput(format!("{} out of range", what))
}

fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
