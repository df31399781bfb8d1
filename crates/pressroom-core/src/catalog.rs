use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A product pulled from the Shopify storefront feed, normalized for storage
/// and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedProduct {
    /// Shopify numeric product ID, stored as a string to avoid precision loss.
    pub source_product_id: String,
    pub title: String,
    /// Shopify URL slug, e.g. `"jasmine-green-tea"`.
    pub handle: String,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    /// Raw HTML from Shopify's `body_html` field.
    pub description_html: Option<String>,
    pub tags: Vec<String>,
    /// Canonical storefront URL, e.g. `"https://shop.example.com/products/jasmine-green-tea"`.
    pub source_url: Option<String>,
    /// First product image, if any.
    pub image_url: Option<String>,
    pub variants: Vec<NormalizedVariant>,
}

impl NormalizedProduct {
    #[must_use]
    pub fn has_available_variants(&self) -> bool {
        self.variants.iter().any(|v| v.is_available)
    }

    /// Returns the default variant (position 1 in Shopify), if present.
    #[must_use]
    pub fn default_variant(&self) -> Option<&NormalizedVariant> {
        self.variants.iter().find(|v| v.is_default)
    }

    #[must_use]
    pub fn price_range(&self) -> Option<PriceRange> {
        select_price_range(&self.variants)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedVariant {
    /// Shopify numeric variant ID, stored as a string to avoid precision loss.
    pub source_variant_id: String,
    pub sku: Option<String>,
    /// Variant display title, e.g. `"100g / Loose leaf"`.
    pub title: String,
    pub price: Decimal,
    /// Pre-sale comparison price, if set.
    pub compare_at_price: Option<Decimal>,
    /// ISO 4217 currency code (e.g., `"USD"`).
    pub currency_code: String,
    pub is_available: bool,
    /// `true` for the Shopify position-1 variant (the storefront default).
    pub is_default: bool,
    pub position: Option<i32>,
}

/// The price span shown for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
    /// Highest compare-at price above `max`. Present only when the product
    /// is on sale.
    pub compare_at_max: Option<Decimal>,
    pub currency_code: String,
}

impl PriceRange {
    #[must_use]
    pub fn is_single_price(&self) -> bool {
        self.min == self.max
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_max.is_some()
    }

    /// Formats the range for display, e.g. `"$12.99"` or `"$12.99 – $24.99"`.
    #[must_use]
    pub fn display(&self) -> String {
        let min = format_money(self.min, &self.currency_code);
        if self.is_single_price() {
            min
        } else {
            format!("{min} – {}", format_money(self.max, &self.currency_code))
        }
    }
}

impl std::fmt::Display for PriceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Formats `amount` with two decimal places and the currency's symbol.
///
/// Currencies without a known symbol are prefixed with their code, e.g.
/// `"JPY 1200.00"`.
#[must_use]
pub fn format_money(amount: Decimal, currency_code: &str) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    match currency_code.to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" => format!("${rounded}"),
        "EUR" => format!("€{rounded}"),
        "GBP" => format!("£{rounded}"),
        other => format!("{other} {rounded}"),
    }
}

/// Selects the price range to show for a product's variants.
///
/// Only available variants are considered; when none is available every
/// variant is. Returns `None` for an empty slice.
#[must_use]
pub fn select_price_range(variants: &[NormalizedVariant]) -> Option<PriceRange> {
    let available: Vec<&NormalizedVariant> = variants.iter().filter(|v| v.is_available).collect();
    let considered: Vec<&NormalizedVariant> = if available.is_empty() {
        variants.iter().collect()
    } else {
        available
    };

    let first = considered.first()?;
    let mut min = first.price;
    let mut max = first.price;
    let mut compare_at: Option<Decimal> = None;

    for variant in &considered {
        min = min.min(variant.price);
        max = max.max(variant.price);
        if let Some(c) = variant.compare_at_price {
            compare_at = Some(compare_at.map_or(c, |cur| cur.max(c)));
        }
    }

    Some(PriceRange {
        min,
        max,
        compare_at_max: compare_at.filter(|c| *c > max),
        currency_code: first.currency_code.clone(),
    })
}

/// Parses a Shopify decimal price string such as `"12.99"` or `"12"`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPrice`] for empty, non-numeric, or negative
/// values.
pub fn parse_price(raw: &str) -> Result<Decimal, CoreError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| CoreError::InvalidPrice {
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    let price = Decimal::from_str(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(invalid("negative"));
    }
    Ok(price)
}
