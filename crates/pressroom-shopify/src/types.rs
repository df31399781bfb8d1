//! Response types for the storefront `GET /products.json` feed.
//!
//! `tags` arrive as a JSON array, `compare_at_price` is `null` when the
//! variant is not on sale, and `available`/`position` may be missing on
//! older stores.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ShopifyProductsResponse {
    pub products: Vec<ShopifyProduct>,
}

#[derive(Debug, Deserialize)]
pub struct ShopifyProduct {
    pub id: i64,
    pub title: String,
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
    /// May be an empty string; treated as absent during normalization.
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<ShopifyImage>,
    #[serde(default)]
    pub images: Vec<ShopifyImage>,
    pub variants: Vec<ShopifyVariant>,
}

#[derive(Debug, Deserialize)]
pub struct ShopifyVariant {
    pub id: i64,
    /// `"Default Title"` for single-variant products.
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    /// Decimal string, e.g. `"30.00"`.
    pub price: String,
    #[serde(default)]
    pub compare_at_price: Option<String>,
    /// Missing on some stores; assumed available.
    #[serde(default = "default_available")]
    pub available: bool,
    /// 1-based; `1` is the storefront default.
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ShopifyImage {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

fn default_available() -> bool {
    true
}
