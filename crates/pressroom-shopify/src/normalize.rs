//! Conversion from storefront feed types to [`pressroom_core::NormalizedProduct`].

use pressroom_core::{parse_price, NormalizedProduct, NormalizedVariant};

use crate::error::ShopifyError;
use crate::types::{ShopifyProduct, ShopifyVariant};

/// Normalizes a feed product.
///
/// `storefront_url` is used to build the product's canonical URL and
/// `currency_code` is applied to every variant, since the feed does not
/// carry a currency.
///
/// # Errors
///
/// Returns [`ShopifyError::Normalization`] if the product has no variants or
/// a variant price cannot be parsed.
pub fn normalize_product(
    product: ShopifyProduct,
    storefront_url: &str,
    currency_code: &str,
) -> Result<NormalizedProduct, ShopifyError> {
    let source_product_id = product.id.to_string();

    if product.variants.is_empty() {
        return Err(ShopifyError::Normalization {
            source_product_id,
            reason: "product has no variants".into(),
        });
    }

    let source_url = Some(format!(
        "{}/products/{}",
        storefront_url.trim_end_matches('/'),
        product.handle
    ));

    // Position 1 is the storefront default; without position data the first
    // variant is.
    let has_position_data = product.variants.iter().any(|v| v.position.is_some());

    let variants = product
        .variants
        .into_iter()
        .enumerate()
        .map(|(idx, variant)| {
            let is_default = if has_position_data {
                variant.position == Some(1)
            } else {
                idx == 0
            };
            normalize_variant(variant, is_default, currency_code, &source_product_id)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let image_url = product
        .image
        .map(|img| img.src)
        .or_else(|| {
            product
                .images
                .into_iter()
                .min_by_key(|img| img.position.unwrap_or(i32::MAX))
                .map(|img| img.src)
        });

    Ok(NormalizedProduct {
        source_product_id,
        title: product.title,
        handle: product.handle,
        vendor: product.vendor.filter(|s| !s.is_empty()),
        product_type: product.product_type.filter(|s| !s.is_empty()),
        description_html: product.body_html.filter(|s| !s.trim().is_empty()),
        tags: product.tags,
        source_url,
        image_url,
        variants,
    })
}

fn normalize_variant(
    variant: ShopifyVariant,
    is_default: bool,
    currency_code: &str,
    source_product_id: &str,
) -> Result<NormalizedVariant, ShopifyError> {
    let invalid = |reason: String| ShopifyError::Normalization {
        source_product_id: source_product_id.to_owned(),
        reason,
    };

    let price = parse_price(&variant.price)
        .map_err(|e| invalid(format!("variant {}: {e}", variant.id)))?;

    // Some stores send "" or "0.00" instead of null for "not on sale".
    let compare_at_price = match variant.compare_at_price.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let parsed =
                parse_price(raw).map_err(|e| invalid(format!("variant {}: {e}", variant.id)))?;
            (!parsed.is_zero()).then_some(parsed)
        }
    };

    Ok(NormalizedVariant {
        source_variant_id: variant.id.to_string(),
        sku: variant.sku.filter(|s| !s.is_empty()),
        title: variant.title,
        price,
        compare_at_price,
        currency_code: currency_code.to_owned(),
        is_available: variant.available,
        is_default,
        position: variant.position,
    })
}
