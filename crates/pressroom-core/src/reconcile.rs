//! Price reconciliation between stored variants and the storefront feed.
//!
//! The feed is the source of truth: every mismatch describes how the stored
//! value differs from what the storefront currently sells at.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{NormalizedProduct, NormalizedVariant};

/// A variant's prices as currently persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVariantPrice {
    /// Database primary key of the variant row.
    pub variant_id: i64,
    /// Shopify variant ID used to match against the feed.
    pub source_variant_id: String,
    pub product_name: String,
    pub variant_title: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceMismatch {
    PriceChanged {
        variant_id: i64,
        source_variant_id: String,
        stored: Decimal,
        feed: Decimal,
    },
    CompareAtChanged {
        variant_id: i64,
        source_variant_id: String,
        stored: Option<Decimal>,
        feed: Option<Decimal>,
    },
    MissingFromFeed {
        variant_id: i64,
        source_variant_id: String,
        product_name: String,
        variant_title: String,
    },
    MissingFromDatabase {
        source_variant_id: String,
        product_name: String,
        variant_title: String,
        feed_price: Decimal,
    },
}

impl PriceMismatch {
    #[must_use]
    pub fn source_variant_id(&self) -> &str {
        match self {
            PriceMismatch::PriceChanged {
                source_variant_id, ..
            }
            | PriceMismatch::CompareAtChanged {
                source_variant_id, ..
            }
            | PriceMismatch::MissingFromFeed {
                source_variant_id, ..
            }
            | PriceMismatch::MissingFromDatabase {
                source_variant_id, ..
            } => source_variant_id,
        }
    }
}

impl std::fmt::Display for PriceMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceMismatch::PriceChanged {
                source_variant_id,
                stored,
                feed,
                ..
            } => write!(f, "variant {source_variant_id}: price {stored} -> {feed}"),
            PriceMismatch::CompareAtChanged {
                source_variant_id,
                stored,
                feed,
                ..
            } => write!(
                f,
                "variant {source_variant_id}: compare-at {} -> {}",
                fmt_opt(*stored),
                fmt_opt(*feed)
            ),
            PriceMismatch::MissingFromFeed {
                source_variant_id,
                product_name,
                variant_title,
                ..
            } => write!(
                f,
                "variant {source_variant_id} ({product_name} / {variant_title}) is not in the feed"
            ),
            PriceMismatch::MissingFromDatabase {
                source_variant_id,
                product_name,
                variant_title,
                feed_price,
            } => write!(
                f,
                "variant {source_variant_id} ({product_name} / {variant_title}) at {feed_price} is not stored"
            ),
        }
    }
}

fn fmt_opt(value: Option<Decimal>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}

/// The new prices to write for one stored variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub variant_id: i64,
    pub source_variant_id: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub old_compare_at_price: Option<Decimal>,
    pub new_compare_at_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Stored variants examined.
    pub checked: usize,
    /// Stored variants whose price and compare-at match the feed.
    pub matched: usize,
    pub mismatches: Vec<PriceMismatch>,
    #[serde(skip)]
    updates: Vec<PriceUpdate>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// One update per stored variant whose feed price or compare-at differs,
    /// in stored order.
    #[must_use]
    pub fn price_updates(&self) -> &[PriceUpdate] {
        &self.updates
    }
}

/// Diffs stored variant prices against the storefront feed.
///
/// Variants are matched on Shopify variant ID. Comparison is numeric, so
/// `"12.9"` and `"12.90"` are equal.
#[must_use]
pub fn reconcile_prices(
    stored: &[StoredVariantPrice],
    feed_products: &[NormalizedProduct],
) -> ReconcileReport {
    let mut feed: HashMap<&str, (&NormalizedProduct, &NormalizedVariant)> = HashMap::new();
    for product in feed_products {
        for variant in &product.variants {
            feed.insert(variant.source_variant_id.as_str(), (product, variant));
        }
    }

    let mut report = ReconcileReport {
        checked: stored.len(),
        ..ReconcileReport::default()
    };
    let mut seen: HashSet<&str> = HashSet::with_capacity(stored.len());

    for row in stored {
        seen.insert(row.source_variant_id.as_str());

        let Some((_, variant)) = feed.get(row.source_variant_id.as_str()) else {
            report.mismatches.push(PriceMismatch::MissingFromFeed {
                variant_id: row.variant_id,
                source_variant_id: row.source_variant_id.clone(),
                product_name: row.product_name.clone(),
                variant_title: row.variant_title.clone(),
            });
            continue;
        };

        let price_differs = row.price != variant.price;
        let compare_at_differs = row.compare_at_price != variant.compare_at_price;

        if price_differs {
            report.mismatches.push(PriceMismatch::PriceChanged {
                variant_id: row.variant_id,
                source_variant_id: row.source_variant_id.clone(),
                stored: row.price,
                feed: variant.price,
            });
        }
        if compare_at_differs {
            report.mismatches.push(PriceMismatch::CompareAtChanged {
                variant_id: row.variant_id,
                source_variant_id: row.source_variant_id.clone(),
                stored: row.compare_at_price,
                feed: variant.compare_at_price,
            });
        }

        if price_differs || compare_at_differs {
            report.updates.push(PriceUpdate {
                variant_id: row.variant_id,
                source_variant_id: row.source_variant_id.clone(),
                old_price: row.price,
                new_price: variant.price,
                old_compare_at_price: row.compare_at_price,
                new_compare_at_price: variant.compare_at_price,
            });
        } else {
            report.matched += 1;
        }
    }

    for product in feed_products {
        for variant in &product.variants {
            if !seen.contains(variant.source_variant_id.as_str()) {
                report.mismatches.push(PriceMismatch::MissingFromDatabase {
                    source_variant_id: variant.source_variant_id.clone(),
                    product_name: product.title.clone(),
                    variant_title: variant.title.clone(),
                    feed_price: variant.price,
                });
            }
        }
    }

    report
}
