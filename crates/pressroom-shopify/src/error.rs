//! Errors shared by the storefront feed client and the Admin GraphQL client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Transport failure: DNS, TLS, connect or read timeout.
    #[error("request to Shopify failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{domain} is throttling requests; retry in {retry_after_secs}s")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("no such resource at {url}")]
    NotFound { url: String },

    #[error("admin access token refused (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("{url} answered with HTTP {status}")]
    UnexpectedStatus { status: u16, url: String },

    /// A feed product that cannot be turned into a catalog entry.
    #[error("product {source_product_id} skipped: {reason}")]
    Normalization {
        source_product_id: String,
        reason: String,
    },

    #[error("gave up on {shop_url} after {max_pages} feed pages")]
    PaginationLimit { shop_url: String, max_pages: usize },

    #[error("store URL {shop_url:?} is unusable: {reason}")]
    InvalidShopUrl { shop_url: String, reason: String },

    /// Top-level `errors` array of a GraphQL response.
    #[error("admin API query failed: {0}")]
    GraphQl(String),

    /// `userErrors` returned by a mutation.
    #[error("admin API refused the mutation: {0}")]
    UserErrors(String),
}
