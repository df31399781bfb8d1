//! Client for the public storefront `products.json` feed.

mod fetch_all;
mod origin;

use std::time::Duration;

use reqwest::Client;

use crate::error::ShopifyError;
use crate::retry::retry_with_backoff;
use crate::types::ShopifyProductsResponse;

pub use fetch_all::StorefrontCatalog;
pub use origin::extract_store_origin;

/// Page cap for [`StorefrontClient::fetch_all_products`]; guards against
/// cursors that cycle.
pub const MAX_PAGES: usize = 200;

/// Largest page size the feed honours.
pub const MAX_PAGE_SIZE: u32 = 250;

/// HTTP client for the storefront feed.
///
/// 429, network failures, and 5xx responses are retried with exponential
/// backoff up to `max_retries` extra attempts. 404 and other 4xx responses
/// fail immediately.
pub struct StorefrontClient {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl StorefrontClient {
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ShopifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Fetches one page of the feed. Returns the parsed page and the raw
    /// `Link` header, if present.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::RateLimited`]: 429 after all retries.
    /// - [`ShopifyError::NotFound`]: 404 (not retried).
    /// - [`ShopifyError::UnexpectedStatus`]: other non-2xx; 5xx after all retries.
    /// - [`ShopifyError::Http`]: network failure after all retries.
    /// - [`ShopifyError::Deserialize`]: body is not a products page.
    pub async fn fetch_products_page(
        &self,
        shop_url: &str,
        limit: u32,
        page_info: Option<&str>,
    ) -> Result<(ShopifyProductsResponse, Option<String>), ShopifyError> {
        let url = Self::products_url(shop_url, limit, page_info)?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ShopifyError::RateLimited {
                        domain: origin::extract_domain(shop_url),
                        retry_after_secs,
                    });
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ShopifyError::NotFound { url });
                }
                if !status.is_success() {
                    return Err(ShopifyError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                // Read the Link header before the body consumes the response.
                let link_header = response
                    .headers()
                    .get(reqwest::header::LINK)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);

                let body = response.text().await?;
                let parsed = serde_json::from_str::<ShopifyProductsResponse>(&body).map_err(
                    |e| ShopifyError::Deserialize {
                        context: format!("products page from {shop_url}"),
                        source: e,
                    },
                )?;

                Ok((parsed, link_header))
            }
        })
        .await
    }

    /// Builds `{origin}/products.json?limit=N[&page_info=CURSOR]`, clamping
    /// `limit` to `1..=250`.
    fn products_url(
        shop_url: &str,
        limit: u32,
        page_info: Option<&str>,
    ) -> Result<String, ShopifyError> {
        let origin = extract_store_origin(shop_url);
        let mut url = reqwest::Url::parse(&format!("{origin}/products.json")).map_err(|e| {
            ShopifyError::InvalidShopUrl {
                shop_url: shop_url.to_owned(),
                reason: format!("origin \"{origin}\" is not a valid URL base: {e}"),
            }
        })?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.clamp(1, MAX_PAGE_SIZE).to_string());
            if let Some(cursor) = page_info {
                query.append_pair("page_info", cursor);
            }
        }

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_url_uses_origin_and_clamps_limit() {
        let url =
            StorefrontClient::products_url("https://shop.example.com/collections/tea", 999, None)
                .unwrap();
        assert_eq!(url, "https://shop.example.com/products.json?limit=250");
    }

    #[test]
    fn products_url_appends_cursor() {
        let url = StorefrontClient::products_url("https://shop.example.com", 50, Some("abc=="))
            .unwrap();
        assert_eq!(
            url,
            "https://shop.example.com/products.json?limit=50&page_info=abc%3D%3D"
        );
    }

    #[test]
    fn products_url_rejects_garbage() {
        let result = StorefrontClient::products_url("not a url", 10, None);
        assert!(matches!(result, Err(ShopifyError::InvalidShopUrl { .. })));
    }
}
