//! Store origin and host extraction.

/// Returns the `scheme://host[:port]` origin of a storefront URL, so the feed
/// is always fetched from the store root even when the configured URL points
/// at a collection page.
#[must_use]
pub fn extract_store_origin(shop_url: &str) -> String {
    reqwest::Url::parse(shop_url).map_or_else(
        |e| {
            tracing::warn!(
                shop_url,
                error = %e,
                "storefront URL does not parse; using its first three path segments as origin"
            );
            shop_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Hostname for error messages; the input itself if it does not parse.
pub(crate) fn extract_domain(shop_url: &str) -> String {
    reqwest::Url::parse(shop_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| shop_url.to_owned())
}
