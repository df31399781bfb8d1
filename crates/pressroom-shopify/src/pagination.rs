//! Cursor pagination through the `Link` response header.
//!
//! Storefront responses advertise adjacent pages as
//! `<https://shop/products.json?limit=250&page_info=CURSOR>; rel="next"`,
//! optionally preceded by a `rel="previous"` entry.

/// Returns the `page_info` cursor of the `rel="next"` link, if any.
///
/// `None` means there is no header, no next link, or a next link without a
/// cursor; all three mean the current page is the last.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    link_header?
        .split(',')
        .map(str::trim)
        .find(|entry| is_next_relation(entry))
        .and_then(link_target)
        .and_then(|target| {
            reqwest::Url::parse(target).ok().and_then(|url| {
                url.query_pairs()
                    .find(|(k, _)| k == "page_info")
                    .map(|(_, v)| v.into_owned())
                    .filter(|v| !v.is_empty())
            })
        })
}

fn is_next_relation(entry: &str) -> bool {
    entry
        .split(';')
        .skip(1)
        .map(str::trim)
        .any(|param| param == r#"rel="next""# || param == "rel=next")
}

fn link_target(entry: &str) -> Option<&str> {
    let start = entry.find('<')? + 1;
    let end = entry.find('>')?;
    (start < end).then(|| &entry[start..end])
}
