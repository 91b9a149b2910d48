//! Shareable locator: `?index=<original_index>`.

const INDEX_KEY: &str = "index";

/// Locator string for a scene.
pub fn format_locator(original_index: usize) -> String {
    format!("?{}={}", INDEX_KEY, original_index)
}

/// Extract the scene index from a locator or full URL.
///
/// Anything before `?` is ignored, as is a `#fragment`. Returns `None`
/// when there is no parseable `index` parameter.
pub fn parse_locator(locator: &str) -> Option<usize> {
    let query = locator.split_once('?').map(|(_, q)| q).unwrap_or(locator);
    let query = query.split('#').next().unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == INDEX_KEY)
        .and_then(|(_, value)| value.trim().parse().ok())
}
