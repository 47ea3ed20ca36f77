//! Domain keys used to index jars and calls.

/// Derive the domain key of `url`: the text between the second and third `/`.
///
/// No normalization happens. `https://www.example.com/` and
/// `https://example.com/` are different domains, and ports or letter case
/// are kept as written. Input with fewer than two slashes yields an empty
/// string, so callers must check for that themselves.
pub fn domain_from_url(url: &str) -> &str {
    url.split('/').nth(2).unwrap_or("")
}
