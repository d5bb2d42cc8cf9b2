//! URL helper functions

/// Generate a URL below the site's base URL
///
/// # Examples
/// ```ignore
/// url_for("/blog/", "category/rust.html") // -> "/blog/category/rust.html"
/// ```
pub fn url_for(base_url: &str, path: &str) -> String {
    let root = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Resolve a user-supplied asset reference (thumbnail, favicon, photo).
///
/// Absolute URLs and `data:` URIs pass through; everything else is placed
/// under the base URL. Blank input yields `None`.
pub fn asset_url(base_url: &str, reference: Option<&str>) -> Option<String> {
    let reference = reference?.trim();
    if reference.is_empty() {
        return None;
    }
    if reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("//")
        || reference.starts_with("data:")
    {
        return Some(reference.to_string());
    }
    Some(url_for(base_url, reference))
}

/// Absolute URL for sitemaps and robots.txt
///
/// # Examples
/// ```ignore
/// full_url_for("https://example.com", "/blog/", "a.html") // -> "https://example.com/blog/a.html"
/// ```
pub fn full_url_for(site_url: &str, base_url: &str, path: &str) -> String {
    let base = site_url.trim_end_matches('/');
    let path = url_for(base_url, path);
    if path.starts_with("http://") || path.starts_with("https://") {
        path
    } else {
        format!("{}{}", base, path)
    }
}
