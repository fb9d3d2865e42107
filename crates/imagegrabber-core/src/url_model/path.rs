//! Filename extraction from a parsed URL path.

/// Extracts the last path segment from an absolute URL.
///
/// Returns `None` if the URL cannot be parsed (e.g. it is relative) or the
/// path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}
