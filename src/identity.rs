/// Stable filename stem for a remote resource: the lowercase hex MD5 of its URL.
pub fn identity(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Whether `stem` can be used verbatim as a single path component.
pub fn is_safe_stem(stem: &str) -> bool {
    !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
