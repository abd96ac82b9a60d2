//! Server tag filter parsing.

/// Separator between tags in a tag specification.
pub const TAG_SEPARATOR: char = ',';

/// Parses a tag specification (comma separated string) into an ordered list of tags.
///
/// Tokens are passed through verbatim: no trimming, no deduplication, and empty tokens produced
/// by consecutive separators are kept. An empty specification yields no tags, meaning "no filter".
///
/// # Examples
///
/// ```
/// use fedtls::parse_tags;
///
/// assert!(parse_tags("").is_empty());
/// assert_eq!(parse_tags("a,,b"), vec!["a", "", "b"]);
/// ```
pub fn parse_tags(tag_spec: &str) -> Vec<String> {
    if tag_spec.is_empty() {
        return Vec::new();
    }

    let mut tags: Vec<String> = tag_spec.split(TAG_SEPARATOR).map(String::from).collect();

    // A trailing separator does not start a new token.
    if tag_spec.ends_with(TAG_SEPARATOR) {
        tags.pop();
    }

    tags
}
