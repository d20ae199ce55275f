//! Text normalization for cities and tags.
//!
//! Cities and tags are stored lower-cased so that search is
//! case-insensitive; cities are re-capitalized only for display.

use std::collections::HashSet;

/// Lower-case and trim a city name.
pub fn normalize_city(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Capitalize the first letter of every whitespace-separated word.
///
/// # Examples
/// ```
/// use gallery_service::services::normalize::display_city;
///
/// assert_eq!(display_city("new york city"), "New York City");
/// ```
pub fn display_city(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Clean a single tag token: `#Red` becomes `red`.
///
/// Returns `None` unless the token starts with `#` and has something other
/// than `#` after it.
pub fn extract_tag(raw_token: &str) -> Option<String> {
    let body = raw_token.strip_prefix('#')?;
    if body.trim_start_matches('#').is_empty() {
        return None;
    }
    Some(body.to_lowercase())
}

/// Extract tags from a free-text tag field.
///
/// Tokens without a leading `#` are dropped. Duplicates are removed while
/// preserving first occurrence order.
pub fn parse_tags(raw_text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw_text
        .split_whitespace()
        .filter_map(extract_tag)
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_city() {
        assert_eq!(normalize_city("  Paris "), "paris");
        assert_eq!(normalize_city("paris"), "paris");
        assert_eq!(normalize_city("São Paulo"), "são paulo");
    }

    #[test]
    fn test_display_city() {
        assert_eq!(display_city("paris"), "Paris");
        assert_eq!(display_city("são paulo"), "São Paulo");
        assert_eq!(display_city("washington d.c."), "Washington D.C.");
        assert_eq!(display_city(""), "");
    }

    #[test]
    fn test_extract_tag() {
        assert_eq!(extract_tag("#Cottagecore"), Some("cottagecore".to_string()));
        assert_eq!(extract_tag("#"), None);
        assert_eq!(extract_tag("##"), None);
        assert_eq!(extract_tag("###"), None);
        assert_eq!(extract_tag("plain"), None);
        assert_eq!(extract_tag("mid#hash"), None);
    }

    #[test]
    fn test_parse_tags_dedup_preserves_order() {
        let tags = parse_tags("#red nope #City ## #red  # #city #blue");
        assert_eq!(tags, vec!["red", "city", "blue"]);
    }

    #[test]
    fn test_parse_tags_empty() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags("   ").is_empty());
    }
}
