//! Search query parser
//!
//! Turns the raw search box text into a [`Filter`]:
//!
//! ```text
//! query   := simple | multi
//! multi   := term ("," term)+
//! simple  := tagTerm | cityTerm
//! tagTerm := "#" identifier
//! term    := tagTerm | cityName
//! ```
//!
//! In a multi-term query the first term decides the shape: a leading tag
//! makes every term a tag (OR), a leading city means "that city AND any of
//! the remaining tags".

use std::collections::HashSet;

use crate::domain::Filter;
use crate::error::{AppError, AppResult};
use crate::services::normalize::{extract_tag, normalize_city};

pub fn parse(raw: &str) -> AppResult<Filter> {
    let terms: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .collect();

    match terms.as_slice() {
        [] => Ok(Filter::All),
        [single] if single.starts_with('#') => Ok(Filter::Tag(tag_term(single)?)),
        [single] => Ok(Filter::City(normalize_city(single))),
        [first, ..] if first.starts_with('#') => Ok(Filter::AnyTag(tag_terms(&terms)?)),
        [first, rest @ ..] => Ok(Filter::CityAndAnyTag {
            city: normalize_city(first),
            tags: tag_terms(rest)?,
        }),
    }
}

/// Parse an optional search; absent means no filter
pub fn parse_optional(raw: Option<&str>) -> AppResult<Filter> {
    parse(raw.unwrap_or_default())
}

/// A term in tag position. The `#` marker is optional after the first term.
fn tag_term(term: &str) -> AppResult<String> {
    let tag = if term.starts_with('#') {
        extract_tag(term)
    } else {
        Some(term.to_lowercase())
    };

    tag.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("empty tag in search term '{}'", term)))
}

fn tag_terms(terms: &[&str]) -> AppResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(terms.len());
    for term in terms {
        let tag = tag_term(term)?;
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }
    Ok(tags)
}
