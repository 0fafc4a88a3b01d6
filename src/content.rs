use crate::config::CATEGORY_LINK_NAMESPACE;
use crate::models::References;
use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest `[[...]]` span; a span never crosses a line break.
pub static REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.+?)\]\]").unwrap());

#[derive(Debug, PartialEq, Eq)]
pub enum Reference<'a> {
    Link(&'a str),
    Category(&'a str),
    /// File, image, interwiki and every other prefixed target
    Other,
}

/// Classifies the inner text of one `[[...]]` span.
pub fn classify_reference(inner: &str) -> Reference<'_> {
    let target = inner.split('|').next().unwrap_or_default().trim();

    match target.split_once(':') {
        Some((prefix, rest)) if prefix == CATEGORY_LINK_NAMESPACE => {
            Reference::Category(rest.trim())
        }
        Some(_) => Reference::Other,
        None => Reference::Link(target),
    }
}

/// Collects distinct links and parent categories in order of first appearance.
pub fn extract_references(text: &str) -> References {
    let mut references = References::default();

    for caps in REFERENCE_REGEX.captures_iter(text) {
        match classify_reference(&caps[1]) {
            Reference::Link(title) if !title.is_empty() => {
                if !references.links.contains(title) {
                    references.links.insert(title.to_string());
                }
            }
            Reference::Category(name) if !name.is_empty() => {
                if !references.parents.contains(name) {
                    references.parents.insert(name.to_string());
                }
            }
            _ => {}
        }
    }

    references
}
