use memchr::{memchr, memmem};
use serde::{Deserialize, Serialize};

const INFOBOX_MARKER: &str = "{{Infobox";
const INFOBOX_CLOSE: &[u8] = b"\n}}\n";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Infobox {
    /// Rest of the opening line, e.g. `Person` for `{{Infobox Person`
    pub title: String,
    /// `key = value` fields with a non-empty value, in source order
    pub fields: Vec<(String, String)>,
}

/// Parses the first `{{Infobox` block of a page.
///
/// The block runs to the first `\n}}\n` after the marker. Fields are split on
/// `|` without regard to nested templates, so a value holding `{{birth date|..}}`
/// is cut short; this is a lexical pass, not a template parser. Returns `None`
/// when there is no marker, no closing line, or no usable field.
pub fn parse_infobox(text: &str) -> Option<Infobox> {
    let bytes = text.as_bytes();
    let start = memmem::find(bytes, INFOBOX_MARKER.as_bytes())?;
    let after_marker = start + INFOBOX_MARKER.len();
    let close = after_marker + memmem::find(&bytes[after_marker..], INFOBOX_CLOSE)?;
    // The closing sequence starts with a newline, so the title line ends at or before it.
    let title_end = after_marker + memchr(b'\n', &bytes[after_marker..])?;

    let fields: Vec<(String, String)> = text[title_end..close]
        .split('|')
        .filter_map(parse_field)
        .collect();

    if fields.is_empty() {
        return None;
    }

    Some(Infobox {
        title: text[after_marker..title_end].trim().to_string(),
        fields,
    })
}

fn parse_field(field: &str) -> Option<(String, String)> {
    let (key, value) = field.trim().split_once('=')?;
    let value = value.trim();
    if value.is_empty() || value.contains('=') {
        return None;
    }
    let key = key.trim_start_matches('|').trim();
    Some((key.to_string(), value.to_string()))
}
