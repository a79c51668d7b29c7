//! Human readable renditions of bodies.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Body;
use crate::utils::mime::guess_mime_from_bytes;

static TEXT_CONTENT_TYPE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^(?:text/.*|application/(?:csv|javascript|json|typescript|xml|x-yaml|x-www-form-urlencoded|vnd\.coffeescript)|.*\+(?:xml|json))(; charset=.+)*$",
    )
    .ok()
});

/// Whether a content type denotes textual data that can be shown verbatim.
pub fn is_text_content_type(content_type: &str) -> bool {
    TEXT_CONTENT_TYPE
        .as_ref()
        .is_some_and(|re| re.is_match(content_type))
}

/// The `charset` parameter of a content type, if present.
pub fn charset_of(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Decode bytes in the given charset. Unknown charsets are read as UTF-8 and
/// malformed sequences are replaced.
pub fn decode(bytes: &[u8], charset: Option<&str>) -> String {
    match charset.map(str::to_ascii_lowercase).as_deref() {
        Some("iso-8859-1" | "latin1" | "us-ascii" | "ascii") => {
            bytes.iter().map(|&b| b as char).collect()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Render a body for logs: `(empty)`, `(consumed)`, the decoded text for text
/// content, or `(N bytes of TYPE)` otherwise.
///
/// Text bodies are read into memory, which keeps them readable afterwards.
pub fn representation_of<B: Body + ?Sized>(body: &mut B, content_type: Option<&str>) -> String {
    if body.is_empty() {
        return "(empty)".to_string();
    }
    if body.is_consumed() {
        return "(consumed)".to_string();
    }

    let content_type = match content_type.filter(|ct| !ct.trim().is_empty()) {
        Some(ct) => ct.to_string(),
        None => body
            .to_byte_array()
            .ok()
            .and_then(|bytes| guess_mime_from_bytes(&bytes))
            .unwrap_or_else(|| "(unknown)".to_string()),
    };

    if is_text_content_type(&content_type) {
        return match body.to_byte_array() {
            Ok(bytes) => decode(&bytes, charset_of(&content_type)),
            Err(_) => "(consumed)".to_string(),
        };
    }

    format!("({} of {})", length_label(body.length()), content_type)
}

/// Render a body without reading it.
pub fn summary_of(body: &dyn Body, content_type: Option<&str>) -> String {
    if body.is_empty() {
        return "(empty)".to_string();
    }
    if body.is_consumed() {
        return "(consumed)".to_string();
    }
    let content_type = content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or("(unknown)");
    format!("({} of {})", length_label(body.length()), content_type)
}

fn length_label(length: Option<u64>) -> String {
    match length {
        Some(n) => format!("{n} bytes"),
        None => "unknown number of bytes".to_string(),
    }
}
