//! Derives file names from document content.
//!
//! Nothing in here touches the filesystem: callers pass in the set of names
//! that already exist and the current time.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Extension of every managed document, including the dot.
pub const DOCUMENT_EXTENSION: &str = ".md";
/// Prefix of generated names for new documents.
pub const NEW_DOCUMENT_PREFIX: &str = "note-";
/// Title used when the content yields no usable slug.
pub const UNTITLED: &str = "untitled";
/// Maximum slug length, in characters.
pub const MAX_SLUG_LENGTH: usize = 50;
/// Upper bound on candidates tried by [`generate_unique_name`].
pub const MAX_NAME_ATTEMPTS: usize = 1000;

const SPACE_REPLACEMENT: &str = "-";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static LEADING_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s*").unwrap());
static INVALID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Turns the first non-blank line of `content` into a filesystem-safe slug.
///
/// The heading marker is stripped, characters that are illegal in file names
/// are removed, spaces become `-`, and the result is lower-cased and cut to
/// [`MAX_SLUG_LENGTH`] characters. Returns an empty string when nothing usable
/// is left; picking a fallback is up to the caller.
pub fn derive_title_slug(content: &str) -> String {
    let Some(line) = content.lines().map(str::trim).find(|line| !line.is_empty()) else {
        return String::new();
    };

    let cleaned = LEADING_HEADING.replace(line, "");
    let cleaned = INVALID_CHARS.replace_all(&cleaned, "");
    let cleaned = cleaned.replace(' ', SPACE_REPLACEMENT);
    let lowered = cleaned.trim().to_lowercase();

    let truncated: String = lowered.chars().take(MAX_SLUG_LENGTH).collect();

    // A slug must not itself read as a heading, otherwise deriving again would
    // strip it further.
    truncated
        .trim_start_matches(|c: char| c == '#' || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Slug for `content`, falling back to [`UNTITLED`] when there is none.
pub fn slug_or_untitled(content: &str) -> String {
    let slug = derive_title_slug(content);
    if slug.is_empty() { UNTITLED.to_string() } else { slug }
}

/// Builds `{prefix}{timestamp}{extension}`, appending `-{n}` before the
/// extension until the name is not in `existing`.
///
/// Gives up with [`Error::Exhausted`] after [`MAX_NAME_ATTEMPTS`] candidates.
pub fn generate_unique_name(
    existing: &HashSet<String>,
    prefix: &str,
    extension: &str,
    now: NaiveDateTime,
) -> Result<String> {
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = if attempt == 0 {
            format!("{prefix}{timestamp}{extension}")
        } else {
            format!("{prefix}{timestamp}-{attempt}{extension}")
        };
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(Error::Exhausted {
        prefix: prefix.to_string(),
        attempts: MAX_NAME_ATTEMPTS,
    })
}

/// Title written into the header of a freshly created document: the generated
/// name without its extension.
///
/// The slug of that header is the name itself, so saving an untouched new
/// document keeps its file name.
pub fn title_from_generated_name(name: &str) -> &str {
    name.strip_suffix(DOCUMENT_EXTENSION).unwrap_or(name)
}
