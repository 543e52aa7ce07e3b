//! Video identifier extraction from free-form links

use crate::error::{Result, TubesentError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Length of a platform video identifier
pub const VIDEO_ID_LEN: usize = 11;

// `v=` query parameter or a path segment, followed by the 11-char token
static VIDEO_ID_IN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("video id pattern is valid")
});

static BARE_VIDEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("bare id pattern is valid"));

/// Extract the first video identifier found in `input`
///
/// Accepts watch URLs (`?v=`), short links and any other URL where a path
/// segment starts with the identifier. A bare identifier is accepted as-is.
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(caps) = VIDEO_ID_IN_URL.captures(input) {
        return Ok(caps[1].to_string());
    }

    if BARE_VIDEO_ID.is_match(input) {
        return Ok(input.to_string());
    }

    Err(TubesentError::InvalidInput(format!(
        "no video identifier found in '{}'",
        input
    )))
}
