//! Page-level object anchors
//!
//! Locates the well-known objects embedded in watch-page scripts. Each
//! extractor tries a list of known anchor patterns against every script before
//! giving up — the page markup rotates between variants over time.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{LivetubeError, Result};
use crate::parser::object::parse_object_after;

static INITIAL_DATA_ANCHORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"window\[['"]ytInitialData['"]]\s*=\s*"#).expect("valid anchor regex"),
        Regex::new(r"ytInitialData\s*=\s*").expect("valid anchor regex"),
    ]
});

static PLAYER_RESPONSE_ANCHORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(r"ytInitialPlayerResponse\s*=\s*").expect("valid anchor regex")]
});

static PLAYER_CONFIG_ANCHORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"ytcfg\.set\(").expect("valid anchor regex"),
        Regex::new(r#"yt\.setConfig\(.*['"]PLAYER_CONFIG['"]:\s*"#).expect("valid anchor regex"),
    ]
});

/// Extracts the `ytInitialData` object from the page scripts
///
/// Contains the metadata used to render the page on load: video information,
/// badges, community content, etc.
///
/// # Errors
/// Returns `RegexMatchError` when no script carries the object under any
/// known anchor
pub fn initial_data(scripts: &[String]) -> Result<Value> {
    extract_first(scripts, &INITIAL_DATA_ANCHORS, "initial_data", "ytInitialData")
}

/// Extracts the `ytInitialPlayerResponse` object from the page scripts
///
/// The primary source of the stream manifest: playability status, video
/// details and streaming data.
///
/// # Errors
/// Returns `RegexMatchError` when no script carries the object
pub fn player_response(scripts: &[String]) -> Result<Value> {
    extract_first(
        scripts,
        &PLAYER_RESPONSE_ANCHORS,
        "player_response",
        "ytInitialPlayerResponse",
    )
}

/// Extracts the player configuration object (`ytcfg.set({...})`)
///
/// Carries the API key/version descriptor and the player JS asset path used
/// by the cipher resolver.
///
/// # Errors
/// Returns `RegexMatchError` when no script carries the object
pub fn player_config(scripts: &[String]) -> Result<Value> {
    extract_first(scripts, &PLAYER_CONFIG_ANCHORS, "player_config", "ytcfg.set")
}

fn extract_first(
    scripts: &[String],
    anchors: &[Regex],
    caller: &str,
    pattern: &str,
) -> Result<Value> {
    for script in scripts {
        for anchor in anchors {
            if let Ok(value) = parse_object_after(script, anchor) {
                return Ok(value);
            }
        }
    }
    Err(LivetubeError::regex_match(caller, pattern))
}
