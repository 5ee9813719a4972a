//! URL helpers
//!
//! Builders for watch-page and asset URLs, plus the id-normalization regexes
//! used when callers hand in raw ids or full links.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{LivetubeError, Result};

/// Root of the public site
pub const YT_ROOT: &str = "https://www.youtube.com";

static VIDEO_ID_FROM_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("valid id regex"));

static VIDEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9A-Za-z_-]{11})").expect("valid id regex"));

static CHANNEL_ID_FROM_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/)(UC[\w-]{21}[AQgw])").expect("valid id regex"));

static CHANNEL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(UC[\w-]{21}[AQgw])").expect("valid id regex"));

static REDIRECT_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://www\.youtube\.com/redirect\?[\w+_&=]+&q=(.+)").expect("valid redirect regex")
});

/// Builds the watch page URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("{YT_ROOT}/watch?v={video_id}")
}

/// Builds the short-link URL for a video id
pub fn short_url(video_id: &str) -> String {
    format!("https://youtu.be/{video_id}")
}

/// Builds the community tab URL for a channel id
pub fn channel_community_url(channel_id: &str) -> String {
    format!("{YT_ROOT}/channel/{channel_id}/community")
}

/// Normalizes a video id from a raw id or any watch/short/embed URL
///
/// # Errors
/// Returns `InvalidId` when no 11-character id can be found
pub fn extract_video_id(input: &str) -> Result<String> {
    let pattern = if input.starts_with("http") {
        &VIDEO_ID_FROM_URL
    } else {
        &VIDEO_ID
    };
    pattern
        .captures(input)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| LivetubeError::InvalidId(input.to_string()))
}

/// Normalizes a channel id from a raw id or a channel URL
///
/// # Errors
/// Returns `InvalidId` when no `UC…` id can be found
pub fn extract_channel_id(input: &str) -> Result<String> {
    let pattern = if input.starts_with("http") {
        &CHANNEL_ID_FROM_URL
    } else {
        &CHANNEL_ID
    };
    pattern
        .captures(input)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| LivetubeError::InvalidId(input.to_string()))
}

/// Resolves the player JS asset URL from a player configuration object
///
/// The path lives under `PLAYER_JS_URL` in current pages and under
/// `assets.js` in older ones.
pub fn player_js_url(config: &Value) -> Option<String> {
    let path = config["PLAYER_JS_URL"]
        .as_str()
        .or_else(|| config["assets"]["js"].as_str())?;
    if path.starts_with("http") {
        Some(path.to_string())
    } else {
        Some(format!("{YT_ROOT}{path}"))
    }
}

/// Unwraps a `/redirect?...&q=` interstitial link to its target
///
/// Returns the input unchanged when it is not a redirect link.
pub fn unwrap_redirect(url: &str) -> String {
    if let Some(caps) = REDIRECT_TARGET.captures(url)
        && let Some(target) = caps.get(1)
    {
        return urlencoding::decode(target.as_str())
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| target.as_str().to_string());
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(short_url("dQw4w9WgXcQ"), "https://youtu.be/dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_video_id_raw() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_video_id_from_watch_url() {
        let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_video_id_from_short_url() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_video_id_invalid() {
        assert!(matches!(
            extract_video_id("short"),
            Err(LivetubeError::InvalidId(_))
        ));
    }

    #[test]
    fn test_extract_channel_id_raw() {
        let id = extract_channel_id("UCqm3BQLlJfvkTsX_hvm0UmA").unwrap();
        assert_eq!(id, "UCqm3BQLlJfvkTsX_hvm0UmA");
    }

    #[test]
    fn test_extract_channel_id_from_url() {
        let id =
            extract_channel_id("https://www.youtube.com/channel/UCqm3BQLlJfvkTsX_hvm0UmA").unwrap();
        assert_eq!(id, "UCqm3BQLlJfvkTsX_hvm0UmA");
    }

    #[test]
    fn test_extract_channel_id_invalid() {
        assert!(extract_channel_id("not-a-channel").is_err());
    }

    #[test]
    fn test_player_js_url_current_form() {
        let config = json!({"PLAYER_JS_URL": "/s/player/abc123/base.js"});
        assert_eq!(
            player_js_url(&config).unwrap(),
            "https://www.youtube.com/s/player/abc123/base.js"
        );
    }

    #[test]
    fn test_player_js_url_legacy_assets_form() {
        let config = json!({"assets": {"js": "/yts/jsbin/player/base.js"}});
        assert_eq!(
            player_js_url(&config).unwrap(),
            "https://www.youtube.com/yts/jsbin/player/base.js"
        );
    }

    #[test]
    fn test_player_js_url_missing() {
        assert_eq!(player_js_url(&json!({})), None);
    }

    #[test]
    fn test_unwrap_redirect() {
        let url = "https://www.youtube.com/redirect?event=live&q=https%3A%2F%2Fexample.com%2Fpage";
        assert_eq!(unwrap_redirect(url), "https://example.com/page");
    }

    #[test]
    fn test_unwrap_redirect_passthrough() {
        let url = "https://example.com/direct";
        assert_eq!(unwrap_redirect(url), url);
    }
}
