//! Core data types
//!
//! Stream format descriptors mapped from the player response, and the
//! watch-page bundle returned by the extractor. Raw response trees stay
//! `serde_json::Value` — callers navigate them with the query engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stream format descriptor from the player response
///
/// Exactly one of `url` and `signature_cipher` is populated for real
/// descriptors: protected formats carry the ciphered form instead of a
/// playable URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamFormat {
    /// Format identifier assigned by the platform
    pub itag: i64,

    /// Full mime type, e.g. `video/mp4; codecs="avc1.4d401f"`
    pub mime_type: String,

    /// Bits per second, where reported
    pub bitrate: Option<u64>,

    /// Video width in pixels
    pub width: Option<u32>,

    /// Video height in pixels
    pub height: Option<u32>,

    /// Frames per second
    pub fps: Option<u32>,

    /// Human-readable quality label, e.g. "1080p60"
    pub quality_label: Option<String>,

    /// Audio sample rate in Hz, where reported
    pub audio_sample_rate: Option<u64>,

    /// Directly playable URL (unprotected formats)
    pub url: Option<String>,

    /// Query-string-encoded cipher descriptor (protected formats)
    pub signature_cipher: Option<String>,
}

impl StreamFormat {
    /// Maps a format node from the player response
    ///
    /// Returns `None` when the node lacks the identifying fields.
    pub fn from_value(node: &Value) -> Option<Self> {
        let itag = node["itag"].as_i64()?;
        let mime_type = node["mimeType"].as_str()?.to_string();

        Some(Self {
            itag,
            mime_type,
            bitrate: node["bitrate"].as_u64(),
            width: node["width"].as_u64().map(|w| w as u32),
            height: node["height"].as_u64().map(|h| h as u32),
            fps: node["fps"].as_u64().map(|f| f as u32),
            quality_label: node["qualityLabel"].as_str().map(|s| s.to_string()),
            audio_sample_rate: node["audioSampleRate"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .or_else(|| node["audioSampleRate"].as_u64()),
            url: node["url"].as_str().map(|s| s.to_string()),
            signature_cipher: node["signatureCipher"]
                .as_str()
                .or_else(|| node["cipher"].as_str())
                .map(|s| s.to_string()),
        })
    }

    /// True when the format carries a ciphered signature instead of a URL
    pub fn is_ciphered(&self) -> bool {
        self.url.is_none() && self.signature_cipher.is_some()
    }

    /// True for audio-only formats
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio")
    }

    /// True for formats carrying a video track
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video")
    }
}

/// A format with its final, playable URL resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayableStream {
    pub format: StreamFormat,
    pub url: String,
}

/// Raw trees extracted from a watch page
///
/// `player_response` is the stream manifest source; `initial_data` carries
/// the render-time metadata. Both are handed to callers untyped for query
/// navigation.
#[derive(Debug, Clone)]
pub struct WatchPage {
    pub video_id: String,
    pub player_response: Value,
    pub initial_data: Value,
    /// Player JS asset owning the cipher for this page's protected formats
    pub js_url: Option<String>,
}
