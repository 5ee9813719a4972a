//! Stream format resolution
//!
//! Collects format descriptors from a player response and reconstructs
//! playable URLs. Protected formats carry a `signatureCipher` descriptor — a
//! query string of the form `s=<ciphered>&sp=<param>&url=<base>` — whose
//! decoded signature must be spliced back onto the base URL before the format
//! is usable.

use serde_json::Value;
use tracing::warn;

use crate::cipher::Cipher;
use crate::error::{LivetubeError, Result};
use crate::query::query;
use crate::types::{PlayableStream, StreamFormat};

/// Parts of a `signatureCipher` descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParts {
    /// The ciphered signature token
    pub s: String,
    /// Query parameter name the decoded signature goes under
    pub sp: String,
    /// Base playback URL
    pub url: String,
}

/// Collects every format descriptor from a player response
///
/// Reads both the `formats` and `adaptiveFormats` arrays under
/// `streamingData`; nodes missing their identifying fields are skipped with a
/// warning rather than failing the whole manifest.
pub fn formats(player_response: &Value) -> Vec<StreamFormat> {
    let mut collected = Vec::new();
    for list in ["streamingData/formats", "streamingData/adaptiveFormats"] {
        let Some(nodes) = query(player_response, list)
            .ok()
            .and_then(|m| m.first())
            .and_then(|node| node.as_array())
        else {
            continue;
        };
        for node in nodes {
            match StreamFormat::from_value(node) {
                Some(format) => collected.push(format),
                None => warn!("skipping format node without itag/mimeType"),
            }
        }
    }
    collected
}

/// The HLS manifest URL of a live stream, where present
pub fn hls_manifest_url(player_response: &Value) -> Option<String> {
    query(player_response, "streamingData/hlsManifestUrl")
        .ok()
        .and_then(|m| m.first())
        .and_then(|node| node.as_str())
        .map(|s| s.to_string())
}

/// Splits a `signatureCipher` query string into its parts
///
/// # Errors
/// Returns `CipherUnresolvable` when the descriptor lacks `s` or `url` — a
/// format without them can never be made playable
pub fn parse_signature_cipher(descriptor: &str) -> Result<SignatureParts> {
    let mut s = None;
    let mut sp = None;
    let mut url = None;

    for pair in descriptor.split('&') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let decoded = urlencoding::decode(value)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match name {
            "s" => s = Some(decoded),
            "sp" => sp = Some(decoded),
            "url" => url = Some(decoded),
            _ => {}
        }
    }

    match (s, url) {
        (Some(s), Some(url)) => Ok(SignatureParts {
            s,
            sp: sp.unwrap_or_else(|| "signature".to_string()),
            url,
        }),
        _ => Err(LivetubeError::CipherUnresolvable(
            "signature descriptor missing s= or url=".to_string(),
        )),
    }
}

/// Reconstructs the playable URL of a format
///
/// Unprotected formats pass their URL through; protected ones have their
/// signature decoded with `cipher` and spliced onto the base URL under the
/// descriptor's parameter name.
///
/// # Errors
/// Returns `CipherUnresolvable` when the descriptor is malformed or the
/// format carries neither a URL nor a cipher descriptor
pub fn resolve_format_url(format: &StreamFormat, cipher: &Cipher) -> Result<String> {
    if let Some(url) = &format.url {
        return Ok(url.clone());
    }

    let Some(descriptor) = &format.signature_cipher else {
        return Err(LivetubeError::CipherUnresolvable(format!(
            "format {} has neither url nor signatureCipher",
            format.itag
        )));
    };

    let parts = parse_signature_cipher(descriptor)?;
    let signature = cipher.decode(&parts.s);
    let separator = if parts.url.contains('?') { '&' } else { '?' };
    Ok(format!(
        "{}{}{}={}",
        parts.url, separator, parts.sp, signature
    ))
}

/// Wraps a format with its resolved URL
pub fn resolve_stream(format: StreamFormat, cipher: &Cipher) -> Result<PlayableStream> {
    let url = resolve_format_url(&format, cipher)?;
    Ok(PlayableStream { format, url })
}

/// The audio format with the highest bitrate
pub fn best_audio(formats: &[StreamFormat]) -> Option<&StreamFormat> {
    formats
        .iter()
        .filter(|f| f.is_audio())
        .max_by_key(|f| f.bitrate.unwrap_or(0))
}

/// The video format with the best combined resolution and frame rate
pub fn best_video(formats: &[StreamFormat]) -> Option<&StreamFormat> {
    let mut best: Option<&StreamFormat> = None;
    for format in formats.iter().filter(|f| f.is_video()) {
        let better = match best {
            None => true,
            Some(current) => {
                format.width.unwrap_or(0) >= current.width.unwrap_or(0)
                    && format.height.unwrap_or(0) >= current.height.unwrap_or(0)
                    && format.fps.unwrap_or(0) >= current.fps.unwrap_or(0)
            }
        };
        if better {
            best = Some(format);
        }
    }
    best
}
