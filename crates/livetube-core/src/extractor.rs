//! High-level extraction API
//!
//! Ties the pieces together: fetch a watch page, pull the embedded trees out
//! of its scripts, and turn the stream manifest into playable URLs, resolving
//! ciphered signatures through the per-script program cache.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::CipherCache;
use crate::cipher::Cipher;
use crate::client::{ClientConfig, YoutubeClient};
use crate::error::{LivetubeError, Result};
use crate::types::{PlayableStream, WatchPage};
use crate::{parser, streams, url};

/// Watch-page extractor with a session-owned cipher cache
///
/// The cache can be shared across extractors via [`Extractor::with_cache`];
/// by default each extractor owns an isolated one.
pub struct Extractor {
    client: YoutubeClient,
    cipher_cache: Arc<CipherCache>,
}

impl Extractor {
    /// Creates an extractor with default configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates an extractor with a custom client configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_cache(config, Arc::new(CipherCache::new()))
    }

    /// Creates an extractor sharing an existing cipher cache
    pub fn with_cache(config: ClientConfig, cache: Arc<CipherCache>) -> Result<Self> {
        let client = YoutubeClient::with_config(config)?;
        Ok(Self {
            client,
            cipher_cache: cache,
        })
    }

    /// The underlying HTTP client (cookies, API descriptor)
    pub fn client(&self) -> &YoutubeClient {
        &self.client
    }

    /// Downloads and parses the watch page of a video
    ///
    /// # Arguments
    /// * `video` - A video id or any watch/short URL containing one
    ///
    /// # Errors
    /// - `InvalidId` for an unrecognizable video reference
    /// - `HttpError` / `ApiError` for transport failures
    /// - `RegexMatchError` / `ParseError` when the page carries none of the
    ///   known embedded objects
    pub async fn watch_page(&self, video: &str) -> Result<WatchPage> {
        let video_id = url::extract_video_id(video)?;
        info!(video_id, "downloading watch page");
        let html = self.client.fetch_text(&url::watch_url(&video_id)).await?;
        self.parse_watch_page(&video_id, &html)
    }

    /// Parses already-fetched watch page markup
    ///
    /// Useful when the embedding application brings its own transport. Also
    /// updates the session API descriptor from the page's configuration
    /// object.
    pub fn parse_watch_page(&self, video_id: &str, html: &str) -> Result<WatchPage> {
        let scripts = parser::inline_scripts(html)?;

        let config = parser::player_config(&scripts)?;
        self.client.update_api(&config);
        let js_url = url::player_js_url(&config);

        let player_response = parser::player_response(&scripts)?;
        let initial_data = parser::initial_data(&scripts)?;

        Ok(WatchPage {
            video_id: video_id.to_string(),
            player_response,
            initial_data,
            js_url,
        })
    }

    /// Resolves the page's stream manifest into playable URLs
    ///
    /// Unprotected formats pass straight through. Protected formats are
    /// descrambled with the program of the page's player script, which is
    /// downloaded once per distinct script URL and cached. Individually
    /// malformed descriptors are skipped with a warning; an unreachable or
    /// undecompilable script fails the call, since every protected format
    /// depends on it.
    ///
    /// # Errors
    /// Returns `CipherUnresolvable` when protected formats exist but the
    /// owning script is unknown, unreachable, or cannot be decompiled
    pub async fn playable_streams(&self, page: &WatchPage) -> Result<Vec<PlayableStream>> {
        let formats = streams::formats(&page.player_response);

        let cipher = if formats.iter().any(|f| f.is_ciphered()) {
            let js_url = page.js_url.as_deref().ok_or_else(|| {
                LivetubeError::CipherUnresolvable(
                    "page carries ciphered formats but no player script url".to_string(),
                )
            })?;
            Some(self.cipher_for(js_url).await?)
        } else {
            None
        };

        let mut resolved = Vec::new();
        for format in formats {
            if format.is_ciphered() {
                let Some(cipher) = cipher.as_deref() else {
                    continue;
                };
                match streams::resolve_stream(format, cipher) {
                    Ok(stream) => resolved.push(stream),
                    Err(e) => warn!(error = %e, "skipping unresolvable format"),
                }
            } else if let Some(playable) = format.url.clone() {
                resolved.push(PlayableStream {
                    format,
                    url: playable,
                });
            } else {
                warn!(
                    itag = format.itag,
                    "skipping format with neither url nor cipher descriptor"
                );
            }
        }
        Ok(resolved)
    }

    /// Returns the descrambling program for a player script URL
    ///
    /// Downloads and decompiles the script on the first request, then serves
    /// the cached program. A failed resolution is not cached, so the next
    /// request retries from scratch.
    async fn cipher_for(&self, js_url: &str) -> Result<Arc<Cipher>> {
        if let Some(cached) = self.cipher_cache.get(js_url) {
            return Ok(cached);
        }

        info!(js_url, "downloading player script");
        let js = self
            .client
            .fetch_text(js_url)
            .await
            .map_err(|e| LivetubeError::CipherUnresolvable(format!("{js_url}: {e}")))?;
        let cipher = Cipher::from_js(&js)
            .map_err(|e| LivetubeError::CipherUnresolvable(format!("{js_url}: {e}")))?;
        Ok(self.cipher_cache.insert(js_url.to_string(), cipher))
    }
}
