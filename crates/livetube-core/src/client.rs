//! HTTP transport and API descriptor
//!
//! Thin reqwest wrapper used by the extractor: session cookies, the default
//! browser-like headers the upstream expects, and translation of upstream
//! error payloads into explicit errors. Retry and backoff policy is left to
//! the embedding application; requests here are single attempts bounded by
//! the configured timeout.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{LivetubeError, Result};
use crate::url::YT_ROOT;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.72 Safari/537.36";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// User-Agent header sent on every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// The currently known internal API descriptor
///
/// Filled from the `ytcfg.set({...})` object of a fetched page; the defaults
/// below are the documented fallbacks used before any page has been seen.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub key: String,
    pub version: String,
    pub client_name: String,
    pub client_version: String,
    pub browser_name: String,
    pub browser_version: String,
    pub context_client_name: i64,
    pub context_client_version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            version: "v1".to_string(),
            client_name: "WEB".to_string(),
            client_version: "2.20770101.00.00".to_string(),
            browser_name: "Chrome".to_string(),
            browser_version: "90.0.4430.72".to_string(),
            context_client_name: 1,
            context_client_version: "2.20770101.00.00".to_string(),
        }
    }
}

impl ApiConfig {
    /// True once an API key has been learned from a page
    pub fn is_ready(&self) -> bool {
        !self.key.is_empty()
    }

    /// Builds the endpoint URL for an API operation, e.g. `player/heartbeat`
    pub fn endpoint_url(&self, operation: &str) -> String {
        format!(
            "{YT_ROOT}/youtubei/{}/{}?key={}",
            self.version, operation, self.key
        )
    }

    /// The `context.client` object sent with every API request body
    pub fn client_context(&self) -> Value {
        json!({
            "hl": "en_US",
            "browserName": self.browser_name,
            "browserVersion": self.browser_version,
            "clientName": self.context_client_name,
            "clientVersion": self.context_client_version,
        })
    }

    /// Updates the descriptor from a page's player configuration object
    ///
    /// Unknown or missing fields keep their current values.
    pub fn update_from_config(&mut self, config: &Value) {
        update_string(&mut self.key, &config["INNERTUBE_API_KEY"]);
        update_string(&mut self.version, &config["INNERTUBE_API_VERSION"]);
        update_string(&mut self.client_name, &config["INNERTUBE_CLIENT_NAME"]);
        update_string(&mut self.client_version, &config["INNERTUBE_CLIENT_VERSION"]);

        let browser = &config["INNERTUBE_CONTEXT"]["client"];
        update_string(&mut self.browser_name, &browser["browserName"]);
        update_string(&mut self.browser_version, &browser["browserVersion"]);

        if let Some(name) = config["INNERTUBE_CONTEXT_CLIENT_NAME"].as_i64() {
            self.context_client_name = name;
        }
        update_string(
            &mut self.context_client_version,
            &config["INNERTUBE_CONTEXT_CLIENT_VERSION"],
        );
    }
}

fn update_string(slot: &mut String, value: &Value) {
    if let Some(s) = value.as_str()
        && !s.is_empty()
    {
        *slot = s.to_string();
    }
}

/// HTTP client with session cookies and upstream-error translation
pub struct YoutubeClient {
    http: reqwest::Client,
    cookies: Mutex<BTreeMap<String, String>>,
    api: Mutex<ApiConfig>,
}

impl YoutubeClient {
    /// Creates a client with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with a custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent)
            .cookie_store(true)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    "X-Origin",
                    reqwest::header::HeaderValue::from_static(YT_ROOT),
                );
                headers
            })
            .build()
            .map_err(LivetubeError::HttpError)?;

        // The language cookie pins the upstream to stable English shapes
        let mut cookies = BTreeMap::new();
        cookies.insert("PREF".to_string(), "hl=en".to_string());

        Ok(Self {
            http,
            cookies: Mutex::new(cookies),
            api: Mutex::new(ApiConfig::default()),
        })
    }

    /// Replaces the session cookies, keeping the language pin
    pub fn set_cookies(&self, cookies: BTreeMap<String, String>) {
        let mut guard = lock(&self.cookies);
        *guard = cookies;
        guard.insert("PREF".to_string(), "hl=en".to_string());
    }

    /// A snapshot of the current API descriptor
    pub fn api(&self) -> ApiConfig {
        lock(&self.api).clone()
    }

    /// Updates the API descriptor from a page's player configuration object
    ///
    /// Whichever concurrent fetch completes first wins; later updates simply
    /// overwrite with equivalent data.
    pub fn update_api(&self, config: &Value) {
        lock(&self.api).update_from_config(config);
    }

    /// Fetches a URL as text
    ///
    /// # Errors
    /// - `HttpError` for transport failures
    /// - `ApiError` for non-success statuses, with the upstream error payload
    ///   decoded when the body carries one
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url, "fetching text");
        let response = self
            .http
            .get(url)
            .header("Cookie", self.cookie_header())
            .send()
            .await
            .map_err(LivetubeError::HttpError)?;

        let status = response.status();
        let body = response.text().await.map_err(LivetubeError::HttpError)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(body)
    }

    /// POSTs a JSON body and decodes the JSON response
    ///
    /// An `error` object embedded in an otherwise well-formed payload is
    /// translated into [`LivetubeError::ApiError`] rather than returned as
    /// data.
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        debug!(url, "posting json");
        let response = self
            .http
            .post(url)
            .header("Cookie", self.cookie_header())
            .json(body)
            .send()
            .await
            .map_err(LivetubeError::HttpError)?;

        let status = response.status();
        let text = response.text().await.map_err(LivetubeError::HttpError)?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| LivetubeError::ParseError(format!("invalid JSON response: {e}")))?;
        if let Some(error) = embedded_api_error(&value) {
            return Err(error);
        }
        Ok(value)
    }

    fn cookie_header(&self) -> String {
        lock(&self.cookies)
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Decodes an upstream `{"error": {...}}` payload into an explicit error
fn embedded_api_error(value: &Value) -> Option<LivetubeError> {
    let error = value.as_object()?.get("error")?;
    let code = error["status"]
        .as_str()
        .map(|s| s.to_string())
        .or_else(|| error["code"].as_i64().map(|c| c.to_string()))?;
    let message = error["message"].as_str().unwrap_or("").to_string();
    Some(LivetubeError::ApiError { code, message })
}

fn status_error(status: reqwest::StatusCode, body: &str) -> LivetubeError {
    if let Ok(value) = serde_json::from_str::<Value>(body)
        && let Some(error) = embedded_api_error(&value)
    {
        return error;
    }
    LivetubeError::ApiError {
        code: status.as_u16().to_string(),
        message: body.chars().take(200).collect(),
    }
}
