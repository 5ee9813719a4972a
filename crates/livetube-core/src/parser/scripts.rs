//! Inline script extraction
//!
//! The interesting payloads (`ytInitialData`, `ytInitialPlayerResponse`,
//! `ytcfg.set`) live in inline `<script>` bodies of the watch page. External
//! scripts (`src` attribute) are skipped, as are the short `if (...)` guard
//! snippets the page always carries.

use scraper::{Html, Selector};

use crate::error::{LivetubeError, Result};

/// Returns the inline script bodies of a page in document order
///
/// # Arguments
/// * `html` - Raw markup text
///
/// # Returns
/// One string per inline `<script>` element, excluding external scripts and
/// guard snippets starting with the token `if`
///
/// # Errors
/// Returns `ParseError` only if the selector fails to compile
pub fn inline_scripts(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script")
        .map_err(|e| LivetubeError::ParseError(format!("Invalid selector: {e:?}")))?;

    let mut scripts = Vec::new();
    for element in document.select(&selector) {
        if element.value().attr("src").is_some() {
            continue;
        }
        let body: String = element.text().collect();
        if body.is_empty() || body.starts_with("if") {
            continue;
        }
        scripts.push(body);
    }

    Ok(scripts)
}
