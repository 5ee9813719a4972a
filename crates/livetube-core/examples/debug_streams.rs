//! Debug script to inspect stream resolution for a video
//!
//! Run with: cargo run --example debug_streams -p livetube-core -- <video id or url>

use livetube_core::query::query;
use livetube_core::{Extractor, streams};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let video = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dQw4w9WgXcQ".to_string());

    let extractor = Extractor::new()?;

    println!("Fetching watch page for {video}...\n");
    let page = extractor.watch_page(&video).await?;

    if let Ok(title) = query(&page.player_response, "videoDetails/title") {
        println!("Title:  {:?}", title.first());
    }
    if let Ok(status) = query(&page.player_response, "playabilityStatus/status") {
        println!("Status: {:?}", status.first());
    }
    println!("Player JS: {:?}\n", page.js_url);

    if let Some(hls) = streams::hls_manifest_url(&page.player_response) {
        println!("HLS manifest: {hls}\n");
    }

    match extractor.playable_streams(&page).await {
        Ok(resolved) => {
            println!("Resolved {} formats:\n", resolved.len());
            for stream in &resolved {
                let ciphered = if stream.format.signature_cipher.is_some() {
                    " (descrambled)"
                } else {
                    ""
                };
                println!(
                    "itag {:>3} {}{}",
                    stream.format.itag, stream.format.mime_type, ciphered
                );
                println!("    {}\n", stream.url);
            }
        }
        Err(e) => {
            println!("✗ Failed to resolve streams: {e}");
        }
    }

    Ok(())
}
