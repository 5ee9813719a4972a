//! YouTube Live Extraction Core Library
//!
//! Client-side extraction over the platform's internal web endpoints: watch
//! pages are fetched and mined for their embedded JSON trees, stream
//! manifests are turned into playable URLs, and protected formats have their
//! rotating signature cipher reversed from the player script.
//!
//! # Overview
//!
//! Two components carry the weight:
//! - A **path query engine** ([`query`]) for navigating the deeply nested,
//!   loosely-typed response trees without modelling their exact shape.
//! - A **cipher resolver** ([`cipher`], cached per script URL by
//!   [`CipherCache`]) that decompiles the signature-descrambling program out
//!   of the player JS asset and replays it to reconstruct signed URLs.
//!
//! Feeding both are the embedded-object parsers ([`parser`]): an inline
//! script extractor and a brace-matching object parser tolerant of the
//! relaxed literals the pages emit.
//!
//! # Example
//!
//! ```no_run
//! use livetube_core::{Extractor, Result};
//! use livetube_core::query::query;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let extractor = Extractor::new()?;
//!
//!     let page = extractor.watch_page("dQw4w9WgXcQ").await?;
//!
//!     // Navigate the raw trees with path patterns
//!     let title = query(&page.player_response, "videoDetails/title")?;
//!     println!("title: {:?}", title.first());
//!
//!     // Resolve the manifest into playable URLs (descrambling as needed)
//!     for stream in extractor.playable_streams(&page).await? {
//!         println!("{}: {}", stream.format.itag, stream.url);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Shape drift
//!
//! The upstream response shapes are undocumented and change without notice.
//! Absence of a path is therefore a routine query outcome, not an error —
//! see [`query::Match`]. Errors are reserved for transport failures,
//! structural parse failures and upstream error payloads.

pub mod cache;
pub mod cipher;
mod client;
mod error;
pub mod parser;
pub mod query;
pub mod streams;
mod types;
pub mod url;

mod extractor;

// Re-export client types
pub use client::{ApiConfig, ClientConfig, YoutubeClient};

// Re-export error types
pub use error::{LivetubeError, Result};

// Re-export the cipher resolver
pub use cache::CipherCache;
pub use cipher::Cipher;

// Re-export the query engine result type
pub use query::{Match, search_key};

// Re-export the high-level API
pub use extractor::Extractor;

// Re-export data types
pub use types::{PlayableStream, StreamFormat, WatchPage};
