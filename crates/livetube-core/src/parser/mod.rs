//! Parsers for embedded page data
//!
//! Contains the brace-matching object parser, the inline script extractor and
//! the page-level anchors built on top of them.

pub mod object;
pub mod player;
pub mod scripts;

pub use object::{parse_object_after, parse_object_at};
pub use player::{initial_data, player_config, player_response};
pub use scripts::inline_scripts;
