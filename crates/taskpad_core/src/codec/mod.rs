//! Document codecs exchanged with the host.
//!
//! # Responsibility
//! - Parse initial content and serialize documents for host sync.
//!
//! # Invariants
//! - Every decoded document passes the schema check.

pub mod html;
pub mod json;

pub use html::{parse_html, to_html, HtmlParseError};
pub use json::{from_json, to_json, JsonError};
