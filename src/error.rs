//! Structured error types for the quire layout engine.
//!
//! Only unrecoverable conditions live here. Cosmetic fallbacks (an unknown
//! color, a selector we can't match) are absorbed where they happen and never
//! reach the caller.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// The unified error type returned by all public quire API functions.
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The drawing surface refused an operation (page allocation, glyph,
    /// line, or image emission). The render cannot continue.
    #[error("canvas error: {0}")]
    Canvas(String),

    /// An image could not be read or decoded.
    #[error("image error for '{src}': {reason}")]
    Image { src: String, reason: String },

    /// A dimension string carried a unit suffix we don't understand.
    #[error("unsupported unit '{unit}' in dimension '{input}'")]
    UnsupportedUnit { input: String, unit: String },

    /// A dimension string had no parseable number.
    #[error("malformed dimension '{0}'")]
    MalformedDimension(String),

    /// Pixel conversion needs a positive DPI.
    #[error("invalid DPI {0}: must be greater than zero")]
    InvalidDpi(f64),

    /// A closing element had no resolved style on itself or any ancestor.
    /// Enter/exit events were unbalanced.
    #[error("no resolved style for closing <{tag}> (node {node})")]
    MissingStyle { node: usize, tag: String },

    /// Tables and lists don't nest inside each other (or themselves).
    #[error("<{inner}> cannot be nested inside <{outer}>")]
    NestedStructure { outer: String, inner: String },

    /// A table operation was called out of order.
    #[error("table is in the {found} phase, expected {expected}")]
    TableState {
        expected: &'static str,
        found: &'static str,
    },

    /// Reading a stylesheet or markup file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON input failed to parse as a valid quire document.
    #[error("failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the document schema. Check block types and field names.".to_string()
            }
            serde_json::error::Category::Eof => "Unexpected end of input. Is the JSON truncated?".to_string(),
            serde_json::error::Category::Io => String::new(),
        };
        LayoutError::Parse { source: e, hint }
    }
}
