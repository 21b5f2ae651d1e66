//! Error types for postscope operations.
//!
//! This module defines the main error type [`PostscopeError`]. Most of the
//! pipeline never surfaces errors: malformed markup degrades to partial output
//! and a broken feed becomes an `invalid_xml` [`ParseResult`](crate::ParseResult).
//! The variants here cover the remaining fallible APIs: policy construction,
//! loading local input, and serializing results.
//!
//! # Example
//!
//! ```rust
//! use postscope_core::{SanitizeConfig, Sanitizer};
//!
//! let sanitizer = Sanitizer::new(SanitizeConfig::default())?;
//! assert_eq!(sanitizer.sanitize("<p>Hi</p>", true, None), "<p>Hi</p>");
//! # Ok::<(), postscope_core::PostscopeError>(())
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for normalization operations.
#[derive(Error, Debug)]
pub enum PostscopeError {
    /// The body could not be parsed as a syndication feed.
    ///
    /// Carries the underlying parser's message; the parser's own error type is
    /// never exposed.
    #[error("Invalid feed: {0}")]
    InvalidFeed(String),

    /// Sanitizer or registry configuration could not be built.
    ///
    /// Returned when the embed provider safelist does not compile.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O errors while reading local input.
    #[error("Failed to read input: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON serialization errors.
    #[error("Failed to serialize result: {0}")]
    SerializeError(#[from] serde_json::Error),
}

impl From<feed_rs::parser::ParseFeedError> for PostscopeError {
    fn from(err: feed_rs::parser::ParseFeedError) -> Self {
        PostscopeError::InvalidFeed(err.to_string())
    }
}

/// Result type alias for PostscopeError.
pub type Result<T> = std::result::Result<T, PostscopeError>;
