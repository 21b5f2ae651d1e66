//! The result envelope returned by every format.

use std::fmt;

use serde::Serialize;

use crate::entry::{Data, Entry};
use crate::{PostscopeError, Result};

/// Message used when the feed parser gives no description of its own.
pub const DEFAULT_FEED_ERROR: &str = "The feed could not be parsed";

/// Wire-level error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The body is not a well-formed feed.
    InvalidXml,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidXml => "invalid_xml",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of parsing one retrieved resource.
///
/// Serializes either as `{data, url, source-format, code}` or as
/// `{error, error_description}`, never a mix of both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParseResult {
    Parsed {
        data: Data,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(rename = "source-format", skip_serializing_if = "Option::is_none")]
        source_format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<u16>,
    },
    Failed {
        error: ErrorKind,
        error_description: String,
    },
}

impl ParseResult {
    /// `{data: {type: "unknown"}}`, for resources no format recognized.
    pub fn unknown() -> Self {
        ParseResult::Parsed { data: Data::Unknown, url: None, source_format: None, code: None }
    }

    /// An `invalid_xml` failure describing `err`.
    pub fn invalid_xml(err: &PostscopeError) -> Self {
        let description = match err {
            PostscopeError::InvalidFeed(message) => message.trim().to_string(),
            other => other.to_string(),
        };

        let error_description = if description.is_empty() { DEFAULT_FEED_ERROR.to_string() } else { description };

        ParseResult::Failed { error: ErrorKind::InvalidXml, error_description }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ParseResult::Failed { .. })
    }

    /// The `data` member, if parsing succeeded.
    pub fn data(&self) -> Option<&Data> {
        match self {
            ParseResult::Parsed { data, .. } => Some(data),
            ParseResult::Failed { .. } => None,
        }
    }

    /// Entries of a parsed feed; empty for anything else.
    pub fn items(&self) -> &[Entry] {
        match self.data() {
            Some(Data::Feed(feed)) => &feed.items,
            _ => &[],
        }
    }

    /// Serialize to JSON, optionally pretty printed.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty { serde_json::to_string_pretty(self)? } else { serde_json::to_string(self)? };
        Ok(json)
    }
}
