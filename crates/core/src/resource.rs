//! Already-retrieved input records.
//!
//! Fetching is left to callers; this module only wraps bytes they already
//! have, or reads them from a local file or a reader such as stdin.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{PostscopeError, Result};

/// Status code assumed for input that did not come from an HTTP response.
pub const LOCAL_STATUS_CODE: u16 = 200;

/// A fetched resource: where it came from, the HTTP status, and the raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedResource {
    url: String,
    status_code: u16,
    body: Vec<u8>,
}

impl RetrievedResource {
    pub fn new(url: impl Into<String>, status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { url: url.into(), status_code, body: body.into() }
    }

    /// Reads a resource from a local file.
    ///
    /// `url` is recorded as the resource's origin; when absent, the file's
    /// `file://` URL is used if the path can be made absolute.
    pub fn from_file(path: impl AsRef<Path>, url: Option<&str>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PostscopeError::FileNotFound(PathBuf::from(path)));
        }

        let body = fs::read(path)?;
        let url = match url {
            Some(url) => url.to_string(),
            None => fs::canonicalize(path)
                .ok()
                .and_then(|abs| url::Url::from_file_path(abs).ok())
                .map(|u| u.to_string())
                .unwrap_or_default(),
        };

        Ok(Self::new(url, LOCAL_STATUS_CODE, body))
    }

    /// Reads a resource from any reader until EOF.
    pub fn from_reader(mut reader: impl Read, url: &str) -> Result<Self> {
        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        Ok(Self::new(url, LOCAL_STATUS_CODE, body))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
