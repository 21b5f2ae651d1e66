//! Source formats and dispatch.
//!
//! A [`Format`] decides whether it applies to a URL and turns a
//! [`RetrievedResource`] into a [`ParseResult`]. A [`FormatRegistry`] holds
//! formats in priority order (most specific first, the catch-all
//! [`FeedFormat`] last) and hands each resource to the first match.
//!
//! # Example
//!
//! ```rust
//! use postscope_core::{FormatRegistry, RetrievedResource};
//!
//! let rss = r#"<rss version="2.0"><channel><title>T</title><link>https://example.com/</link>
//!   <item><guid>1</guid><description>Hello</description></item></channel></rss>"#;
//! let resource = RetrievedResource::new("https://example.com/feed", 200, rss);
//!
//! let result = FormatRegistry::default().parse(&resource);
//! assert_eq!(result.items().len(), 1);
//! ```

pub mod feed;

use std::sync::Arc;

use tracing::debug;

use crate::post_type::{PostTypeClassifier, PostTypeDiscovery};
use crate::resource::RetrievedResource;
use crate::result::ParseResult;
use crate::sanitize::{SanitizeConfig, Sanitizer};
use crate::Result;

pub use feed::FeedFormat;

/// A source format the pipeline can normalize.
///
/// Implementations hold no mutable state and may be shared across threads.
pub trait Format: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Cheap pre-filter, typically a known-domain check.
    fn matches_host(&self, url: &str) -> bool;

    /// Stronger applicability check; catch-all formats return `true`.
    fn matches(&self, url: &str) -> bool;

    fn parse(&self, resource: &RetrievedResource) -> ParseResult;
}

/// Pick the first candidate whose host and URL checks both pass.
pub fn select<'a>(candidates: &'a [Box<dyn Format>], url: &str) -> Option<&'a dyn Format> {
    candidates
        .iter()
        .map(|format| format.as_ref())
        .find(|format| format.matches_host(url) && format.matches(url))
}

/// Ordered collection of formats.
pub struct FormatRegistry {
    formats: Vec<Box<dyn Format>>,
}

impl Default for FormatRegistry {
    /// Only the feed format, with the default sanitize policy and classifier.
    fn default() -> Self {
        Self { formats: vec![Box::new(FeedFormat::default())] }
    }
}

impl FormatRegistry {
    /// A registry that tries `formats` in exactly the given order.
    pub fn new(formats: Vec<Box<dyn Format>>) -> Self {
        Self { formats }
    }

    /// Creates a new builder for FormatRegistry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use postscope_core::{FormatRegistry, SanitizeConfig};
    ///
    /// let registry = FormatRegistry::builder()
    ///     .sanitize_config(SanitizeConfig::builder().allow_embeds(true).build())
    ///     .build()?;
    /// assert_eq!(registry.names(), vec!["feed"]);
    /// # Ok::<(), postscope_core::PostscopeError>(())
    /// ```
    pub fn builder() -> FormatRegistryBuilder {
        FormatRegistryBuilder::new()
    }

    /// Format names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.formats.iter().map(|f| f.name()).collect()
    }

    /// The format that would handle `url`, if any.
    pub fn select(&self, url: &str) -> Option<&dyn Format> {
        select(&self.formats, url)
    }

    /// Parse with the selected format, or return the unknown result.
    pub fn parse(&self, resource: &RetrievedResource) -> ParseResult {
        match self.select(resource.url()) {
            Some(format) => {
                debug!(format = format.name(), url = resource.url(), "selected format");
                format.parse(resource)
            }
            None => {
                debug!(url = resource.url(), "no format matched");
                ParseResult::unknown()
            }
        }
    }
}

/// Parse a resource with the default registry.
///
/// Equivalent to `FormatRegistry::default().parse(resource)`.
pub fn parse(resource: &RetrievedResource) -> ParseResult {
    FormatRegistry::default().parse(resource)
}

/// Builder for FormatRegistry.
///
/// Formats added with [`format`](Self::format) are tried in insertion order;
/// the feed format is always appended last as the catch-all.
pub struct FormatRegistryBuilder {
    formats: Vec<Box<dyn Format>>,
    sanitize_config: SanitizeConfig,
    classifier: Arc<dyn PostTypeClassifier>,
}

impl FormatRegistryBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { formats: Vec::new(), sanitize_config: SanitizeConfig::default(), classifier: Arc::new(PostTypeDiscovery) }
    }

    /// Adds a format ahead of the feed format.
    pub fn format(mut self, format: impl Format + 'static) -> Self {
        self.formats.push(Box::new(format));
        self
    }

    /// Sets the sanitize policy used by the feed format.
    pub fn sanitize_config(mut self, config: SanitizeConfig) -> Self {
        self.sanitize_config = config;
        self
    }

    /// Sets the post type classifier used by the feed format.
    pub fn classifier(mut self, classifier: impl PostTypeClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Builds the registry.
    ///
    /// # Errors
    ///
    /// Fails if the sanitize policy cannot be compiled.
    pub fn build(self) -> Result<FormatRegistry> {
        let sanitizer = Sanitizer::new(self.sanitize_config)?;
        let mut formats = self.formats;
        formats.push(Box::new(FeedFormat::new(sanitizer, self.classifier)));
        Ok(FormatRegistry { formats })
    }
}

impl Default for FormatRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Data, FeedResult};
    use crate::urls::host_of;

    /// Claims one host and returns an empty feed tagged with that host.
    struct HostFormat(&'static str);

    impl Format for HostFormat {
        fn name(&self) -> &str {
            self.0
        }

        fn matches_host(&self, url: &str) -> bool {
            host_of(url).is_some_and(|h| h == self.0)
        }

        fn matches(&self, _url: &str) -> bool {
            true
        }

        fn parse(&self, resource: &RetrievedResource) -> ParseResult {
            ParseResult::Parsed {
                data: Data::Feed(FeedResult::default()),
                url: Some(resource.url().to_string()),
                source_format: Some(self.0.to_string()),
                code: Some(resource.status_code()),
            }
        }
    }

    /// Matches the host but rejects every URL.
    struct PickyFormat;

    impl Format for PickyFormat {
        fn name(&self) -> &str {
            "picky"
        }

        fn matches_host(&self, _url: &str) -> bool {
            true
        }

        fn matches(&self, _url: &str) -> bool {
            false
        }

        fn parse(&self, _resource: &RetrievedResource) -> ParseResult {
            unreachable!("never selected")
        }
    }

    #[test]
    fn test_select_first_match() {
        let formats: Vec<Box<dyn Format>> = vec![
            Box::new(PickyFormat),
            Box::new(HostFormat("github.com")),
            Box::new(HostFormat("example.com")),
            Box::new(FeedFormat::default()),
        ];

        assert_eq!(select(&formats, "https://github.com/x").map(|f| f.name()), Some("github.com"));
        assert_eq!(select(&formats, "https://example.com/x").map(|f| f.name()), Some("example.com"));
        assert_eq!(select(&formats, "https://other.org/feed").map(|f| f.name()), Some("feed"));
    }

    #[test]
    fn test_select_none() {
        let formats: Vec<Box<dyn Format>> = vec![Box::new(PickyFormat), Box::new(HostFormat("github.com"))];
        assert!(select(&formats, "https://other.org/").is_none());
    }

    #[test]
    fn test_registry_unknown_when_nothing_matches() {
        let registry = FormatRegistry::new(vec![Box::new(HostFormat("github.com"))]);
        let resource = RetrievedResource::new("https://example.com/", 200, "<html></html>");
        assert_eq!(registry.parse(&resource), ParseResult::unknown());
    }

    #[test]
    fn test_builder_keeps_feed_last() {
        let registry = FormatRegistry::builder()
            .format(HostFormat("github.com"))
            .build()
            .unwrap();
        assert_eq!(registry.names(), vec!["github.com", "feed"]);

        let resource = RetrievedResource::new("https://github.com/a", 201, "");
        match registry.parse(&resource) {
            ParseResult::Parsed { source_format, code, .. } => {
                assert_eq!(source_format.as_deref(), Some("github.com"));
                assert_eq!(code, Some(201));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_default_registry() {
        assert_eq!(FormatRegistry::default().names(), vec!["feed"]);
    }
}
