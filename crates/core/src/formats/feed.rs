//! Syndication feeds (RSS, Atom, JSON Feed) to canonical entries.

use std::sync::Arc;

use feed_rs::model;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::entry::{Author, Content, Data, Entry, FeedResult};
use crate::formats::Format;
use crate::post_type::{PostTypeClassifier, PostTypeDiscovery};
use crate::resource::RetrievedResource;
use crate::result::ParseResult;
use crate::sanitize::{Sanitizer, strip_html};
use crate::urls::{resolve_urls, urls_are_equal};
use crate::Result;

/// Value of `source-format` for feed results.
pub const SOURCE_FORMAT: &str = "xml";

/// Suffixes marking a title as a truncated preview of the content.
const ELLIPSES: &[&str] = &["...", "…"];

/// Entry property an enclosure maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaProperty {
    Photo,
    Audio,
}

impl MediaProperty {
    /// Classify an enclosure by MIME type; parameters and case are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "audio/mpeg" => Some(MediaProperty::Audio),
            "image/jpeg" | "image/png" | "image/gif" => Some(MediaProperty::Photo),
            _ => None,
        }
    }
}

/// Feed-level values that items fall back to.
#[derive(Debug, Clone, Default)]
pub struct FeedDefaults {
    /// Preferred link of the feed itself.
    pub link: Option<String>,
    /// First feed-level author.
    pub author: Option<model::Person>,
}

impl FeedDefaults {
    pub fn from_feed(feed: &model::Feed) -> Self {
        Self { link: preferred_link(&feed.links), author: feed.authors.first().cloned() }
    }
}

/// Catch-all format for syndication feeds.
pub struct FeedFormat {
    sanitizer: Sanitizer,
    classifier: Arc<dyn PostTypeClassifier>,
}

impl Default for FeedFormat {
    fn default() -> Self {
        Self::new(Sanitizer::default(), Arc::new(PostTypeDiscovery))
    }
}

impl FeedFormat {
    pub fn new(sanitizer: Sanitizer, classifier: Arc<dyn PostTypeClassifier>) -> Self {
        Self { sanitizer, classifier }
    }

    /// Parse raw feed bytes into entries, keeping source order.
    ///
    /// # Errors
    ///
    /// Returns [`PostscopeError::InvalidFeed`](crate::PostscopeError::InvalidFeed)
    /// when the body is not a recognizable feed.
    pub fn parse_feed(&self, body: &[u8]) -> Result<FeedResult> {
        let feed = feed_rs::parser::parse(body)?;
        let defaults = FeedDefaults::from_feed(&feed);

        #[cfg(feature = "parallel")]
        let items: Vec<Entry> = feed
            .entries
            .par_iter()
            .map(|item| self.entry_from_item(item, &defaults))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let items: Vec<Entry> = feed
            .entries
            .iter()
            .map(|item| self.entry_from_item(item, &defaults))
            .collect();

        debug!(items = items.len(), feed_type = ?feed.feed_type, "parsed feed");

        Ok(FeedResult { items })
    }

    /// Derive one canonical entry from a feed item
    pub fn entry_from_item(&self, item: &model::Entry, defaults: &FeedDefaults) -> Entry {
        let mut entry = Entry { uid: Some(item.id.clone()), url: preferred_link(&item.links), ..Default::default() };

        entry.published = item.published.or(item.updated).map(|dt| dt.to_rfc3339());

        if let Some(raw) = item_content(item) {
            let resolved = resolve_urls(raw, entry.url.as_deref().unwrap_or(""));
            entry.content =
                Some(Content { html: self.sanitizer.sanitize(&resolved, true, None), text: strip_html(raw) });
        }

        if let Some(title) = item.title.as_ref().map(|t| t.content.trim()).filter(|t| !t.is_empty())
            && !is_link(title, entry.url.as_deref())
        {
            let name = strip_html(title);
            let text = entry.content_text();
            if text.is_empty() || !is_teaser_title(&name, text) {
                entry.name = Some(name);
            }
        }

        if let Some(person) = item.authors.first().or(defaults.author.as_ref()) {
            entry.author = Some(Author {
                name: Some(person.name.clone()),
                url: person
                    .uri
                    .clone()
                    .filter(|u| !u.trim().is_empty())
                    .or_else(|| defaults.link.clone()),
                photo: None,
            });
        }

        if let Some((href, mime)) = first_enclosure(item) {
            match mime.as_deref().and_then(MediaProperty::from_mime) {
                Some(MediaProperty::Audio) => entry.audio = vec![href],
                Some(MediaProperty::Photo) => entry.photo = vec![href],
                None => {}
            }
        }

        let mut entry = entry.pruned();
        entry.post_type = Some(self.classifier.discover(&entry));
        entry
    }
}

impl Format for FeedFormat {
    fn name(&self) -> &str {
        "feed"
    }

    fn matches_host(&self, _url: &str) -> bool {
        true
    }

    fn matches(&self, _url: &str) -> bool {
        true
    }

    fn parse(&self, resource: &RetrievedResource) -> ParseResult {
        match self.parse_feed(resource.body()) {
            Ok(feed) => ParseResult::Parsed {
                data: Data::Feed(feed),
                url: Some(resource.url().to_string()),
                source_format: Some(SOURCE_FORMAT.to_string()),
                code: Some(resource.status_code()),
            },
            Err(e) => {
                warn!(url = resource.url(), error = %e, "feed could not be parsed");
                ParseResult::invalid_xml(&e)
            }
        }
    }
}

/// First link with no `rel` or `rel="alternate"`, else the first non-empty one
fn preferred_link(links: &[model::Link]) -> Option<String> {
    let usable = || links.iter().filter(|l| !l.href.trim().is_empty());

    usable()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel.eq_ignore_ascii_case("alternate")))
        .or_else(|| usable().find(|l| !l.rel.as_deref().is_some_and(|rel| rel.eq_ignore_ascii_case("enclosure"))))
        .map(|l| l.href.trim().to_string())
}

/// Full content when present, otherwise the summary or description
fn item_content(item: &model::Entry) -> Option<&str> {
    item.content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .filter(|body| !body.trim().is_empty())
        .or_else(|| item.summary.as_ref().map(|s| s.content.as_str()).filter(|s| !s.trim().is_empty()))
}

/// Whether a title merely repeats the item's link
fn is_link(title: &str, link: Option<&str>) -> bool {
    link.is_some_and(|link| title == link || urls_are_equal(title, link))
}

/// Whether an ellipsis-terminated title is a prefix of the content text
pub fn is_teaser_title(title: &str, content_text: &str) -> bool {
    ELLIPSES
        .iter()
        .find_map(|ellipsis| title.strip_suffix(ellipsis))
        .is_some_and(|trimmed| content_text.starts_with(trimmed.trim_end()))
}

/// URL and declared MIME type of the item's first enclosure
fn first_enclosure(item: &model::Entry) -> Option<(String, Option<String>)> {
    let media = item.media.iter().flat_map(|m| m.content.iter()).find_map(|content| {
        content
            .url
            .as_ref()
            .map(|url| (url.to_string(), content.content_type.as_ref().map(|m| m.essence().to_string())))
    });

    media.or_else(|| {
        item.links
            .iter()
            .find(|l| l.rel.as_deref().is_some_and(|rel| rel.eq_ignore_ascii_case("enclosure")))
            .filter(|l| !l.href.trim().is_empty())
            .map(|l| (l.href.trim().to_string(), l.media_type.clone()))
    })
}
