//! Post type classification.
//!
//! The pipeline treats classification as a collaborator: anything
//! implementing [`PostTypeClassifier`] can be plugged into a
//! [`FormatRegistry`](crate::FormatRegistry). [`PostTypeDiscovery`] is the
//! default, covering the parts of Post Type Discovery that apply to the
//! fields an [`Entry`] carries.

use crate::entry::Entry;

/// Assigns a semantic category such as `note`, `article` or `photo`.
///
/// Called exactly once per entry, after every other field is final. Must
/// not depend on mutable state.
pub trait PostTypeClassifier: Send + Sync {
    fn discover(&self, entry: &Entry) -> String;
}

impl<F> PostTypeClassifier for F
where
    F: Fn(&Entry) -> String + Send + Sync,
{
    fn discover(&self, entry: &Entry) -> String {
        self(entry)
    }
}

/// Default classifier.
///
/// - `photo` when the entry has photos
/// - `note` when it has no name
/// - `article` when it has a name but no content text
/// - otherwise `note` if the content text starts with the name, `article`
///   if not (whitespace collapsed on both sides)
#[derive(Debug, Clone, Copy, Default)]
pub struct PostTypeDiscovery;

impl PostTypeClassifier for PostTypeDiscovery {
    fn discover(&self, entry: &Entry) -> String {
        if !entry.photo.is_empty() {
            return "photo".to_string();
        }

        let name = entry.name.as_deref().map(collapse_whitespace).unwrap_or_default();
        if name.is_empty() {
            return "note".to_string();
        }

        let content = collapse_whitespace(entry.content_text());
        if content.is_empty() {
            return "article".to_string();
        }

        if content.starts_with(&name) { "note".to_string() } else { "article".to_string() }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
