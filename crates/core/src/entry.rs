//! Canonical entry and feed types.
//!
//! Everything here serializes to the wire shape consumers see. Empty values
//! are never serialized: a missing key means "unknown", never `null`.

use serde::Serialize;

/// The `type` tag of an [`Entry`]; always `"entry"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Entry,
}

/// A normalized post.
///
/// Build one field by field and call [`Entry::pruned`] before handing it to
/// a classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub kind: EntryType,

    /// Source-provided unique identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Canonical permalink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// RFC 3339 timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,

    /// Title, unless it only previewed the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audio: Vec<String>,

    /// Classification assigned once all other fields are final.
    #[serde(rename = "post-type", skip_serializing_if = "Option::is_none")]
    pub post_type: Option<String>,
}

/// Sanitized markup alongside its plain-text rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub html: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Content {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty() && self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Author {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl Author {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        [&self.name, &self.url, &self.photo]
            .iter()
            .all(|field| field.as_deref().is_none_or(|v| v.trim().is_empty()))
    }

    fn pruned(self) -> Option<Self> {
        let author = Self { name: non_empty(self.name), url: non_empty(self.url), photo: non_empty(self.photo) };
        if author.is_empty() { None } else { Some(author) }
    }
}

impl Entry {
    /// Creates an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop blank strings, empty lists, and nested objects left empty.
    pub fn pruned(self) -> Self {
        Self {
            kind: self.kind,
            uid: non_empty(self.uid),
            url: non_empty(self.url),
            published: non_empty(self.published),
            name: non_empty(self.name),
            content: self.content.filter(|c| !c.is_empty()),
            author: self.author.and_then(Author::pruned),
            photo: self.photo.into_iter().filter(|p| !p.trim().is_empty()).collect(),
            audio: self.audio.into_iter().filter(|a| !a.trim().is_empty()).collect(),
            post_type: non_empty(self.post_type),
        }
    }

    /// Plain text of the content, or `""`.
    pub fn content_text(&self) -> &str {
        self.content.as_ref().map(|c| c.text.as_str()).unwrap_or("")
    }
}

/// `{type: "feed", items: [...]}`; item order follows the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedResult {
    pub items: Vec<Entry>,
}

/// The `data` member of a successful result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Data {
    /// No format recognized the resource.
    Unknown,
    Feed(FeedResult),
}

/// Map blank strings to `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_entry_serializes_to_type_only() {
        let value = serde_json::to_value(Entry::new()).unwrap();
        assert_eq!(value, json!({"type": "entry"}));
    }

    #[test]
    fn test_pruned_drops_blank_fields() {
        let entry = Entry {
            uid: Some("  ".to_string()),
            name: Some(String::new()),
            url: Some("https://example.com/1".to_string()),
            content: Some(Content::default()),
            author: Some(Author { name: Some(" ".to_string()), url: None, photo: None }),
            photo: vec![String::new()],
            ..Default::default()
        }
        .pruned();

        assert_eq!(entry.uid, None);
        assert_eq!(entry.name, None);
        assert_eq!(entry.content, None);
        assert_eq!(entry.author, None);
        assert!(entry.photo.is_empty());

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({"type": "entry", "url": "https://example.com/1"}));
    }

    #[test]
    fn test_partial_author_kept() {
        let entry = Entry {
            author: Some(Author { name: None, url: Some("https://a.example/".to_string()), photo: None }),
            ..Default::default()
        }
        .pruned();

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["author"], json!({"url": "https://a.example/"}));
    }

    #[test]
    fn test_post_type_key() {
        let entry = Entry { post_type: Some("note".to_string()), ..Default::default() };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["post-type"], "note");
    }

    #[test]
    fn test_data_tags() {
        assert_eq!(serde_json::to_value(Data::Unknown).unwrap(), json!({"type": "unknown"}));

        let feed = Data::Feed(FeedResult { items: vec![Entry::new()] });
        assert_eq!(
            serde_json::to_value(feed).unwrap(),
            json!({"type": "feed", "items": [{"type": "entry"}]})
        );
    }
}
