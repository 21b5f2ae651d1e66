//! Allowlist-based HTML sanitization.
//!
//! Untrusted markup is reduced to a fixed vocabulary of text-level, structural
//! and (optionally) media elements. Every element may keep a `class`
//! attribute, but only microformats2 class names survive, since downstream
//! microformats parsing is class driven.
//!
//! Sanitizing runs in two passes:
//!
//! 1. a streaming [`lol_html`] pass that rewrites `div`/`header`/`footer` to
//!    `p` and drops iframes that are not safelisted embeds;
//! 2. an [`ammonia`] pass that applies the allowlist tables below and
//!    optionally makes URLs absolute.
//!
//! The cleaned output is checked once more for embeds, since the two parsers
//! do not always agree on where an iframe ends up. Wrappers emptied by the
//! container rewrite hand their microformats classes to the element after
//! them before being dropped.
//!
//! # Example
//!
//! ```rust
//! use postscope_core::sanitize::{sanitize_html, strip_html};
//!
//! let html = r#"<div class="h-entry x-ad"><script>evil()</script><b style="color:red">Hi</b></div>"#;
//! assert_eq!(sanitize_html(html, true, None), r#"<p class="h-entry"><b>Hi</b></p>"#);
//! assert_eq!(strip_html("<p>A</p><br><p>B</p>"), "A\nB");
//! ```

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ammonia::{Builder, UrlRelative};
use regex::{Captures, NoExpand, Regex};
use tracing::warn;
use url::Url;

use crate::{PostscopeError, Result};

/// Elements allowed regardless of options.
const TEXT_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "cite", "code", "del", "em", "i", "q", "strike", "strong", "time", "blockquote", "pre",
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "sub", "sup", "table", "thead", "tbody", "tfoot", "tr",
    "th", "td", "caption", "figure", "figcaption",
];

/// Element-specific attributes for [`TEXT_TAGS`].
const TEXT_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("time", &["datetime"]),
    ("th", &["colspan", "rowspan"]),
    ("td", &["colspan", "rowspan"]),
];

/// Elements allowed only when images are allowed.
const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "audio", "source"];

const MEDIA_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("img", &["src", "alt"]),
    ("video", &["src", "controls"]),
    ("audio", &["src", "controls"]),
    ("source", &["src", "type"]),
];

/// Elements allowed only when embeds are enabled.
const EMBED_TAGS: &[&str] = &["iframe"];

const EMBED_ATTRIBUTES: &[(&str, &[&str])] = &[("iframe", &["src"])];

/// Containers kept but renamed, so arbitrary layouts collapse to paragraphs.
const REWRITTEN_TAGS: &[(&str, &str)] = &[("div", "p"), ("header", "p"), ("footer", "p")];

/// Elements removed together with everything inside them.
const CLEAN_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Attribute allowed on every element; its value is further filtered.
const GENERIC_ATTRIBUTES: &[&str] = &["class"];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "ftp", "nntp", "news", "tel"];

/// Class name prefixes of the microformats2 vocabulary.
const MICROFORMAT_PREFIXES: &[&str] = &["h-", "p-", "u-", "dt-", "e-"];

/// Embed providers safelisted by default (host + path prefixes).
pub const DEFAULT_EMBED_PROVIDERS: &[&str] =
    &["www.youtube.com/embed/", "www.youtube-nocookie.com/embed/", "player.vimeo.com/video/"];

/// Void elements never take a wrapper's classes.
const VOID_TAGS: &[&str] = &["br", "img", "source"];

static EMPTY_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<p(?:\s[^>]*)?>\s*</p>").unwrap());

/// An emptied wrapper paragraph followed by the next start tag, as ammonia
/// serializes them.
static EMPTY_WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<p class="([^"]*)">\s*</p>(\s*)<([a-z][a-z0-9]*)((?:\s[a-z-]+="[^"]*")*)>"#).unwrap()
});

static CLASS_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\sclass="([^"]*)""#).unwrap());

/// Configuration for HTML sanitization
///
/// # Example
///
/// ```rust
/// use postscope_core::SanitizeConfig;
///
/// let config = SanitizeConfig::builder()
///     .allow_embeds(true)
///     .embed_provider("www.youtube.com/embed/")
///     .build();
/// assert_eq!(config.embed_providers.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Whether safelisted `iframe` embeds are kept (default: false).
    pub allow_embeds: bool,
    /// Host + path prefixes an iframe `src` must start with, after an
    /// optional `http:`/`https:` scheme and `//`.
    pub embed_providers: Vec<String>,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            allow_embeds: false,
            embed_providers: DEFAULT_EMBED_PROVIDERS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl SanitizeConfig {
    /// Creates a new builder for SanitizeConfig.
    ///
    /// The builder starts from the defaults; the first
    /// [`embed_provider`](SanitizeConfigBuilder::embed_provider) call replaces
    /// the default provider list.
    pub fn builder() -> SanitizeConfigBuilder {
        SanitizeConfigBuilder::new()
    }
}

/// Builder for SanitizeConfig.
pub struct SanitizeConfigBuilder {
    config: SanitizeConfig,
    providers_set: bool,
}

impl SanitizeConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: SanitizeConfig::default(), providers_set: false }
    }

    /// Sets whether safelisted iframe embeds are kept.
    pub fn allow_embeds(mut self, value: bool) -> Self {
        self.config.allow_embeds = value;
        self
    }

    /// Adds an embed provider prefix, e.g. `player.vimeo.com/video/`.
    pub fn embed_provider(mut self, prefix: impl Into<String>) -> Self {
        if !self.providers_set {
            self.config.embed_providers.clear();
            self.providers_set = true;
        }
        self.config.embed_providers.push(prefix.into());
        self
    }

    /// Builds the config.
    pub fn build(self) -> SanitizeConfig {
        self.config
    }
}

impl Default for SanitizeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTML sanitizer with a fixed allowlist and a configurable embed policy.
///
/// A sanitizer holds no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    config: SanitizeConfig,
    /// Compiled provider safelist; `None` when embeds are disabled.
    embeds: Option<Regex>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        // Embeds are off by default, so there is no safelist to compile.
        Self { config: SanitizeConfig::default(), embeds: None }
    }
}

impl Sanitizer {
    /// Build a sanitizer, validating the allowlist tables and compiling the
    /// embed safelist.
    ///
    /// # Errors
    ///
    /// Returns [`PostscopeError::ConfigError`] if the allowlist tables
    /// contradict each other or the safelist does not compile.
    pub fn new(config: SanitizeConfig) -> Result<Self> {
        validate_policy()?;

        let embeds = if config.allow_embeds { Some(compile_embed_safelist(&config.embed_providers)?) } else { None };

        Ok(Self { config, embeds })
    }

    /// The configuration this sanitizer was built from.
    pub fn config(&self) -> &SanitizeConfig {
        &self.config
    }

    /// Whether an iframe `src` is allowed through.
    pub fn is_safe_embed(&self, src: &str) -> bool {
        self.embeds.as_ref().is_some_and(|re| re.is_match(src.trim()))
    }

    /// Sanitize untrusted HTML
    ///
    /// Media elements survive only when `allow_images` is set. When
    /// `base_url` is given, relative URLs are rewritten to absolute form.
    /// Never fails: malformed markup yields best-effort output.
    pub fn sanitize(&self, html: &str, allow_images: bool, base_url: Option<&str>) -> String {
        let base = base_url.map(str::trim).filter(|b| !b.is_empty()).and_then(|b| match Url::parse(b) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(base_url = b, error = %e, "unusable base URL, keeping relative URLs");
                None
            }
        });

        let restructured = self.rewrite_structure(html);
        let embeds = self.embeds.is_some();
        let mut cleaned = self.cleaner(allow_images, base.clone(), embeds).clean(&restructured).to_string();

        if embeds {
            cleaned = match self.remove_unsafe_embeds(&cleaned) {
                Some(checked) => checked,
                None => self.cleaner(allow_images, base, false).clean(&cleaned).to_string(),
            };
        }

        let carried = carry_wrapper_classes(&cleaned);
        let cleaned = EMPTY_PARAGRAPH.replace_all(&carried, "");

        cleaned.trim().to_string()
    }

    /// Rename container tags and drop iframes that are not safelisted embeds
    fn rewrite_structure(&self, html: &str) -> String {
        let mut output = Vec::with_capacity(html.len());
        let mut rewriter = lol_html::HtmlRewriter::new(
            lol_html::Settings {
                element_content_handlers: vec![lol_html::element!("*", |el| {
                    let tag = el.tag_name().to_ascii_lowercase();

                    if let Some((_, to)) = REWRITTEN_TAGS.iter().find(|(from, _)| *from == tag) {
                        el.set_tag_name(to)?;
                    } else if tag == "iframe" {
                        let safe = el.get_attribute("src").is_some_and(|src| self.is_safe_embed(&src));
                        if !safe {
                            el.remove();
                        }
                    }
                    Ok(())
                })],
                ..Default::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );

        if let Err(e) = rewriter.write(html.as_bytes()) {
            warn!(error = %e, "structure rewrite failed, sanitizing input as-is");
            return html.to_string();
        }

        if let Err(e) = rewriter.end() {
            warn!(error = %e, "structure rewrite failed, sanitizing input as-is");
            return html.to_string();
        }

        String::from_utf8_lossy(&output).into_owned()
    }

    /// Remove iframes without a safelisted `src` from cleaned markup
    ///
    /// `None` when the rewriter fails; callers must then drop iframes
    /// altogether.
    fn remove_unsafe_embeds(&self, html: &str) -> Option<String> {
        let mut output = Vec::with_capacity(html.len());
        let mut rewriter = lol_html::HtmlRewriter::new(
            lol_html::Settings {
                element_content_handlers: vec![lol_html::element!("iframe", |el| {
                    if !el.get_attribute("src").is_some_and(|src| self.is_safe_embed(&src)) {
                        el.remove();
                    }
                    Ok(())
                })],
                ..Default::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );

        if let Err(e) = rewriter.write(html.as_bytes()) {
            warn!(error = %e, "embed check failed, dropping all iframes");
            return None;
        }

        if let Err(e) = rewriter.end() {
            warn!(error = %e, "embed check failed, dropping all iframes");
            return None;
        }

        Some(String::from_utf8_lossy(&output).into_owned())
    }

    /// Assemble the allowlist for one call
    fn cleaner(&self, allow_images: bool, base: Option<Url>, allow_embeds: bool) -> Builder<'static> {
        let mut tags: HashSet<&'static str> = TEXT_TAGS.iter().copied().collect();
        let mut tag_attributes = attribute_table(TEXT_ATTRIBUTES);

        if allow_images {
            tags.extend(MEDIA_TAGS);
            tag_attributes.extend(attribute_table(MEDIA_ATTRIBUTES));
        }

        if allow_embeds {
            tags.extend(EMBED_TAGS);
            tag_attributes.extend(attribute_table(EMBED_ATTRIBUTES));
        }

        let mut builder = Builder::empty();
        builder
            .tags(tags)
            .tag_attributes(tag_attributes)
            .generic_attributes(GENERIC_ATTRIBUTES.iter().copied().collect())
            .url_schemes(URL_SCHEMES.iter().copied().collect())
            .clean_content_tags(CLEAN_CONTENT_TAGS.iter().copied().collect())
            .link_rel(None)
            .strip_comments(true)
            .attribute_filter(filter_attribute);

        if let Some(base) = base {
            builder.url_relative(UrlRelative::RewriteWithBase(base));
        }

        builder
    }
}

/// Sanitize HTML with the default policy (no embeds)
pub fn sanitize_html(html: &str, allow_images: bool, base_url: Option<&str>) -> String {
    Sanitizer::default().sanitize(html, allow_images, base_url)
}

/// Reduce HTML to plain text
///
/// Only line breaks survive the sanitizing pass; they become `\n` after
/// entities are decoded.
pub fn strip_html(html: &str) -> String {
    let mut builder = Builder::empty();
    builder
        .tags(["br"].into_iter().collect())
        .clean_content_tags(CLEAN_CONTENT_TAGS.iter().copied().collect())
        .strip_comments(true);

    let sanitized = builder.clean(html).to_string();
    let decoded = html_escape::decode_html_entities(&sanitized);

    decoded
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n")
        .trim()
        .to_string()
}

/// Whether a class token belongs to the microformats2 vocabulary
pub fn is_microformat_class(token: &str) -> bool {
    MICROFORMAT_PREFIXES.iter().any(|prefix| {
        token.strip_prefix(prefix).is_some_and(|rest| {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        })
    })
}

/// Move the classes of emptied wrapper paragraphs onto the following element
///
/// Repeats until nothing moves, so a class crosses several empty wrappers.
fn carry_wrapper_classes(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let next = EMPTY_WRAPPER.replace_all(&current, carry_class).into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn carry_class(caps: &Captures<'_>) -> String {
    let (wrapper, spacing, tag, attributes) = (&caps[1], &caps[2], &caps[3], &caps[4]);

    if VOID_TAGS.contains(&tag) {
        return caps[0].to_string();
    }

    let attributes = match CLASS_ATTRIBUTE.captures(attributes) {
        Some(own) => {
            let mut classes: Vec<&str> = Vec::new();
            for token in wrapper.split_ascii_whitespace().chain(own[1].split_ascii_whitespace()) {
                if !classes.contains(&token) {
                    classes.push(token);
                }
            }
            let merged = format!(r#" class="{}""#, classes.join(" "));
            CLASS_ATTRIBUTE.replace(attributes, NoExpand(&merged)).into_owned()
        }
        None => format!(r#" class="{}"{}"#, wrapper, attributes),
    };

    format!("{}<{}{}>", spacing, tag, attributes)
}

/// Keep only microformats2 tokens in `class`; leave other attributes alone
fn filter_attribute<'u>(_element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    if attribute != "class" {
        return Some(Cow::Borrowed(value));
    }

    let classes: Vec<&str> = value.split_ascii_whitespace().filter(|c| is_microformat_class(c)).collect();

    if classes.is_empty() { None } else { Some(Cow::Owned(classes.join(" "))) }
}

fn attribute_table(table: &[(&'static str, &[&'static str])]) -> HashMap<&'static str, HashSet<&'static str>> {
    table
        .iter()
        .map(|(tag, attributes)| (*tag, attributes.iter().copied().collect()))
        .collect()
}

/// Compile provider prefixes into `^(https?:)?//(prefix|prefix…)`
fn compile_embed_safelist(providers: &[String]) -> Result<Regex> {
    let alternatives: Vec<String> = providers
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();

    // An empty safelist must match nothing rather than every `//` URL.
    let pattern = if alternatives.is_empty() {
        r"[^\s\S]".to_string()
    } else {
        format!(r"^(?:https?:)?//(?:{})", alternatives.join("|"))
    };

    Regex::new(&pattern).map_err(|e| PostscopeError::ConfigError(format!("Invalid embed safelist: {}", e)))
}

/// Check the allowlist tables against each other
fn validate_policy() -> Result<()> {
    let allowed: HashSet<&str> = TEXT_TAGS.iter().chain(MEDIA_TAGS).chain(EMBED_TAGS).copied().collect();

    if let Some(tag) = CLEAN_CONTENT_TAGS.iter().find(|t| allowed.contains(*t)) {
        return Err(PostscopeError::ConfigError(format!(
            "<{}> is both allowed and content-cleaned",
            tag
        )));
    }

    if let Some((from, to)) = REWRITTEN_TAGS.iter().find(|(_, to)| !TEXT_TAGS.contains(to)) {
        return Err(PostscopeError::ConfigError(format!(
            "<{}> is rewritten to <{}>, which is not allowed",
            from, to
        )));
    }

    for (tag, _) in TEXT_ATTRIBUTES.iter().chain(MEDIA_ATTRIBUTES).chain(EMBED_ATTRIBUTES) {
        if !allowed.contains(tag) {
            return Err(PostscopeError::ConfigError(format!(
                "attributes listed for <{}>, which is not allowed",
                tag
            )));
        }
    }

    Ok(())
}
