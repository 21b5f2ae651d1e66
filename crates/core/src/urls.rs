//! Relative URL resolution and URL comparison helpers.

use tracing::warn;
use url::Url;

/// Attributes holding a single URL that get resolved against a base.
///
/// `srcset` is left alone: it holds a list of candidates.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "data"];

/// Resolve relative `href`, `src` and `data` attributes in an HTML fragment
///
/// Returns the input unchanged when `base_url` is empty or cannot be parsed,
/// and when the rewriter fails part way through.
pub fn resolve_urls(html: &str, base_url: &str) -> String {
    if base_url.trim().is_empty() {
        return html.to_string();
    }

    let base = match Url::parse(base_url.trim()) {
        Ok(base) => base,
        Err(e) => {
            warn!(base_url, error = %e, "unusable base URL, leaving links as-is");
            return html.to_string();
        }
    };

    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("*", |el| {
                for &name in URL_ATTRIBUTES {
                    if let Some(value) = el.get_attribute(name)
                        && let Ok(absolute) = base.join(value.trim())
                    {
                        el.set_attribute(name, absolute.as_str()).ok();
                    }
                }
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if let Err(e) = rewriter.write(html.as_bytes()) {
        warn!(error = %e, "URL rewriting failed");
        return html.to_string();
    }

    if let Err(e) = rewriter.end() {
        warn!(error = %e, "URL rewriting failed");
        return html.to_string();
    }

    String::from_utf8_lossy(&output).into_owned()
}

/// Normalize a URL for comparison
///
/// Lowercases the host and gives an empty path a trailing `/`. Strings that
/// do not parse as absolute URLs are returned unchanged.
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        // The url crate already lowercases hosts and fills in "/" for
        // special schemes.
        Ok(parsed) => parsed.to_string(),
        Err(_) => url.to_string(),
    }
}

/// Compare two URLs after normalization
pub fn urls_are_equal(a: &str, b: &str) -> bool {
    normalize_url(a) == normalize_url(b)
}

/// Lowercased host of an absolute URL, if it has one
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}
