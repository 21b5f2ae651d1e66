pub mod entry;
pub mod error;
pub mod formats;
pub mod post_type;
pub mod resource;
pub mod result;
pub mod sanitize;
pub mod urls;

pub use entry::{Author, Content, Data, Entry, EntryType, FeedResult};
pub use error::{PostscopeError, Result};
pub use formats::feed::{FeedDefaults, MediaProperty};
pub use formats::{FeedFormat, Format, FormatRegistry, FormatRegistryBuilder, parse};
pub use post_type::{PostTypeClassifier, PostTypeDiscovery};
pub use resource::RetrievedResource;
pub use result::{ErrorKind, ParseResult};
pub use sanitize::{SanitizeConfig, SanitizeConfigBuilder, Sanitizer, sanitize_html, strip_html};
pub use urls::{normalize_url, resolve_urls, urls_are_equal};
