pub mod fetcher;
pub mod normalize;
pub mod xml;

pub use fetcher::{extract_items, FeedError, FeedFetcher, FeedKind, FeedSource};
pub use normalize::{normalize, FeedItem};
pub use xml::{xml_to_value, ParseXmlError};
