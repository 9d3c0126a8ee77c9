mod cache;
mod source;

pub use cache::{extract_text, ContentCache, ContentItem, ContentView, DEFAULT_FIELD};
pub use source::{ConfiguredSource, ContentSource, HttpContentSource, StaticSource};
