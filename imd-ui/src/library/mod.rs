//! Song library: cached listing plus filtering for the library panel and
//! the search box suggestions

mod cache;
mod filter;

pub use cache::LibraryCache;
pub use filter::{filter_library, search_suggestions, LibraryFilter, SuggestionPolicy};
