//! Forward-only streaming of search results.

mod reader;
mod record;
mod stream;

pub use self::reader::SearchResultsReader;
pub use self::record::{Field, Record};
pub use self::stream::{RecordObserver, SearchResultStream, StreamState, DEFAULT_DELIMITER};
