//! Incremental parsing of Atom feeds and entries with the REST `dict`/`list` content vocabulary.
//!
//! Elements are matched by local name, so the Atom, REST and OpenSearch prefixes the server uses do not matter.

mod entry;
mod feed;
mod parser;
mod value;

pub use self::entry::AtomEntry;
pub use self::feed::{AtomFeed, Generator, Pagination};
pub(crate) use self::parser::capitalize;
pub use self::value::Value;
