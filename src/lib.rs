#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(unused)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]
#![warn(rustdoc::private_doc_tests)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_codeblock_attributes)]
#![warn(rustdoc::invalid_html_tags)]
#![warn(rustdoc::invalid_rust_codeblocks)]
#![warn(rustdoc::bare_urls)]
//! Client for the Splunk REST API.
//!
//! A [`Service`] logs in and hands out typed resources such as [`Index`], [`SavedSearch`] and [`Job`]. Each resource
//! is an [`Entity`] holding the Atom entry it was last read from, whose `<s:dict>` content is exposed as typed
//! properties. Search results are read from the response as it arrives through a [`SearchResultStream`], either
//! pulled record by record or pushed to [`RecordObserver`]s.
//!
//! The [`blocking`] module offers the same operations to callers without an async runtime.
//!
//! # Examples
//!
//! ```no_run
//! # use splunk_sdk::{ResultsArgs, SearchArgs, Service, ServiceConfig};
//! # #[tokio::main]
//! # async fn main() -> splunk_sdk::Result<()> {
//! let service = Service::new(&ServiceConfig::from_env()?)?;
//! service.login("admin", "changeme").await?;
//!
//! let search_args = SearchArgs::new().with_earliest_time("-24h");
//! let mut job = service.create_job("search index=_internal | stats count by host", &search_args).await?;
//! job.wait_until_done().await?;
//!
//! let mut results = job.results(&ResultsArgs::new().with_count(0)).await?;
//! while let Some(record) = results.read_record().await? {
//!     println!("{:?} {:?}", record.get("host"), record.get("count"));
//! }
//! # Ok(())
//! # }
//! ```
mod atom;
pub mod blocking;
mod config;
pub mod convert;
mod entity;
mod errors;
mod http;
mod name;
mod resources;
mod results;
mod service;
mod xml;

pub use atom::{AtomEntry, AtomFeed, Generator, Pagination, Value};
pub use config::{Scheme, ServiceConfig};
pub use convert::{ConversionError, FromValue};
pub use entity::{Entity, EntityCollection, EntityState, PropertyBag, Resource, ResourceIdentity};
pub use errors::{Error, ParseError};
pub use http::{
    ArgumentSet, Body, BodyReader, Context, Message, Method, Request, RequestError, ReqwestTransport, Response,
    Severity, ToArguments, Transport,
};
pub use name::{Namespace, ResourceName, Scope};
pub use resources::{
    Application, ConfigurationStanza, DispatchState, Index, Job, ResultsArgs, SavedSearch, SearchArgs, ServerInfo,
    POLL_INTERVAL,
};
pub use results::{
    Field, Record, RecordObserver, SearchResultStream, SearchResultsReader, StreamState, DEFAULT_DELIMITER,
};
pub use service::Service;
pub use xml::XmlCursor;

/// A [`Result`] with its [`Err`] variant set to [`Error`].
///
/// [`Result`]: std::result::Result
/// [`Err`]: std::result::Result::Err
pub type Result<T> = std::result::Result<T, Error>;
