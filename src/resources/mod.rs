//! Typed views of the REST resources the service exposes.

mod application;
mod arguments;
mod configuration;
mod index;
mod job;
mod saved_search;
mod server_info;

pub use self::application::Application;
pub use self::arguments::{ResultsArgs, SearchArgs};
pub(crate) use self::configuration::configuration_file;
pub use self::configuration::ConfigurationStanza;
pub use self::index::Index;
pub(crate) use self::job::read_sid;
pub use self::job::{DispatchState, Job, POLL_INTERVAL};
pub use self::saved_search::SavedSearch;
pub use self::server_info::ServerInfo;
