//! A blocking facade over [`Service`](crate::Service) for callers without an async runtime.
//!
//! Every operation runs to completion on a single-threaded tokio runtime owned by the service. Do not call into this
//! module from inside another runtime.
//!
//! # Examples
//!
//! ```no_run
//! # use splunk_sdk::{blocking, ArgumentSet, ServiceConfig};
//! # fn main() -> splunk_sdk::Result<()> {
//! let service = blocking::Service::new(&ServiceConfig::default())?;
//! service.login("admin", "changeme")?;
//!
//! for record in service.oneshot_search("search index=_internal | head 10", &ArgumentSet::new())? {
//!     println!("{:?}", record?.get("host"));
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::ServiceConfig;
use crate::entity::{EntityCollection, Resource};
use crate::http::{ToArguments, Transport};
use crate::resources::{Application, ConfigurationStanza, Index, Job, SavedSearch, ServerInfo};
use crate::results::{Record, SearchResultStream, SearchResultsReader};
use crate::Result;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

macro_rules! blocking_operations {
    ($($(#[$meta:meta])* fn $name:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(
            $(#[$meta])*
            pub fn $name(&self $(, $arg: $ty)*) -> Result<$ret> {
                self.runtime.block_on(self.inner.$name($($arg),*))
            }
        )*
    };
}

/// Blocking counterpart of [`crate::Service`].
#[derive(Debug, Clone)]
pub struct Service {
    runtime: Arc<Runtime>,
    inner: crate::Service,
}

impl Service {
    /// Creates a service sending requests through a [`ReqwestTransport`](crate::ReqwestTransport).
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            runtime: runtime()?,
            inner: crate::Service::new(config)?,
        })
    }

    /// Creates a service sending requests through `transport`.
    pub fn with_transport(transport: Arc<dyn Transport>, config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            runtime: runtime()?,
            inner: crate::Service::with_transport(transport, config)?,
        })
    }

    /// The async service this one drives.
    pub fn inner(&self) -> &crate::Service {
        &self.inner
    }

    /// Forgets the session key.
    pub fn logoff(&self) {
        self.inner.logoff()
    }

    blocking_operations! {
        /// See [`crate::Service::login`].
        fn login(&self, username: &str, password: &str) -> ();
        /// See [`crate::Service::server_info`].
        fn server_info(&self) -> ServerInfo;
        /// See [`crate::Service::applications`].
        fn applications(&self) -> EntityCollection<Application>;
        /// See [`crate::Service::application`].
        fn application(&self, name: &str) -> Application;
        /// See [`crate::Service::indexes`].
        fn indexes(&self) -> EntityCollection<Index>;
        /// See [`crate::Service::index`].
        fn index(&self, name: &str) -> Index;
        /// See [`crate::Service::create_index`].
        fn create_index(&self, name: &str, args: &impl ToArguments) -> Index;
        /// See [`crate::Service::remove_index`].
        fn remove_index(&self, name: &str) -> ();
        /// See [`crate::Service::saved_searches`].
        fn saved_searches(&self) -> EntityCollection<SavedSearch>;
        /// See [`crate::Service::saved_search`].
        fn saved_search(&self, name: &str) -> SavedSearch;
        /// See [`crate::Service::create_saved_search`].
        fn create_saved_search(&self, name: &str, search: &str, args: &impl ToArguments) -> SavedSearch;
        /// See [`crate::Service::update_saved_search`].
        fn update_saved_search(&self, name: &str, args: &impl ToArguments) -> SavedSearch;
        /// See [`crate::Service::remove_saved_search`].
        fn remove_saved_search(&self, name: &str) -> ();
        /// See [`crate::Service::dispatch_saved_search`].
        fn dispatch_saved_search(&self, name: &str, args: &impl ToArguments) -> Job;
        /// See [`crate::Service::jobs`].
        fn jobs(&self) -> EntityCollection<Job>;
        /// See [`crate::Service::job`].
        fn job(&self, sid: &str) -> Job;
        /// See [`crate::Service::create_job`].
        fn create_job(&self, search: &str, args: &impl ToArguments) -> Job;
        /// See [`crate::Service::stanzas`].
        fn stanzas(&self, file: &str) -> EntityCollection<ConfigurationStanza>;
        /// See [`crate::Service::stanza`].
        fn stanza(&self, file: &str, name: &str) -> ConfigurationStanza;
        /// See [`crate::Service::create_stanza`].
        fn create_stanza(&self, file: &str, name: &str) -> ConfigurationStanza;
        /// See [`crate::Service::update_stanza`].
        fn update_stanza(&self, file: &str, name: &str, args: &impl ToArguments) -> ConfigurationStanza;
        /// See [`crate::Service::remove_stanza`].
        fn remove_stanza(&self, file: &str, name: &str) -> ();
    }

    /// Runs a oneshot search and iterates its results.
    pub fn oneshot_search(&self, search: &str, args: &impl ToArguments) -> Result<Records<'static>> {
        let stream = self.runtime.block_on(self.inner.oneshot_search(search, args))?;

        Ok(Records::new(Arc::clone(&self.runtime), stream))
    }

    /// Runs an export search and reads its sections one after another.
    pub fn export_search(&self, search: &str, args: &impl ToArguments) -> Result<Sections> {
        let reader = self.runtime.block_on(self.inner.export_search(search, args))?;

        Ok(Sections {
            runtime: Arc::clone(&self.runtime),
            reader,
        })
    }

    /// Reads `resource` from the server again.
    pub fn update<T: Resource>(&self, resource: &mut T) -> Result<()> {
        self.runtime.block_on(resource.entity_mut().update())
    }

    /// Re-reads `collection` from the server.
    pub fn update_collection<T: Resource>(&self, collection: &mut EntityCollection<T>) -> Result<()> {
        self.runtime.block_on(collection.update())
    }

    /// Blocks until `job` is done. See [`Job::wait_until_done`].
    pub fn wait_until_done(&self, job: &mut Job) -> Result<()> {
        self.runtime.block_on(job.wait_until_done())
    }

    /// Iterates the final results of `job`.
    pub fn job_results(&self, job: &Job, args: &impl ToArguments) -> Result<Records<'static>> {
        let stream = self.runtime.block_on(job.results(args))?;

        Ok(Records::new(Arc::clone(&self.runtime), stream))
    }

    /// Iterates a preview of the results of a running `job`.
    pub fn job_preview(&self, job: &Job, args: &impl ToArguments) -> Result<Records<'static>> {
        let stream = self.runtime.block_on(job.preview(args))?;

        Ok(Records::new(Arc::clone(&self.runtime), stream))
    }
}

fn runtime() -> Result<Arc<Runtime>> {
    Ok(Arc::new(Builder::new_current_thread().enable_all().build()?))
}

/// Iterator over the records of a [`SearchResultStream`], reading each one on demand.
///
/// A failure ends the iteration after it is yielded.
#[derive(Debug)]
pub struct Records<'a> {
    runtime: Arc<Runtime>,
    stream: SearchResultStream<'a>,
    failed: bool,
}

impl<'a> Records<'a> {
    fn new(runtime: Arc<Runtime>, stream: SearchResultStream<'a>) -> Self {
        Self {
            runtime,
            stream,
            failed: false,
        }
    }

    /// True when the results are a preview of a search still running.
    pub fn is_preview(&self) -> bool {
        self.stream.is_preview()
    }

    /// The field order the server announced.
    pub fn field_names(&self) -> &[String] {
        self.stream.field_names()
    }

    /// Stops reading. Records left unread are skipped.
    pub fn close(&mut self) {
        self.stream.close()
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let next = self.runtime.block_on(self.stream.read_record()).transpose();
        if let Some(Err(_)) = &next {
            self.failed = true;
            self.stream.close();
        }
        next
    }
}

/// Blocking counterpart of [`SearchResultsReader`].
#[derive(Debug)]
pub struct Sections {
    runtime: Arc<Runtime>,
    reader: SearchResultsReader,
}

impl Sections {
    /// Moves to the next section, or returns `None` once the export is exhausted.
    ///
    /// The section's records are read as it is iterated. Whatever the previous section left unread is skipped.
    pub fn next_section(&mut self) -> Result<Option<Records<'_>>> {
        let stream = self.runtime.block_on(self.reader.next_stream())?;

        Ok(stream.map(|stream| Records::new(Arc::clone(&self.runtime), stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::http::ArgumentSet;
    use crate::tests::{job_entry, MockTransport, RESULTS};

    fn service(transport: Arc<MockTransport>) -> Service {
        Service::with_transport(transport, &ServiceConfig::default()).unwrap()
    }

    #[test]
    fn test_oneshot_search_iterates_records() {
        let transport = MockTransport::new();
        transport.respond(200, RESULTS);
        let service = service(transport);

        let records = service
            .oneshot_search("search index=_internal", &ArgumentSet::new())
            .unwrap();
        assert_eq!(vec!["host", "count", "_raw"], records.field_names());
        let hosts = records
            .map(|record| record.unwrap().get("host").unwrap().to_string())
            .collect::<Vec<_>>();

        assert_eq!(vec!["Dnoble-WIN10".to_owned(), "web-01\nweb-02".to_owned()], hosts);
    }

    #[test]
    fn test_iteration_stops_after_failure() {
        let transport = MockTransport::new();
        transport.respond(
            200,
            r#"<results preview="0"><messages><msg type="FATAL">Unknown search command 'serach'.</msg></messages></results>"#,
        );
        let service = service(transport);

        let mut records = service.oneshot_search("serach foo", &ArgumentSet::new()).unwrap();

        assert!(matches!(records.next(), Some(Err(Error::Request(_)))));
        assert!(records.next().is_none());
    }

    #[test]
    fn test_job_lifecycle() {
        let transport = MockTransport::new();
        transport
            .respond(201, "<response><sid>1392687998.313</sid></response>")
            .respond(200, job_entry("DONE", true))
            .respond(200, RESULTS);
        let service = service(transport);

        let mut job = service.create_job("search *", &ArgumentSet::new()).unwrap();
        service.wait_until_done(&mut job).unwrap();
        let count = service.job_results(&job, &ArgumentSet::new()).unwrap().count();

        assert_eq!(Some(crate::DispatchState::Done), job.dispatch_state().unwrap());
        assert_eq!(2, count);
    }

    #[test]
    fn test_export_reads_sections_on_demand() {
        let transport = MockTransport::new();
        transport.respond(
            200,
            r#"<results preview="1">
<result><field k="count"><value><text>1</text></value></field></result>
<result><field k="count"><value><text>2</text></value></field></result>
</results>
<results preview="0"><result><field k="count"><value><text>3</text></value></field></result></results>"#,
        );
        let service = service(transport);
        let mut sections = service.export_search("search *", &ArgumentSet::new()).unwrap();

        {
            let mut first = sections.next_section().unwrap().unwrap();
            let one = first.next().unwrap().unwrap();
            assert!(first.is_preview());
            assert_eq!("1", one.get("count").unwrap().to_string());
        }

        let last = sections.next_section().unwrap().unwrap();
        assert!(!last.is_preview());
        let counts = last
            .map(|record| record.unwrap().get("count").unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(vec!["3"], counts);

        assert!(sections.next_section().unwrap().is_none());
    }
}
