use crate::config::ServiceConfig;
use crate::entity::{read_entry, Entity, EntityCollection, Resource, ResourceIdentity};
use crate::errors::ParseError;
use crate::http::{ArgumentSet, Context, ReqwestTransport, ToArguments, Transport};
use crate::name::{Namespace, ResourceName};
use crate::resources::{
    configuration_file, read_sid, Application, ConfigurationStanza, Index, Job, SavedSearch, ServerInfo,
};
use crate::results::{SearchResultStream, SearchResultsReader};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Entry point to the REST API of one server.
///
/// Every resource the service hands out shares its [`Context`], so the session key set by [`login`] authorizes them
/// all. Resources are created in the namespace of the [`ServiceConfig`] the service was built from.
///
/// # Examples
///
/// ```no_run
/// # use splunk_sdk::{ArgumentSet, Service, ServiceConfig};
/// # #[tokio::main]
/// # async fn main() -> splunk_sdk::Result<()> {
/// let service = Service::new(&ServiceConfig::default())?;
/// service.login("admin", "changeme").await?;
///
/// let mut results = service.oneshot_search("search index=_internal | head 10", &ArgumentSet::new()).await?;
/// while let Some(record) = results.read_record().await? {
///     println!("{:?}", record.get("host"));
/// }
/// # Ok(())
/// # }
/// ```
///
/// [`login`]: Service::login
#[derive(Debug, Clone)]
pub struct Service {
    context: Context,
    namespace: Namespace,
}

impl Service {
    /// Creates a service sending requests through a [`ReqwestTransport`].
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;

        Self::with_transport(Arc::new(transport), config)
    }

    /// Creates a service sending requests through `transport`.
    pub fn with_transport(transport: Arc<dyn Transport>, config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            context: Context::new(transport, config.base_url()?),
            namespace: config.namespace.clone(),
        })
    }

    /// The context shared by every resource of this service.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The namespace resources are created in.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn identity(&self, name: ResourceName) -> ResourceIdentity {
        ResourceIdentity::new(self.context.clone(), self.namespace.clone(), name)
    }

    async fn collection<T: Resource>(&self, name: ResourceName) -> Result<EntityCollection<T>> {
        let mut collection = EntityCollection::new(self.identity(name));
        collection.update().await?;

        Ok(collection)
    }

    async fn entity<T: Resource>(&self, name: ResourceName) -> Result<T> {
        let mut entity = Entity::new(self.identity(name));
        entity.update().await?;

        Ok(T::from_entity(entity))
    }

    async fn create<T: Resource>(&self, collection: ResourceName, name: &str, args: ArgumentSet) -> Result<T> {
        let response = self.context.post(&self.namespace, &collection, &args).await?;
        let entry = read_entry(response).await?;
        debug!(resource = %collection, name, "resource created");

        Ok(T::from_entity(Entity::from_entry(self.identity(collection.join(name)?), entry)))
    }

    async fn remove(&self, name: ResourceName) -> Result<()> {
        Entity::new(self.identity(name)).remove().await
    }

    /// Logs in and authorizes every later request with the session key the server answers with.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let args = ArgumentSet::new().with("username", username).with("password", password);
        let response = self
            .context
            .post(&Namespace::default(), &ResourceName::new(["auth", "login"])?, &args)
            .await?;

        let mut cursor = response.into_cursor();
        let session_key = match cursor.read_to_following(&["sessionKey"]).await? {
            Some(_) => cursor.read_text().await?.trim().to_owned(),
            None => return Err(ParseError::missing("sessionKey", "response").into()),
        };
        cursor.close();

        self.context.set_session_key(Some(&session_key));
        info!("logged in");

        Ok(())
    }

    /// Forgets the session key. Later requests are sent unauthenticated.
    pub fn logoff(&self) {
        self.context.set_session_key(None);
    }

    /// Reads `server/info`.
    pub async fn server_info(&self) -> Result<ServerInfo> {
        self.entity(ResourceName::new(["server", "info"])?).await
    }

    /// Reads the installed applications.
    pub async fn applications(&self) -> Result<EntityCollection<Application>> {
        self.collection(ResourceName::new(["apps", "local"])?).await
    }

    /// Reads one installed application.
    pub async fn application(&self, name: &str) -> Result<Application> {
        self.entity(ResourceName::new(["apps", "local", name])?).await
    }

    /// Reads the indexes.
    pub async fn indexes(&self) -> Result<EntityCollection<Index>> {
        self.collection(ResourceName::new(["data", "indexes"])?).await
    }

    /// Reads one index.
    pub async fn index(&self, name: &str) -> Result<Index> {
        self.entity(ResourceName::new(["data", "indexes", name])?).await
    }

    /// Creates an index. `args` may carry settings such as `maxTotalDataSizeMB`.
    #[instrument(skip(self, args))]
    pub async fn create_index(&self, name: &str, args: &impl ToArguments) -> Result<Index> {
        let mut form = ArgumentSet::new().with("name", name);
        form.extend(&args.to_arguments());

        self.create(ResourceName::new(["data", "indexes"])?, name, form).await
    }

    /// Deletes an index.
    pub async fn remove_index(&self, name: &str) -> Result<()> {
        self.remove(ResourceName::new(["data", "indexes", name])?).await
    }

    /// Reads the saved searches.
    pub async fn saved_searches(&self) -> Result<EntityCollection<SavedSearch>> {
        self.collection(ResourceName::new(["saved", "searches"])?).await
    }

    /// Reads one saved search.
    pub async fn saved_search(&self, name: &str) -> Result<SavedSearch> {
        self.entity(ResourceName::new(["saved", "searches", name])?).await
    }

    /// Saves `search` under `name`.
    #[instrument(skip(self, search, args))]
    pub async fn create_saved_search(&self, name: &str, search: &str, args: &impl ToArguments) -> Result<SavedSearch> {
        let mut form = ArgumentSet::new().with("name", name).with("search", search);
        form.extend(&args.to_arguments());

        self.create(ResourceName::new(["saved", "searches"])?, name, form).await
    }

    /// Changes the settings of a saved search and returns it as the server answers.
    pub async fn update_saved_search(&self, name: &str, args: &impl ToArguments) -> Result<SavedSearch> {
        let mut saved_search = SavedSearch::from_entity(Entity::new(
            self.identity(ResourceName::new(["saved", "searches", name])?),
        ));
        saved_search.update_with(&args.to_arguments()).await?;

        Ok(saved_search)
    }

    /// Deletes a saved search.
    pub async fn remove_saved_search(&self, name: &str) -> Result<()> {
        self.remove(ResourceName::new(["saved", "searches", name])?).await
    }

    /// Runs a saved search without reading it first.
    pub async fn dispatch_saved_search(&self, name: &str, args: &impl ToArguments) -> Result<Job> {
        SavedSearch::from_entity(Entity::new(
            self.identity(ResourceName::new(["saved", "searches", name])?),
        ))
        .dispatch(args)
        .await
    }

    /// Reads the search jobs.
    pub async fn jobs(&self) -> Result<EntityCollection<Job>> {
        self.collection(ResourceName::new(["search", "jobs"])?).await
    }

    /// Reads one search job.
    pub async fn job(&self, sid: &str) -> Result<Job> {
        let mut job = Job::for_sid(self.context.clone(), self.namespace.clone(), sid)?;
        job.update().await?;

        Ok(job)
    }

    /// Starts a search job and returns it unpopulated. Use [`Job::wait_until_done`] before reading its results.
    #[instrument(skip(self, args))]
    pub async fn create_job(&self, search: &str, args: &impl ToArguments) -> Result<Job> {
        let mut form = ArgumentSet::new().with("search", search);
        form.extend(&args.to_arguments());
        let response = self
            .context
            .post(&self.namespace, &ResourceName::new(["search", "jobs"])?, &form)
            .await?;
        let sid = read_sid(response).await?;
        debug!(sid = sid.as_str(), "job created");

        Job::for_sid(self.context.clone(), self.namespace.clone(), &sid)
    }

    /// Runs a search to completion on the server and streams its results from the same response.
    #[instrument(skip(self, args))]
    pub async fn oneshot_search(&self, search: &str, args: &impl ToArguments) -> Result<SearchResultStream<'static>> {
        let mut form = ArgumentSet::new().with("search", search).with("exec_mode", "oneshot");
        form.extend(&args.to_arguments());
        let response = self
            .context
            .post(&self.namespace, &ResourceName::new(["search", "jobs"])?, &form)
            .await?;

        SearchResultStream::new(response.into_cursor()).await
    }

    /// Runs a search and reads the sections the server exports while it runs, previews first and final results
    /// last.
    #[instrument(skip(self, args))]
    pub async fn export_search(&self, search: &str, args: &impl ToArguments) -> Result<SearchResultsReader> {
        let mut query = ArgumentSet::new().with("search", search);
        query.extend(&args.to_arguments());
        let response = self
            .context
            .get(&self.namespace, &ResourceName::new(["search", "jobs", "export"])?, &query)
            .await?;

        Ok(SearchResultsReader::new(response.into_cursor()))
    }

    /// Reads the stanzas of the configuration file `file`, such as `props`.
    pub async fn stanzas(&self, file: &str) -> Result<EntityCollection<ConfigurationStanza>> {
        self.collection(configuration_file(file)?).await
    }

    /// Reads one stanza of a configuration file.
    pub async fn stanza(&self, file: &str, name: &str) -> Result<ConfigurationStanza> {
        self.entity(configuration_file(file)?.join(name)?).await
    }

    /// Adds an empty stanza to a configuration file.
    pub async fn create_stanza(&self, file: &str, name: &str) -> Result<ConfigurationStanza> {
        self.create(configuration_file(file)?, name, ArgumentSet::new().with("name", name))
            .await
    }

    /// Writes the settings in `args` to a stanza and returns it as the server answers.
    pub async fn update_stanza(&self, file: &str, name: &str, args: &impl ToArguments) -> Result<ConfigurationStanza> {
        let mut stanza =
            ConfigurationStanza::from_entity(Entity::new(self.identity(configuration_file(file)?.join(name)?)));
        stanza.update_with(&args.to_arguments()).await?;

        Ok(stanza)
    }

    /// Deletes a stanza from a configuration file.
    pub async fn remove_stanza(&self, file: &str, name: &str) -> Result<()> {
        self.remove(configuration_file(file)?.join(name)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::http::Method;
    use crate::resources::SearchArgs;
    use crate::tests::{job_entry, MockTransport, INDEXES_FEED, JOB_ENTRY, RESULTS};
    use tracing_test::traced_test;

    fn service(transport: Arc<MockTransport>) -> Service {
        Service::with_transport(
            transport,
            &ServiceConfig::default().with_namespace(Namespace::new("admin", "search")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_authorizes_later_requests() {
        let transport = MockTransport::new();
        transport
            .respond(200, "<response>\n  <sessionKey>192fd3e4</sessionKey>\n</response>")
            .respond(200, job_entry("DONE", true));
        let service = service(transport.clone());

        service.login("admin", "changeme").await.unwrap();
        service.job("1392687998.313").await.unwrap();
        let requests = transport.requests();

        assert_eq!("https://localhost:8089/services/auth/login", requests[0].url.as_str());
        assert_eq!(Some("username=admin&password=changeme".to_owned()), requests[0].form);
        assert_eq!(None, requests[0].authorization);
        assert_eq!(Some("Splunk 192fd3e4".to_owned()), requests[1].authorization);
        assert_eq!(Some("192fd3e4".to_owned()), service.context().session_key());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_session() {
        let transport = MockTransport::new();
        transport.respond(
            401,
            r#"<response><messages><msg type="WARN">Login failed</msg></messages></response>"#,
        );
        let service = service(transport);

        let actual_error = service
            .login("admin", "wrong")
            .await
            .expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Request(e) if e.status() == 401));
        assert_eq!(None, service.context().session_key());
    }

    #[tokio::test]
    async fn test_logoff_clears_session_key() {
        let transport = MockTransport::new();
        let service = service(transport);
        service.context().set_session_key(Some("192fd3e4"));

        service.logoff();

        assert_eq!(None, service.context().session_key());
    }

    #[tokio::test]
    async fn test_indexes_reads_collection() {
        let transport = MockTransport::new();
        transport.respond(200, INDEXES_FEED);
        let service = service(transport.clone());

        let indexes = service.indexes().await.unwrap();
        let internal = indexes.find("_internal").unwrap().unwrap();

        assert_eq!(2, indexes.len().unwrap());
        assert_eq!(1024, internal.total_event_count().unwrap());
        assert_eq!(
            "https://localhost:8089/servicesNS/admin/search/data/indexes",
            transport.requests()[0].url.as_str()
        );
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_index_not_ready_is_reported() {
        let transport = MockTransport::new();
        transport.respond(204, "").respond(204, "").respond(204, "");
        let service = service(transport);

        let actual_error = service.index("main").await.expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Request(e) if e.status() == 204));
        assert!(logs_contain("resource not ready"));
    }

    #[tokio::test]
    async fn test_create_index_posts_name_and_settings() {
        let transport = MockTransport::new();
        transport.respond(201, INDEXES_FEED);
        let service = service(transport.clone());

        let index = service
            .create_index("_internal", &ArgumentSet::new().with("maxTotalDataSizeMB", 500000))
            .await
            .unwrap();
        let request = transport.requests().remove(0);

        assert_eq!(Method::Post, request.method);
        assert_eq!(Some("name=_internal&maxTotalDataSizeMB=500000".to_owned()), request.form);
        assert_eq!("data/indexes/_internal", index.name().to_string());
        assert!(index.is_populated());
    }

    #[tokio::test]
    async fn test_remove_saved_search_sends_delete() {
        let transport = MockTransport::new();
        transport.respond(200, "<response/>");
        let service = service(transport.clone());

        service.remove_saved_search("Errors in the last hour").await.unwrap();
        let request = transport.requests().remove(0);

        assert_eq!(Method::Delete, request.method);
        assert_eq!(
            "https://localhost:8089/servicesNS/admin/search/saved/searches/Errors%20in%20the%20last%20hour",
            request.url.as_str()
        );
    }

    #[tokio::test]
    async fn test_wildcard_namespace_rejects_removal() {
        let transport = MockTransport::new();
        let service = Service::with_transport(
            transport.clone(),
            &ServiceConfig::default().with_namespace(Namespace::new("-", "-")),
        )
        .unwrap();

        let actual_error = service.remove_index("main").await.expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::InvalidOperation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_job_returns_unpopulated_job() {
        let transport = MockTransport::new();
        transport
            .respond(201, "<response><sid>1392687998.313</sid></response>")
            .respond(200, JOB_ENTRY);
        let service = service(transport.clone());

        let mut job = service
            .create_job("search index=_internal", &SearchArgs::new().with_earliest_time("-1h"))
            .await
            .unwrap();

        assert!(!job.is_populated());
        assert_eq!(
            Some("search=search+index%3D_internal&earliest_time=-1h".to_owned()),
            transport.requests()[0].form
        );

        job.update().await.unwrap();

        assert_eq!("1392687998.313", job.sid());
        assert!(job.is_done().unwrap());
    }

    #[tokio::test]
    async fn test_oneshot_search_streams_response() {
        let transport = MockTransport::new();
        transport.respond(200, RESULTS);
        let service = service(transport.clone());

        let mut results = service
            .oneshot_search("search index=_internal", &ArgumentSet::new())
            .await
            .unwrap();
        let record = results.read_record().await.unwrap().unwrap();

        assert_eq!("Dnoble-WIN10", record.get("host").unwrap().to_string());
        assert_eq!(
            Some("oneshot"),
            url::form_urlencoded::parse(transport.requests()[0].form.as_deref().unwrap().as_bytes())
                .find(|(name, _)| name == "exec_mode")
                .map(|(_, value)| value.into_owned())
                .as_deref()
        );
    }

    #[tokio::test]
    async fn test_export_search_reads_sections() {
        let transport = MockTransport::new();
        transport.respond(
            200,
            r#"<results preview="1"><result><field k="count"><value><text>1</text></value></field></result></results>
<results preview="0"><result><field k="count"><value><text>2</text></value></field></result></results>"#,
        );
        let service = service(transport.clone());

        let mut reader = service
            .export_search("search index=_internal | stats count", &ArgumentSet::new())
            .await
            .unwrap();
        let mut counts = vec![];
        while let Some(mut stream) = reader.next_stream().await.unwrap() {
            while let Some(record) = stream.read_record().await.unwrap() {
                counts.push((stream.is_preview(), record.get("count").unwrap().to_string()));
            }
        }

        assert_eq!(vec![(true, "1".to_owned()), (false, "2".to_owned())], counts);
        assert_eq!(Method::Get, transport.requests()[0].method);
        assert!(transport.requests()[0].url.path().ends_with("/search/jobs/export"));
    }

    #[tokio::test]
    async fn test_update_stanza_posts_settings() {
        let transport = MockTransport::new();
        transport.respond(
            200,
            r#"<entry>
  <title>access_combined</title>
  <id>https://localhost:8089/servicesNS/admin/search/configs/conf-props/access_combined</id>
  <updated>2014-02-17T17:46:39-08:00</updated>
  <author><name>admin</name></author>
  <content type="text/xml"><dict><key name="maxDist">40</key></dict></content>
</entry>"#,
        );
        let service = service(transport.clone());

        let stanza = service
            .update_stanza("props", "access_combined", &ArgumentSet::new().with("maxDist", 40))
            .await
            .unwrap();

        assert_eq!(Some("40".to_owned()), stanza.setting("maxDist").unwrap());
        assert!(transport.requests()[0]
            .url
            .as_str()
            .ends_with("/servicesNS/admin/search/configs/conf-props/access_combined"));
    }
}
