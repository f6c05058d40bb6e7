use crate::atom::AtomEntry;
use crate::convert::FromValue;
use crate::entity::{PropertyBag, ResourceIdentity};
use crate::errors::Error;
use crate::http::{ArgumentSet, Message, RequestError, Response, Severity};
use crate::name::{Namespace, ResourceName};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Attempts made before a resource that keeps answering 204 is reported as not ready.
pub(crate) const READY_ATTEMPTS: usize = 3;
/// Pause between two attempts.
pub(crate) const READY_DELAY: Duration = Duration::from_millis(500);

/// Sends a GET, retrying while the server answers 204 because the resource is not ready yet.
pub(crate) async fn get_ready(identity: &ResourceIdentity, args: &ArgumentSet) -> Result<Response> {
    for attempt in 1..=READY_ATTEMPTS {
        let response = identity.get(args).await?;
        if response.status() != 204 {
            return Ok(response);
        }

        warn!(resource = %identity.name(), attempt, "resource not ready");
        if attempt < READY_ATTEMPTS {
            tokio::time::sleep(READY_DELAY).await;
        }
    }

    Err(RequestError::new(
        204,
        vec![Message::new(
            Severity::Warning,
            format!("Resource {} not ready", identity.name()),
        )],
    )
    .into())
}

/// The cached snapshot of an entity.
#[derive(Debug, Clone)]
pub enum EntityState {
    /// Nothing has been read from the server yet.
    Unpopulated,
    /// The entry last read from the server and its properties.
    Populated(Arc<AtomEntry>, Arc<PropertyBag>),
}

impl EntityState {
    fn populated(entry: AtomEntry) -> Self {
        let properties = PropertyBag::from_content(entry.content());
        EntityState::Populated(Arc::new(entry), Arc::new(properties))
    }
}

/// A single REST resource with a lazily populated snapshot of its properties.
///
/// An entity starts [`Unpopulated`] unless it was read as part of a collection. [`update`] reads it from the server
/// and replaces the snapshot in one assignment, so readers never see a mix of old and new properties.
///
/// [`Unpopulated`]: EntityState::Unpopulated
/// [`update`]: Entity::update
#[derive(Debug, Clone)]
pub struct Entity {
    identity: ResourceIdentity,
    state: EntityState,
}

impl Entity {
    /// Creates an unpopulated entity.
    pub fn new(identity: ResourceIdentity) -> Self {
        Self {
            identity,
            state: EntityState::Unpopulated,
        }
    }

    /// Creates an entity populated from an entry that was already read.
    pub fn from_entry(identity: ResourceIdentity, entry: AtomEntry) -> Self {
        Self {
            identity,
            state: EntityState::populated(entry),
        }
    }

    /// Where the entity lives.
    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    /// The name of the entity.
    pub fn name(&self) -> &ResourceName {
        self.identity.name()
    }

    /// The namespace of the entity.
    pub fn namespace(&self) -> &Namespace {
        self.identity.namespace()
    }

    /// The last segment of the name, such as `main` for `data/indexes/main`.
    pub fn title(&self) -> &str {
        self.identity.title()
    }

    /// The current snapshot.
    pub fn state(&self) -> &EntityState {
        &self.state
    }

    /// True once a snapshot has been read.
    pub fn is_populated(&self) -> bool {
        matches!(self.state, EntityState::Populated(..))
    }

    /// The entry of the current snapshot.
    pub fn entry(&self) -> Result<&AtomEntry> {
        match &self.state {
            EntityState::Populated(entry, _) => Ok(entry),
            EntityState::Unpopulated => Err(self.unpopulated()),
        }
    }

    /// The properties of the current snapshot.
    pub fn properties(&self) -> Result<&PropertyBag> {
        match &self.state {
            EntityState::Populated(_, properties) => Ok(properties),
            EntityState::Unpopulated => Err(self.unpopulated()),
        }
    }

    /// Converts a property of the current snapshot to `T`, or returns `None` if it is absent.
    pub fn get<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromValue + Clone + Send + Sync + 'static,
    {
        Ok(self.properties()?.get(name)?)
    }

    /// Converts a property of the current snapshot to `T`, or returns `default` if it is absent.
    pub fn get_or<T>(&self, name: &str, default: T) -> Result<T>
    where
        T: FromValue + Clone + Send + Sync + 'static,
    {
        Ok(self.properties()?.get_or(name, default)?)
    }

    fn unpopulated(&self) -> Error {
        Error::invalid_operation(format!("{} has not been read from the server yet", self.name()))
    }

    /// Reads the entity from the server and replaces the snapshot.
    ///
    /// A 204 answer means the resource is not ready yet; it is retried twice, 500 ms apart, before failing with a
    /// warning-level [`RequestError`]. Any other failure status fails immediately.
    #[instrument(skip_all, fields(resource = %self.identity.name()))]
    pub async fn update(&mut self) -> Result<()> {
        self.identity.ensure_specific()?;
        let response = get_ready(&self.identity, &ArgumentSet::new()).await?;
        let entry = read_entry(response).await?;
        debug!(title = entry.title(), "entity updated");
        self.state = EntityState::populated(entry);

        Ok(())
    }

    /// Posts `args` to the entity and replaces the snapshot with the entry the server answers with.
    #[instrument(skip_all, fields(resource = %self.identity.name()))]
    pub async fn update_with(&mut self, args: &ArgumentSet) -> Result<()> {
        self.identity.ensure_specific()?;
        let response = self.identity.post(args).await?;
        let entry = read_entry(response).await?;
        self.state = EntityState::populated(entry);

        Ok(())
    }

    /// Deletes the entity on the server.
    #[instrument(skip_all, fields(resource = %self.identity.name()))]
    pub async fn remove(&self) -> Result<()> {
        self.identity.ensure_specific()?;
        self.identity.delete().await?;

        Ok(())
    }
}

/// Reads the single entry a response carries and releases the response.
pub(crate) async fn read_entry(response: Response) -> Result<AtomEntry> {
    let mut cursor = response.into_cursor();
    let entry = AtomEntry::read(&mut cursor).await;
    cursor.close();

    entry
}

/// A typed view of an [`Entity`], such as an index or a search job.
pub trait Resource: Sized + Send + Sync {
    /// Wraps an entity.
    fn from_entity(entity: Entity) -> Self;

    /// The wrapped entity.
    fn entity(&self) -> &Entity;

    /// The wrapped entity, mutably.
    fn entity_mut(&mut self) -> &mut Entity;

    /// The name a member read from `entry` is known by inside its collection. Defaults to the entry title.
    fn entry_name(entry: &AtomEntry) -> &str {
        entry.title()
    }
}

impl Resource for Entity {
    fn from_entity(entity: Entity) -> Self {
        entity
    }

    fn entity(&self) -> &Entity {
        self
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self
    }
}

/// Declares a [`Resource`] newtype over [`Entity`] that dereferences to it.
///
/// `entry_name = path` names collection members with `path` instead of [`Resource::entry_name`]'s default.
macro_rules! resource_over_entity {
    ($(#[$meta:meta])* $name:ident) => {
        resource_over_entity!(@declare $(#[$meta])* $name {});
    };
    ($(#[$meta:meta])* $name:ident, entry_name = $entry_name:path) => {
        resource_over_entity!(@declare $(#[$meta])* $name {
            fn entry_name(entry: &$crate::atom::AtomEntry) -> &str {
                $entry_name(entry)
            }
        });
    };
    (@declare $(#[$meta:meta])* $name:ident { $($entry_name:tt)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name($crate::entity::Entity);

        impl $crate::entity::Resource for $name {
            fn from_entity(entity: $crate::entity::Entity) -> Self {
                Self(entity)
            }

            fn entity(&self) -> &$crate::entity::Entity {
                &self.0
            }

            fn entity_mut(&mut self) -> &mut $crate::entity::Entity {
                &mut self.0
            }

            $($entry_name)*
        }

        impl std::ops::Deref for $name {
            type Target = $crate::entity::Entity;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}

pub(crate) use resource_over_entity;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Context;
    use crate::tests::{MockTransport, JOB_ENTRY};
    use url::Url;

    fn entity(transport: Arc<MockTransport>, namespace: Namespace) -> Entity {
        let context = Context::new(transport, Url::parse("https://localhost:8089").unwrap());
        Entity::new(ResourceIdentity::new(
            context,
            namespace,
            "search/jobs/1392687998.313".parse().unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_update_populates_snapshot() {
        let transport = MockTransport::new();
        transport.respond(200, JOB_ENTRY);
        let mut entity = entity(transport.clone(), Namespace::default());

        assert!(!entity.is_populated());
        entity.update().await.unwrap();

        assert_eq!("search *", entity.entry().unwrap().title());
        assert_eq!(Some(42), entity.get::<u64>("EventCount").unwrap());
        assert_eq!(
            "https://localhost:8089/services/search/jobs/1392687998.313",
            transport.requests()[0].url.as_str()
        );
    }

    #[tokio::test]
    async fn test_unpopulated_properties_are_invalid() {
        let entity = entity(MockTransport::new(), Namespace::default());
        let actual_error = entity.properties().expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::InvalidOperation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_not_ready_then_succeeds() {
        let transport = MockTransport::new();
        transport.respond(204, "").respond(204, "").respond(200, JOB_ENTRY);
        let mut entity = entity(transport.clone(), Namespace::default());

        entity.update().await.unwrap();

        assert_eq!(3, transport.requests().len());
        assert!(entity.is_populated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_not_ready_answers() {
        let transport = MockTransport::new();
        transport.respond(204, "").respond(204, "").respond(204, "");
        let mut entity = entity(transport.clone(), Namespace::default());
        let started = tokio::time::Instant::now();

        let actual_error = entity.update().await.expect_err("Operation must fail");

        assert_eq!(3, transport.requests().len());
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(matches!(
            &actual_error,
            Error::Request(e) if e.status() == 204 && e.severity() == Some(Severity::Warning)
        ));
        assert_eq!(
            "WARN: Resource search/jobs/1392687998.313 not ready",
            actual_error.to_string()
        );
        assert!(!entity.is_populated());
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let transport = MockTransport::new();
        transport.respond(
            404,
            r#"<response><messages><msg type="ERROR">Unknown sid.</msg></messages></response>"#,
        );
        let mut entity = entity(transport.clone(), Namespace::default());

        let actual_error = entity.update().await.expect_err("Operation must fail");

        assert_eq!(1, transport.requests().len());
        assert_eq!("ERROR: Unknown sid.", actual_error.to_string());
    }

    #[tokio::test]
    async fn test_wildcard_namespace_is_rejected() {
        let transport = MockTransport::new();
        let mut entity = entity(transport.clone(), Namespace::new("-", "search"));

        let actual_error = entity.update().await.expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::InvalidOperation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_keeps_previous_snapshot() {
        let transport = MockTransport::new();
        transport.respond(200, JOB_ENTRY).respond(200, "<entry><title>broken</title></entry>");
        let mut entity = entity(transport, Namespace::default());

        entity.update().await.unwrap();
        entity.update().await.expect_err("Operation must fail");

        assert_eq!("search *", entity.entry().unwrap().title());
    }
}
