use crate::atom::{AtomEntry, AtomFeed, Value};
use crate::entity::{get_ready, Entity, Resource, ResourceIdentity};
use crate::errors::Error;
use crate::http::ArgumentSet;
use crate::name::Namespace;
use crate::Result;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};
use tracing::{debug, instrument};

struct Snapshot<T> {
    feed: Arc<AtomFeed>,
    cells: Vec<OnceLock<T>>,
}

/// An ordered, read-only list of resources backed by one Atom feed.
///
/// The typed resource for an entry is only built the first time it is accessed. Its namespace comes from the
/// `eai:acl` owner and app of the entry, falling back to the namespace of the collection, and its name is the name of
/// the collection followed by the entry title.
pub struct EntityCollection<T = Entity> {
    identity: ResourceIdentity,
    args: ArgumentSet,
    snapshot: Option<Snapshot<T>>,
    resource: PhantomData<fn() -> T>,
}

impl<T: Resource> EntityCollection<T> {
    /// Creates an unpopulated collection.
    pub fn new(identity: ResourceIdentity) -> Self {
        Self {
            identity,
            args: ArgumentSet::new(),
            snapshot: None,
            resource: PhantomData,
        }
    }

    /// Sets the arguments every [`update`] sends, such as `count` or `search`.
    ///
    /// [`update`]: EntityCollection::update
    pub fn with_args(mut self, args: ArgumentSet) -> Self {
        self.args = args;
        self
    }

    /// Where the collection lives.
    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    /// True once the collection has been read.
    pub fn is_populated(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Reads the collection from the server and replaces the snapshot, retrying while it is not ready.
    #[instrument(skip_all, fields(resource = %self.identity.name()))]
    pub async fn update(&mut self) -> Result<()> {
        let response = get_ready(&self.identity, &self.args).await?;
        let mut cursor = response.into_cursor();
        let feed = AtomFeed::read(&mut cursor).await;
        cursor.close();
        let feed = feed?;
        debug!(entries = feed.entries().len(), "collection updated");

        let cells = feed.entries().iter().map(|_| OnceLock::new()).collect();
        self.snapshot = Some(Snapshot {
            feed: Arc::new(feed),
            cells,
        });

        Ok(())
    }

    fn snapshot(&self) -> Result<&Snapshot<T>> {
        self.snapshot.as_ref().ok_or_else(|| {
            Error::invalid_operation(format!("{} has not been read from the server yet", self.identity.name()))
        })
    }

    /// The feed of the current snapshot.
    pub fn feed(&self) -> Result<&AtomFeed> {
        Ok(&self.snapshot()?.feed)
    }

    /// Number of resources in the current snapshot.
    pub fn len(&self) -> Result<usize> {
        Ok(self.snapshot()?.cells.len())
    }

    /// True when the current snapshot holds no resource.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// The resource at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Result<Option<&T>> {
        let snapshot = self.snapshot()?;
        let (Some(cell), Some(entry)) = (snapshot.cells.get(index), snapshot.feed.entries().get(index)) else {
            return Ok(None);
        };
        if let Some(resource) = cell.get() {
            return Ok(Some(resource));
        }

        let resource = T::from_entity(self.materialize(entry)?);
        Ok(Some(cell.get_or_init(|| resource)))
    }

    /// The first resource whose entry has the given title.
    pub fn find(&self, title: &str) -> Result<Option<&T>> {
        let snapshot = self.snapshot()?;
        match snapshot.feed.entries().iter().position(|entry| entry.title() == title) {
            Some(index) => self.get(index),
            None => Ok(None),
        }
    }

    /// Iterates over all resources of the current snapshot.
    pub fn iter(&self) -> Result<impl Iterator<Item = Result<&T>> + '_> {
        let len = self.len()?;
        Ok((0..len).filter_map(move |index| self.get(index).transpose()))
    }

    fn materialize(&self, entry: &AtomEntry) -> Result<Entity> {
        let acl = entry.content().and_then(|content| content.lookup(&["Eai", "Acl"]));
        let owner = acl.and_then(|acl| acl.get("Owner")).and_then(Value::as_str);
        let app = acl.and_then(|acl| acl.get("App")).and_then(Value::as_str);
        let namespace = match (owner, app) {
            (Some(owner), Some(app)) => Namespace::new(owner, app),
            _ => self.identity.namespace().clone(),
        };
        let name = self.identity.name().join(T::entry_name(entry))?;
        let identity = ResourceIdentity::new(self.identity.context().clone(), namespace, name);

        Ok(Entity::from_entry(identity, entry.clone()))
    }
}

impl<T> Debug for EntityCollection<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCollection")
            .field("identity", &self.identity)
            .field("args", &self.args)
            .field("entries", &self.snapshot.as_ref().map(|snapshot| snapshot.cells.len()))
            .finish()
    }
}
