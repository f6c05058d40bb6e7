//! Entities and collections: REST resources paired with the snapshot last read from the server.

mod collection;
#[allow(clippy::module_inception)]
mod entity;
mod identity;
mod properties;

pub use self::collection::EntityCollection;
pub(crate) use self::entity::{get_ready, read_entry, resource_over_entity};
pub use self::entity::{Entity, EntityState, Resource};
pub use self::identity::ResourceIdentity;
pub use self::properties::PropertyBag;
