use crate::entity::resource_over_entity;
use crate::http::ArgumentSet;
use crate::Result;

resource_over_entity!(
    /// An event index at `data/indexes/<name>`.
    Index
);

impl Index {
    /// Number of events in the index.
    pub fn total_event_count(&self) -> Result<u64> {
        self.get_or("TotalEventCount", 0)
    }

    /// True when the index does not accept events.
    pub fn is_disabled(&self) -> Result<bool> {
        self.get_or("Disabled", false)
    }

    /// Where hot and warm buckets are stored.
    pub fn home_path(&self) -> Result<Option<String>> {
        self.get("HomePath")
    }

    /// Size limit of the index in megabytes.
    pub fn max_total_data_size_mb(&self) -> Result<Option<u64>> {
        self.get("MaxTotalDataSizeMB")
    }

    /// Current size of the index in megabytes.
    pub fn current_db_size_mb(&self) -> Result<u64> {
        self.get_or("CurrentDBSizeMB", 0)
    }

    async fn toggle(&mut self, action: &str) -> Result<()> {
        self.identity().ensure_specific()?;
        self.identity().child(action)?.post(&ArgumentSet::new()).await?;
        self.update().await
    }

    /// Enables the index and reads it again.
    pub async fn enable(&mut self) -> Result<()> {
        self.toggle("enable").await
    }

    /// Disables the index and reads it again.
    pub async fn disable(&mut self) -> Result<()> {
        self.toggle("disable").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, Resource, ResourceIdentity};
    use crate::http::Context;
    use crate::name::Namespace;
    use crate::tests::{MockTransport, INDEXES_FEED};
    use url::Url;

    #[tokio::test]
    async fn test_disable_posts_then_reads_again() {
        let transport = MockTransport::new();
        transport.respond(200, "<response/>").respond(200, INDEXES_FEED);
        let context = Context::new(transport.clone(), Url::parse("https://localhost:8089").unwrap());
        let mut index = Index::from_entity(Entity::new(ResourceIdentity::new(
            context,
            Namespace::new("nobody", "system"),
            "data/indexes/_internal".parse().unwrap(),
        )));

        index.disable().await.unwrap();
        let requests = transport.requests();

        assert_eq!(
            "https://localhost:8089/servicesNS/nobody/system/data/indexes/_internal/disable",
            requests[0].url.as_str()
        );
        assert_eq!(1024, index.total_event_count().unwrap());
        assert!(!index.is_disabled().unwrap());
        assert_eq!(Some(500000), index.max_total_data_size_mb().unwrap());
        assert_eq!(None, index.home_path().unwrap());
    }
}
