use crate::atom::capitalize;
use crate::entity::resource_over_entity;
use crate::name::ResourceName;
use crate::Result;

resource_over_entity!(
    /// One stanza of a configuration file, at `configs/conf-<file>/<stanza>`.
    ConfigurationStanza
);

impl ConfigurationStanza {
    /// The stanza name.
    pub fn stanza(&self) -> &str {
        self.title()
    }

    /// The value of the setting `name`, as written in the configuration file.
    pub fn setting(&self, name: &str) -> Result<Option<String>> {
        self.get(&capitalize(name))
    }
}

/// The collection name of a configuration file, such as `configs/conf-props` for `props`.
pub(crate) fn configuration_file(file: &str) -> Result<ResourceName> {
    ResourceName::new(["configs".to_owned(), format!("conf-{}", file)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomEntry;
    use crate::entity::{Entity, Resource, ResourceIdentity};
    use crate::http::Context;
    use crate::name::Namespace;
    use crate::tests::MockTransport;
    use crate::xml::XmlCursor;
    use url::Url;

    #[tokio::test]
    async fn test_reads_settings_by_file_name() {
        let mut cursor = XmlCursor::new(
            r#"<entry>
  <title>access_combined</title>
  <id>https://localhost:8089/servicesNS/nobody/system/configs/conf-props/access_combined</id>
  <updated>2014-02-17T17:46:39-08:00</updated>
  <author><name>nobody</name></author>
  <content type="text/xml"><dict>
    <key name="SHOULD_LINEMERGE">False</key>
    <key name="maxDist">28</key>
  </dict></content>
</entry>"#,
        );
        let entry = AtomEntry::read(&mut cursor).await.unwrap();
        let context = Context::new(MockTransport::new(), Url::parse("https://localhost:8089").unwrap());
        let name = configuration_file("props").unwrap().join("access_combined").unwrap();
        let stanza = ConfigurationStanza::from_entity(Entity::from_entry(
            ResourceIdentity::new(context, Namespace::new("nobody", "system"), name),
            entry,
        ));

        assert_eq!("access_combined", stanza.stanza());
        assert_eq!("configs/conf-props/access_combined", stanza.name().to_string());
        assert_eq!(Some("28".to_owned()), stanza.setting("maxDist").unwrap());
        assert_eq!(Some("False".to_owned()), stanza.setting("SHOULD_LINEMERGE").unwrap());
        assert_eq!(None, stanza.setting("TIME_FORMAT").unwrap());
    }
}
