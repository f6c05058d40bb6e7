use crate::atom::parser::{
    format_timestamp, read_author, read_link, read_timestamp, read_trimmed, read_url, read_value, resolve_links,
};
use crate::atom::Value;
use crate::errors::ParseError;
use crate::xml::{Node, XmlCursor};
use crate::Result;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use tracing::debug;
use url::Url;

/// One resource, parsed from an Atom `<entry>` element.
///
/// Entries are immutable once parsed. Their `content` carries the resource properties as a [`Value`] tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomEntry {
    title: String,
    author: String,
    id: Url,
    published: DateTime<FixedOffset>,
    updated: DateTime<FixedOffset>,
    links: BTreeMap<String, Url>,
    content: Option<Value>,
}

impl AtomEntry {
    /// Title of the entry, which is the name of the resource it describes.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Name of the author, usually the owner of the resource.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Absolute URL identifying the resource.
    pub fn id(&self) -> &Url {
        &self.id
    }

    /// When the resource was created. Equal to [`updated`] when the server does not report it.
    ///
    /// [`updated`]: AtomEntry::updated
    pub fn published(&self) -> DateTime<FixedOffset> {
        self.published
    }

    /// When the resource was last changed.
    pub fn updated(&self) -> DateTime<FixedOffset> {
        self.updated
    }

    /// Absolute links keyed by relation, such as `alternate`, `edit` or `results`.
    pub fn links(&self) -> &BTreeMap<String, Url> {
        &self.links
    }

    /// Properties of the resource, if the entry has any content.
    pub fn content(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    /// Reads the first entry of the document, which may be a lone `<entry>` or a `<feed>` wrapping one.
    ///
    /// # Examples
    ///
    /// ```
    /// # use splunk_sdk::{AtomEntry, XmlCursor};
    /// # #[tokio::main]
    /// # async fn main() -> splunk_sdk::Result<()> {
    /// let mut cursor = XmlCursor::new(r#"<entry xmlns="http://www.w3.org/2005/Atom">
    ///   <title>main</title>
    ///   <id>https://localhost:8089/services/data/indexes/main</id>
    ///   <updated>2014-02-17T17:46:39-08:00</updated>
    ///   <author><name>nobody</name></author>
    /// </entry>"#);
    /// let entry = AtomEntry::read(&mut cursor).await?;
    ///
    /// assert_eq!("main", entry.title());
    /// assert_eq!(None, entry.content());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn read(cursor: &mut XmlCursor) -> Result<Self> {
        let root = cursor
            .read_to_following(&["feed", "entry"])
            .await?
            .ok_or_else(|| ParseError::missing("entry", "document"))?;

        if root.local_name() == "feed" {
            cursor
                .read_to_following(&["entry"])
                .await?
                .ok_or_else(|| ParseError::missing("entry", "feed"))?;
        }

        Self::read_element(cursor).await
    }

    /// Reads an entry whose `<entry>` start tag was consumed last, including its end tag.
    pub(crate) async fn read_element(cursor: &mut XmlCursor) -> Result<Self> {
        let mut title = None;
        let mut author = None;
        let mut id = None;
        let mut published = None;
        let mut updated = None;
        let mut links = vec![];
        let mut content = None;

        loop {
            match cursor.next_significant().await? {
                Node::Start(element) => match element.local_name() {
                    "title" => title = Some(read_trimmed(cursor).await?),
                    "author" => author = Some(read_author(cursor).await?),
                    "id" => id = Some(read_url(cursor).await?),
                    "published" => published = Some(read_timestamp(cursor).await?),
                    "updated" => updated = Some(read_timestamp(cursor).await?),
                    "link" => links.push(read_link(cursor, &element).await?),
                    "content" => content = read_value(cursor, "content").await?,
                    other => return Err(ParseError::unexpected(other, "entry").into()),
                },
                Node::End(_) => break,
                Node::Text(text) => {
                    return Err(ParseError::at("entry", format!("unexpected text {:?} in <entry>", text)).into())
                }
                Node::Eof => return Err(ParseError::end_of_document("entry").into()),
            }
        }

        let title = title.ok_or_else(|| ParseError::missing("title", "entry"))?;
        let author = author.ok_or_else(|| ParseError::missing("author", "entry"))?;
        let id = id.ok_or_else(|| ParseError::missing("id", "entry"))?;
        let updated = updated.ok_or_else(|| ParseError::missing("updated", "entry"))?;
        let links = resolve_links(&id, links)?;
        debug!(entry.id = %id, links = links.len(), "parsed atom entry");

        Ok(Self {
            title,
            author,
            published: published.unwrap_or(updated),
            updated,
            links,
            content,
            id,
        })
    }
}

impl Display for AtomEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AtomEntry(Title={}, Author={}, Id={}, Published={}, Updated={})",
            self.title,
            self.author,
            self.id,
            format_timestamp(&self.published),
            format_timestamp(&self.updated)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::tests::JOB_ENTRY;

    #[tokio::test]
    async fn test_formats_minimal_entry_summary() {
        let mut cursor = XmlCursor::new(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>jobs</title>
  <id>https://localhost:8089/services/search/jobs</id>
  <updated>2014-02-17T17:46:39Z</updated>
  <entry>
    <title>search *</title>
    <author><name>admin</name></author>
    <id>https://localhost:8089/services/search/jobs/1392687998.313</id>
    <updated>2014-02-17T17:46:39Z</updated>
  </entry>
</feed>"#,
        );
        let entry = AtomEntry::read(&mut cursor).await.unwrap();

        assert_eq!(
            "AtomEntry(Title=search *, Author=admin, Id=https://localhost:8089/services/search/jobs/1392687998.313, \
             Published=2/17/2014 5:46:39 PM, Updated=2/17/2014 5:46:39 PM)",
            entry.to_string()
        );
    }

    #[tokio::test]
    async fn test_reads_links_and_content() {
        let mut cursor = XmlCursor::new(JOB_ENTRY);
        let entry = AtomEntry::read(&mut cursor).await.unwrap();

        assert_eq!(4, entry.links().len());
        assert_eq!(
            "https://localhost:8089/services/search/jobs/1392687998.313/results",
            entry.links()["results"].as_str()
        );
        assert_eq!(
            "https://localhost:8089/services/search/jobs/1392687998.313/search.log",
            entry.links()["search.log"].as_str()
        );
        let content = entry.content().unwrap();
        assert_eq!(Some("DONE"), content.get("DispatchState").and_then(Value::as_str));
        assert_eq!(
            Some(&Value::List(vec![Value::from("admin"), Value::from("power")])),
            content.lookup(&["Eai", "Acl", "Perms", "Read"])
        );
    }

    #[tokio::test]
    async fn test_missing_updated_fails_naming_element() {
        let mut cursor = XmlCursor::new(
            "<entry><title>a</title><author><name>b</name></author><id>https://localhost/c</id></entry>",
        );
        let actual_error = AtomEntry::read(&mut cursor).await.expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Parse(e) if e.element() == Some("updated")));
    }

    #[tokio::test]
    async fn test_unexpected_element_fails() {
        let mut cursor = XmlCursor::new("<entry><title>a</title><bogus/></entry>");
        let actual_error = AtomEntry::read(&mut cursor).await.expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Parse(e) if e.element() == Some("bogus")));
    }

    #[tokio::test]
    async fn test_malformed_id_fails_conversion() {
        let mut cursor = XmlCursor::new("<entry><id>not a url</id></entry>");
        let actual_error = AtomEntry::read(&mut cursor).await.expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Conversion(e) if e.expected() == "Uri"));
    }

    #[tokio::test]
    async fn test_document_without_entry_fails() {
        let mut cursor = XmlCursor::new("<response><sid>1</sid></response>");
        let actual_error = AtomEntry::read(&mut cursor).await.expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Parse(e) if e.element() == Some("entry")));
    }
}
