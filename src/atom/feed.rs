use crate::atom::parser::{format_timestamp, read_author, read_link, read_timestamp, read_trimmed, read_url, resolve_links};
use crate::atom::AtomEntry;
use crate::convert::to_u64;
use crate::errors::ParseError;
use crate::http::Message;
use crate::xml::{Node, XmlCursor};
use crate::Result;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use tracing::debug;
use url::Url;

/// Build and version of the server that produced a feed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Generator {
    /// Build identifier.
    pub build: String,
    /// Product version, e.g. `6.0.1`.
    pub version: String,
}

/// OpenSearch paging of a feed. Absent elements read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    /// Number of entries the collection holds in total.
    pub total_results: u64,
    /// Page size the server used.
    pub items_per_page: u64,
    /// Offset of the first entry of this page.
    pub start_index: u64,
}

/// A collection of resources, parsed from an Atom `<feed>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomFeed {
    id: Url,
    title: String,
    author: Option<String>,
    generator: Option<Generator>,
    updated: DateTime<FixedOffset>,
    pagination: Pagination,
    links: BTreeMap<String, Url>,
    messages: Vec<Message>,
    entries: Vec<AtomEntry>,
}

impl AtomFeed {
    /// Absolute URL identifying the collection.
    pub fn id(&self) -> &Url {
        &self.id
    }

    /// Title of the feed.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Author of the feed, if reported.
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// Server build and version, if reported.
    pub fn generator(&self) -> Option<&Generator> {
        self.generator.as_ref()
    }

    /// When the collection was last changed.
    pub fn updated(&self) -> DateTime<FixedOffset> {
        self.updated
    }

    /// Paging of this response.
    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Absolute feed-level links keyed by relation.
    pub fn links(&self) -> &BTreeMap<String, Url> {
        &self.links
    }

    /// Diagnostics the server attached to the feed.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[AtomEntry] {
        &self.entries
    }

    /// Consumes the feed, returning its entries.
    pub fn into_entries(self) -> Vec<AtomEntry> {
        self.entries
    }

    /// Reads the first `<feed>` element of the document.
    pub async fn read(cursor: &mut XmlCursor) -> Result<Self> {
        cursor
            .read_to_following(&["feed"])
            .await?
            .ok_or_else(|| ParseError::missing("feed", "document"))?;

        let mut title = None;
        let mut author = None;
        let mut id = None;
        let mut updated = None;
        let mut generator = None;
        let mut pagination = Pagination::default();
        let mut links = vec![];
        let mut messages = vec![];
        let mut entries = vec![];

        loop {
            match cursor.next_significant().await? {
                Node::Start(element) => match element.local_name() {
                    "title" => title = Some(read_trimmed(cursor).await?),
                    "author" => author = Some(read_author(cursor).await?),
                    "id" => id = Some(read_url(cursor).await?),
                    "updated" => updated = Some(read_timestamp(cursor).await?),
                    "generator" => {
                        generator = Some(Generator {
                            build: element.attribute("build").unwrap_or_default().to_owned(),
                            version: element.attribute("version").unwrap_or_default().to_owned(),
                        });
                        cursor.skip_element().await?;
                    }
                    "link" => links.push(read_link(cursor, &element).await?),
                    "totalResults" => pagination.total_results = to_u64(&cursor.read_text().await?)?,
                    "itemsPerPage" => pagination.items_per_page = to_u64(&cursor.read_text().await?)?,
                    "startIndex" => pagination.start_index = to_u64(&cursor.read_text().await?)?,
                    "messages" => messages.extend(Message::read_list(cursor).await?),
                    "entry" => entries.push(AtomEntry::read_element(cursor).await?),
                    other => return Err(ParseError::unexpected(other, "feed").into()),
                },
                Node::End(_) => break,
                Node::Text(text) => {
                    return Err(ParseError::at("feed", format!("unexpected text {:?} in <feed>", text)).into())
                }
                Node::Eof => return Err(ParseError::end_of_document("feed").into()),
            }
        }

        let title = title.ok_or_else(|| ParseError::missing("title", "feed"))?;
        let id = id.ok_or_else(|| ParseError::missing("id", "feed"))?;
        let updated = updated.ok_or_else(|| ParseError::missing("updated", "feed"))?;
        let links = resolve_links(&id, links)?;
        debug!(feed.id = %id, entries = entries.len(), total = pagination.total_results, "parsed atom feed");

        Ok(Self {
            id,
            title,
            author,
            generator,
            updated,
            pagination,
            links,
            messages,
            entries,
        })
    }
}

impl Display for AtomFeed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "AtomFeed(Title={}, Author={}, Id={}, Updated={}, Entries={})",
            self.title,
            self.author.as_deref().unwrap_or_default(),
            self.id,
            format_timestamp(&self.updated),
            self.entries.len()
        )
    }
}
