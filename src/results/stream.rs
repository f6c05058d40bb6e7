use crate::convert::to_bool;
use crate::errors::{Error, ParseError};
use crate::http::{Message, RequestError};
use crate::results::{Field, Record};
use crate::xml::{Node, XmlCursor};
use crate::Result;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::debug;

/// Delimiter multi-valued fields are joined with unless the reader is told otherwise.
pub const DEFAULT_DELIMITER: &str = "\n";

/// Progress of a single-pass stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Neither pull nor push consumption has begun.
    NotStarted,
    /// Records are being consumed.
    InProgress,
    /// The section ended, failed or was closed.
    Exhausted,
}

/// Receives the records of a stream consumed in push mode.
///
/// Callbacks run synchronously on the task driving [`SearchResultStream::run`], in document order. Exactly one of
/// [`on_completed`] and [`on_error`] is called, once, after the last record.
///
/// [`on_completed`]: RecordObserver::on_completed
/// [`on_error`]: RecordObserver::on_error
pub trait RecordObserver: Send {
    /// Called for every record.
    fn on_next(&mut self, record: &Record);

    /// Called when reading fails. No record follows.
    fn on_error(&mut self, _error: &Error) {}

    /// Called after the last record.
    fn on_completed(&mut self) {}
}

enum Source<'a> {
    Owned(XmlCursor),
    Borrowed(&'a mut XmlCursor),
}

impl Source<'_> {
    fn cursor(&mut self) -> &mut XmlCursor {
        match self {
            Source::Owned(cursor) => cursor,
            Source::Borrowed(cursor) => cursor,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Header {
    preview: bool,
    field_names: Vec<String>,
    messages: Vec<Message>,
    complete: bool,
}

impl Header {
    /// Advances to the next root element and reads the preamble of the section it opens.
    ///
    /// A `<results>` or `<response>` root opens a section. A bare `<msg>` or `<messages>` root is a section made of
    /// those messages alone. Any other root fails. Whatever the previous section left unread is skipped first.
    ///
    /// Returns `None` when the document has no further root element.
    pub(crate) async fn read(cursor: &mut XmlCursor) -> Result<Option<Self>> {
        while cursor.depth() > 0 {
            if let Node::Eof = cursor.next().await? {
                return Err(ParseError::end_of_document(cursor.current()).into());
            }
        }

        let root = loop {
            match cursor.next_significant().await? {
                Node::Start(element) => break element,
                Node::Eof => return Ok(None),
                Node::End(name) => return Err(ParseError::unexpected(&name.local, "document").into()),
                Node::Text(text) => {
                    return Err(ParseError::at("document", format!("unexpected text {:?} before the root", text)).into())
                }
            }
        };

        match root.local_name() {
            "results" | "response" => {}
            "messages" => return Ok(Some(Self::complete(Message::read_list(cursor).await?))),
            "msg" => return Ok(Some(Self::complete(vec![Message::read_one(cursor, &root).await?]))),
            other => return Err(ParseError::unexpected(other, "document").into()),
        }

        let preview = match root.attribute("preview") {
            Some(raw) => to_bool(raw)?,
            None => false,
        };
        let field_names = match cursor.peek_significant().await? {
            Node::Start(element) if element.local_name() == "meta" => {
                cursor.next_significant().await?;
                read_meta(cursor).await?
            }
            _ => vec![],
        };

        Ok(Some(Self {
            preview,
            field_names,
            ..Self::default()
        }))
    }

    fn complete(messages: Vec<Message>) -> Self {
        Self {
            messages,
            complete: true,
            ..Self::default()
        }
    }
}

async fn read_meta(cursor: &mut XmlCursor) -> Result<Vec<String>> {
    let mut names = vec![];

    loop {
        match cursor.next_significant().await? {
            Node::Start(element) if element.local_name() == "fieldOrder" => loop {
                match cursor.next_significant().await? {
                    Node::Start(element) if element.local_name() == "field" => {
                        names.push(cursor.read_text().await?.trim().to_owned())
                    }
                    Node::Start(_) => cursor.skip_element().await?,
                    Node::End(_) => break,
                    Node::Text(_) => {}
                    Node::Eof => return Err(ParseError::end_of_document("fieldOrder").into()),
                }
            },
            Node::Start(_) => cursor.skip_element().await?,
            Node::End(_) => return Ok(names),
            Node::Text(_) => {}
            Node::Eof => return Err(ParseError::end_of_document("meta").into()),
        }
    }
}

async fn read_result(cursor: &mut XmlCursor, delimiter: &Arc<str>) -> Result<Record> {
    let mut fields = BTreeMap::new();
    let mut segmented_raw = None;

    loop {
        match cursor.next_significant().await? {
            Node::Start(element) if element.local_name() == "field" => {
                let name = element
                    .attribute("k")
                    .ok_or_else(|| ParseError::missing_attribute("k", "field"))?
                    .to_owned();
                let values = read_field_values(cursor, &mut segmented_raw).await?;
                fields.insert(name, Field::from_values(values, delimiter));
            }
            Node::Start(element) => return Err(ParseError::unexpected(element.local_name(), "result").into()),
            Node::End(_) => return Ok(Record::new(fields, segmented_raw)),
            Node::Text(text) => {
                return Err(ParseError::at("result", format!("unexpected text {:?} in <result>", text)).into())
            }
            Node::Eof => return Err(ParseError::end_of_document("result").into()),
        }
    }
}

async fn read_field_values(cursor: &mut XmlCursor, segmented_raw: &mut Option<String>) -> Result<Vec<String>> {
    let mut values = vec![];

    loop {
        match cursor.next_significant().await? {
            Node::Start(element) => match element.local_name() {
                "value" => values.push(read_value_text(cursor).await?),
                "v" => {
                    let raw = cursor.read_inner_xml().await?;
                    *segmented_raw = Some(raw.clone());
                    values.push(raw);
                }
                other => return Err(ParseError::unexpected(other, "field").into()),
            },
            Node::End(_) => return Ok(values),
            Node::Text(text) => {
                return Err(ParseError::at("field", format!("unexpected text {:?} in <field>", text)).into())
            }
            Node::Eof => return Err(ParseError::end_of_document("field").into()),
        }
    }
}

/// Reads the `<text>` of a `<value>`, ignoring its tags.
async fn read_value_text(cursor: &mut XmlCursor) -> Result<String> {
    let mut text = String::new();

    loop {
        match cursor.next_significant().await? {
            Node::Start(element) if element.local_name() == "text" => text.push_str(&cursor.read_text().await?),
            Node::Start(_) => cursor.skip_element().await?,
            Node::End(_) => return Ok(text),
            Node::Text(_) => {}
            Node::Eof => return Err(ParseError::end_of_document("value").into()),
        }
    }
}

/// A forward-only, single-pass stream over the `<result>` records of one `<results>` section.
///
/// Records are read from the response body as they are consumed; the body is never buffered as a whole. A stream is
/// consumed exactly once, either pulled through [`records`] and [`read_record`] or pushed to observers with
/// [`subscribe`] and [`run`]. Starting a second consumption fails with an invalid operation error.
///
/// A stream over its own response closes it once the section ends, fails or [`close`] is called. A stream handed
/// out by a [`SearchResultsReader`] leaves the response open for the sections that follow.
///
/// An `ERROR` or `FATAL` message reported inside the section ends the stream with a [`RequestError`].
///
/// # Examples
///
/// ```
/// # use futures::TryStreamExt;
/// # use splunk_sdk::{SearchResultStream, XmlCursor};
/// # #[tokio::main]
/// # async fn main() -> splunk_sdk::Result<()> {
/// let body = r#"<results preview="0">
///   <result offset="0"><field k="host"><value><text>web-01</text></value></field></result>
///   <result offset="1"><field k="host"><value><text>web-02</text></value></field></result>
/// </results>"#;
/// let mut stream = SearchResultStream::new(XmlCursor::new(body)).await?;
/// let hosts: Vec<String> = stream
///     .records()?
///     .map_ok(|record| record.get("host").map(ToString::to_string).unwrap_or_default())
///     .try_collect()
///     .await?;
///
/// assert_eq!(vec!["web-01", "web-02"], hosts);
/// assert!(stream.records().is_err());
/// # Ok(())
/// # }
/// ```
///
/// [`records`]: SearchResultStream::records
/// [`read_record`]: SearchResultStream::read_record
/// [`subscribe`]: SearchResultStream::subscribe
/// [`run`]: SearchResultStream::run
/// [`close`]: SearchResultStream::close
/// [`SearchResultsReader`]: crate::SearchResultsReader
pub struct SearchResultStream<'a> {
    source: Source<'a>,
    state: StreamState,
    preview: bool,
    field_names: Vec<String>,
    messages: Vec<Message>,
    delimiter: Arc<str>,
    observers: Vec<Box<dyn RecordObserver + 'a>>,
    read: usize,
    complete: bool,
}

impl SearchResultStream<'static> {
    /// Opens a stream over the first section of a document, taking ownership of it.
    ///
    /// A document without any root element, such as an empty body, yields a stream that is already exhausted. A root
    /// other than `<results>`, `<response>`, `<messages>` or `<msg>` fails.
    pub async fn new(mut cursor: XmlCursor) -> Result<Self> {
        match Header::read(&mut cursor).await? {
            Some(header) => Ok(Self::from_header(Source::Owned(cursor), header, Arc::from(DEFAULT_DELIMITER))),
            None => {
                cursor.close();
                let mut stream = Self::from_header(Source::Owned(cursor), Header::default(), Arc::from(DEFAULT_DELIMITER));
                stream.state = StreamState::Exhausted;
                Ok(stream)
            }
        }
    }
}

impl<'a> SearchResultStream<'a> {
    pub(crate) fn borrowed(cursor: &'a mut XmlCursor, header: Header, delimiter: Arc<str>) -> Self {
        Self::from_header(Source::Borrowed(cursor), header, delimiter)
    }

    fn from_header(source: Source<'a>, header: Header, delimiter: Arc<str>) -> Self {
        debug!(preview = header.preview, fields = header.field_names.len(), "opened search result section");

        Self {
            source,
            state: StreamState::NotStarted,
            preview: header.preview,
            field_names: header.field_names,
            messages: header.messages,
            complete: header.complete,
            delimiter,
            observers: vec![],
            read: 0,
        }
    }

    /// Sets the delimiter multi-valued fields are formatted with.
    pub fn with_delimiter(mut self, delimiter: impl Into<Arc<str>>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// The delimiter multi-valued fields are formatted with.
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Progress of the stream.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// True when the section is a preview of a search still running.
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// The field order announced by the section. Records may lack some of these fields.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Messages the server reported inside the section so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn start(&mut self) -> Result<()> {
        if self.state != StreamState::NotStarted {
            return Err(Error::invalid_operation("search results can only be enumerated once"));
        }
        self.state = StreamState::InProgress;

        Ok(())
    }

    /// Starts pull consumption, returning the records as a stream.
    pub fn records(&mut self) -> Result<BoxStream<'_, Result<Record>>> {
        self.start()?;

        Ok(stream::try_unfold(self, |stream| async move {
            let record = stream.read_next().await?;
            Ok::<_, Error>(record.map(|record| (record, stream)))
        })
        .boxed())
    }

    /// Reads the next record, starting pull consumption if needed. Returns `None` once the section ends.
    pub async fn read_record(&mut self) -> Result<Option<Record>> {
        if self.state == StreamState::NotStarted {
            if !self.observers.is_empty() {
                return Err(Error::invalid_operation("search results with observers must be consumed with run"));
            }
            self.state = StreamState::InProgress;
        }

        self.read_next().await
    }

    /// Registers an observer for push consumption.
    pub fn subscribe(&mut self, observer: impl RecordObserver + 'a) -> Result<()> {
        if self.state != StreamState::NotStarted {
            return Err(Error::invalid_operation("cannot subscribe to search results already being enumerated"));
        }
        self.observers.push(Box::new(observer));

        Ok(())
    }

    /// Starts push consumption, notifying the observers of every record and then of the completion or failure.
    pub async fn run(&mut self) -> Result<()> {
        self.start()?;

        loop {
            match self.read_next().await {
                Ok(Some(record)) => self.observers.iter_mut().for_each(|observer| observer.on_next(&record)),
                Ok(None) => {
                    self.observers.iter_mut().for_each(|observer| observer.on_completed());
                    return Ok(());
                }
                Err(e) => {
                    self.observers.iter_mut().for_each(|observer| observer.on_error(&e));
                    return Err(e);
                }
            }
        }
    }

    /// Stops the stream. An owned response is released. Safe to call more than once.
    pub fn close(&mut self) {
        self.state = StreamState::Exhausted;
        if let Source::Owned(cursor) = &mut self.source {
            cursor.close();
        }
    }

    async fn read_next(&mut self) -> Result<Option<Record>> {
        if self.state == StreamState::Exhausted {
            return Ok(None);
        }

        let next = self.read_section_item().await;
        match &next {
            Ok(Some(_)) => self.read += 1,
            Ok(None) => {
                debug!(records = self.read, "search result section ended");
                self.close();
            }
            Err(e) => {
                debug!(records = self.read, error = %e, "search result section failed");
                self.close();
            }
        }

        next
    }

    async fn read_section_item(&mut self) -> Result<Option<Record>> {
        if self.complete {
            if self.messages.iter().any(|message| message.severity().is_failure()) {
                return Err(RequestError::new(200, self.messages.clone()).into());
            }
            return Ok(None);
        }

        loop {
            let cursor = self.source.cursor();

            match cursor.next_significant().await? {
                Node::Start(element) => match element.local_name() {
                    "result" => return read_result(cursor, &self.delimiter).await.map(Some),
                    "messages" => {
                        let messages = Message::read_list(cursor).await?;
                        let failed = messages.iter().any(|message| message.severity().is_failure());
                        self.messages.extend(messages.iter().cloned());
                        if failed {
                            return Err(RequestError::new(200, messages).into());
                        }
                    }
                    "meta" => self.field_names = read_meta(cursor).await?,
                    _ => cursor.skip_element().await?,
                },
                Node::End(_) | Node::Eof => return Ok(None),
                Node::Text(_) => {}
            }
        }
    }
}

impl Debug for SearchResultStream<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchResultStream")
            .field("state", &self.state)
            .field("preview", &self.preview)
            .field("field_names", &self.field_names)
            .field("owned", &matches!(self.source, Source::Owned(_)))
            .field("observers", &self.observers.len())
            .finish()
    }
}
