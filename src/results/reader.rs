use crate::results::stream::{Header, DEFAULT_DELIMITER};
use crate::results::SearchResultStream;
use crate::xml::XmlCursor;
use crate::Result;
use std::sync::Arc;

/// Reads a response made of consecutive `<results>` sections, such as the snapshots of an export search.
///
/// Each section is handed out as a [`SearchResultStream`] borrowing the reader, which leaves the response open so the
/// next section can follow. The reader releases the response once no section is left, on [`close`] or when dropped.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::{SearchResultsReader, XmlCursor};
/// # #[tokio::main]
/// # async fn main() -> splunk_sdk::Result<()> {
/// let body = r#"<results preview="1"><result><field k="count"><value><text>1</text></value></field></result></results>
/// <results preview="0"><result><field k="count"><value><text>2</text></value></field></result></results>"#;
/// let mut reader = SearchResultsReader::new(XmlCursor::new(body));
/// let mut previews = vec![];
///
/// while let Some(mut stream) = reader.next_stream().await? {
///     previews.push(stream.is_preview());
///     while let Some(record) = stream.read_record().await? {
///         assert!(record.get("count").is_some());
///     }
/// }
///
/// assert_eq!(vec![true, false], previews);
/// # Ok(())
/// # }
/// ```
///
/// [`close`]: SearchResultsReader::close
#[derive(Debug)]
pub struct SearchResultsReader {
    cursor: XmlCursor,
    delimiter: Arc<str>,
}

impl SearchResultsReader {
    /// Creates a reader positioned before the first section of `cursor`.
    pub fn new(cursor: XmlCursor) -> Self {
        Self {
            cursor,
            delimiter: Arc::from(DEFAULT_DELIMITER),
        }
    }

    /// Sets the delimiter multi-valued fields of every section are formatted with.
    pub fn with_delimiter(mut self, delimiter: impl Into<Arc<str>>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Advances to the next section. Records the previous stream left unread are skipped.
    ///
    /// Returns `None`, and releases the response, once the document has no further section.
    pub async fn next_stream(&mut self) -> Result<Option<SearchResultStream<'_>>> {
        if self.cursor.is_closed() {
            return Ok(None);
        }

        let header = match Header::read(&mut self.cursor).await {
            Ok(Some(header)) => header,
            Ok(None) => {
                self.cursor.close();
                return Ok(None);
            }
            Err(e) => {
                self.cursor.close();
                return Err(e);
            }
        };

        Ok(Some(SearchResultStream::borrowed(
            &mut self.cursor,
            header,
            Arc::clone(&self.delimiter),
        )))
    }

    /// Releases the response. Safe to call more than once.
    pub fn close(&mut self) {
        self.cursor.close();
    }
}
