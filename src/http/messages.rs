use crate::convert::to_enum;
use crate::xml::{Element, Node, XmlCursor};
use crate::Result;
use std::fmt::{Display, Formatter};
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

/// Severity of a diagnostic message reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive)]
pub enum Severity {
    /// Debugging output, e.g. the search pipeline of a job.
    #[strum(to_string = "DEBUG")]
    Debug,
    /// Informational message.
    #[strum(to_string = "INFO", serialize = "INFORMATION")]
    Information,
    /// Something worth attention that did not fail the request.
    #[strum(to_string = "WARN", serialize = "WARNING")]
    Warning,
    /// The request failed.
    #[strum(to_string = "ERROR")]
    Error,
    /// The request failed and the server gave up on it.
    #[strum(to_string = "FATAL")]
    Fatal,
}

impl Severity {
    /// True for [`Error`] and [`Fatal`], which stop whatever the message was reported for.
    ///
    /// [`Error`]: Severity::Error
    /// [`Fatal`]: Severity::Fatal
    pub fn is_failure(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

/// A severity-tagged diagnostic message from a `<msg type="…">` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    severity: Severity,
    text: String,
}

impl Message {
    /// Creates a message.
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }

    /// Severity of the message.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Text of the message.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Reads a `<msg>` element whose start tag was consumed last.
    pub(crate) async fn read_one(cursor: &mut XmlCursor, element: &Element) -> Result<Message> {
        let severity = match element.attribute("type") {
            Some(raw) => to_enum::<Severity>(raw, "Severity")?,
            None => Severity::Information,
        };
        let text = cursor.read_text().await?;

        Ok(Message::new(severity, text.trim()))
    }

    /// Reads the `<msg>` children of a `<messages>` element whose start tag was consumed last.
    pub(crate) async fn read_list(cursor: &mut XmlCursor) -> Result<Vec<Message>> {
        let mut messages = vec![];

        loop {
            match cursor.next_significant().await? {
                Node::Start(element) if element.local_name() == "msg" => {
                    messages.push(Self::read_one(cursor, &element).await?)
                }
                Node::Start(_) => cursor.skip_element().await?,
                Node::End(_) | Node::Eof => return Ok(messages),
                Node::Text(_) => {}
            }
        }
    }

    /// Reads the messages of the first `<messages>` element in the document, if there is one.
    pub(crate) async fn read_document(cursor: &mut XmlCursor) -> Result<Vec<Message>> {
        match cursor.read_to_following(&["messages"]).await? {
            Some(_) => Self::read_list(cursor).await,
            None => Ok(vec![]),
        }
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.text)
    }
}

/// The server answered with a non-success status, or reported a failure inside a response it streamed.
///
/// Carries the HTTP status code and the diagnostic messages parsed from the response body.
///
/// # Examples
///
/// ```
/// # use splunk_sdk::{Message, RequestError, Severity};
/// let error = RequestError::new(404, vec![Message::new(Severity::Error, "Could not find object id=nope")]);
///
/// assert_eq!("ERROR: Could not find object id=nope", error.to_string());
/// assert_eq!("HTTP status 500", RequestError::new(500, vec![]).to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct RequestError {
    status: u16,
    messages: Vec<Message>,
}

impl RequestError {
    /// Creates an error for `status` with the given diagnostics.
    pub fn new(status: u16, messages: Vec<Message>) -> Self {
        Self { status, messages }
    }

    /// The HTTP status code of the response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Diagnostic messages reported by the server.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most severe reported severity, if any message was reported.
    pub fn severity(&self) -> Option<Severity> {
        self.messages.iter().map(Message::severity).max()
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.messages.is_empty() {
            return write!(f, "HTTP status {}", self.status);
        }

        for (index, message) in self.messages.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", message)?;
        }

        Ok(())
    }
}
