use crate::convert::ConversionError;
use crate::http::RequestError;
use thiserror::Error;

/// The error type for every operation of the [`Service`], its entities and search result streams.
///
/// Errors mostly occur while talking to the server, but can also happen while parsing its responses or converting
/// property values to their declared types.
///
/// [`Service`]: crate::Service
#[derive(Debug, Error)]
pub enum Error {
    /// A property value could not be converted to its declared type.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// The response does not have the shape of an Atom feed, entry or search result set.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The server answered with a non-success status or reported a fatal message inside a stream.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// A single-pass stream was consumed twice, or an entity was read before it was populated.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// The HTTP transport failed before a response was received.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The XML reader rejected the response body.
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    /// Reading the response body has resulted in an error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A request or link URL could not be built.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl Error {
    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation(message.into())
    }
}

/// The XML does not match the expected Atom or search results schema.
///
/// Always fatal to the parse of the document or fragment at hand; no partial result is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    element: Option<String>,
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            element: None,
            message: message.into(),
        }
    }

    pub(crate) fn at(element: &str, message: impl Into<String>) -> Self {
        Self {
            element: Some(element.to_owned()),
            message: message.into(),
        }
    }

    pub(crate) fn missing(element: &str, parent: &str) -> Self {
        Self {
            element: Some(element.to_owned()),
            message: format!("missing required element <{}> in <{}>", element, parent),
        }
    }

    pub(crate) fn unexpected(element: &str, parent: &str) -> Self {
        Self {
            element: Some(element.to_owned()),
            message: format!("unexpected element <{}> in <{}>", element, parent),
        }
    }

    pub(crate) fn missing_attribute(attribute: &str, element: &str) -> Self {
        Self {
            element: Some(element.to_owned()),
            message: format!("<{}> is missing its {} attribute", element, attribute),
        }
    }

    pub(crate) fn end_of_document(element: &str) -> Self {
        Self {
            element: Some(element.to_owned()),
            message: format!("unexpected end of document inside <{}>", element),
        }
    }

    /// Name of the element the error was raised for, if it is known.
    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    /// The diagnostic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
