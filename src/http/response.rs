use crate::http::{Body, Message, RequestError};
use crate::xml::XmlCursor;
use crate::Result;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// A response whose body has not been read yet.
///
/// The body is read at most once: either parsed as XML through [`into_cursor`], read as text, or dropped. Dropping
/// the response releases the connection.
///
/// [`into_cursor`]: Response::into_cursor
#[derive(Debug)]
pub struct Response {
    status: u16,
    body: Body,
}

impl Response {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the response if its status is a success, or a [`RequestError`] carrying the `<msg>` diagnostics of
    /// its body otherwise.
    pub async fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let status = self.status;
        let mut cursor = self.into_cursor();
        let messages = match Message::read_document(&mut cursor).await {
            Ok(messages) => messages,
            Err(e) => {
                debug!(status, error = %e, "error response has no readable diagnostics");
                vec![]
            }
        };
        cursor.close();

        Err(RequestError::new(status, messages).into())
    }

    /// Consumes the response, returning an XML cursor that owns its body.
    pub fn into_cursor(self) -> XmlCursor {
        XmlCursor::new(self.body)
    }

    /// Reads the whole body as UTF-8 text.
    pub async fn text(mut self) -> Result<String> {
        let mut text = String::new();
        self.body.read_to_string(&mut text).await?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::http::Severity;

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = Response::new(201, "<response/>").ensure_success().await.unwrap();

        assert_eq!(201, response.status());
        assert_eq!("<response/>", response.text().await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_carries_parsed_messages() {
        let response = Response::new(
            404,
            r#"<response><messages><msg type="ERROR">Could not find object id=nope</msg></messages></response>"#,
        );
        let actual_error = response.ensure_success().await.expect_err("Operation must fail");

        assert!(matches!(
            actual_error,
            Error::Request(e) if e.status() == 404
                && e.messages() == [crate::http::Message::new(Severity::Error, "Could not find object id=nope")]
        ));
    }

    #[tokio::test]
    async fn test_failure_with_non_xml_body_has_no_messages() {
        let actual_error = Response::new(502, "Bad Gateway")
            .ensure_success()
            .await
            .expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Request(e) if e.status() == 502 && e.messages().is_empty()));
    }
}
