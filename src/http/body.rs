use bytes::{Buf, Bytes};
use futures::Stream;
use pin_project::pin_project;
use std::fmt::{Debug, Formatter};
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Adapts a stream of byte chunks, such as an HTTP response body, to [`AsyncBufRead`].
///
/// Only the chunk being read is held in memory, so arbitrarily large bodies can be parsed incrementally.
///
/// [`AsyncBufRead`]: tokio::io::AsyncBufRead
#[derive(Debug)]
#[pin_project]
pub struct BodyReader<S> {
    #[pin]
    stream: S,
    chunk: Bytes,
    done: bool,
}

impl<S> BodyReader<S> {
    /// Creates a reader over the chunks of `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            chunk: Bytes::new(),
            done: false,
        }
    }
}

impl<S, E> AsyncBufRead for BodyReader<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        let mut this = self.project();

        while this.chunk.is_empty() && !*this.done {
            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => *this.chunk = chunk,
                Some(Err(e)) => return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, e))),
                None => *this.done = true,
            }
        }

        Poll::Ready(Ok(&this.chunk[..]))
    }

    fn consume(self: Pin<&mut Self>, amount: usize) {
        self.project().chunk.advance(amount);
    }
}

impl<S, E> AsyncRead for BodyReader<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let available = ready!(self.as_mut().poll_fill_buf(cx))?;
        let size = available.len().min(buf.remaining());
        buf.put_slice(&available[..size]);
        self.consume(size);

        Poll::Ready(Ok(()))
    }
}

/// The body of a [`Response`], readable exactly once through [`AsyncRead`] or [`AsyncBufRead`].
///
/// [`Response`]: crate::http::Response
/// [`AsyncRead`]: tokio::io::AsyncRead
/// [`AsyncBufRead`]: tokio::io::AsyncBufRead
pub struct Body(Box<dyn AsyncBufRead + Send + Unpin>);

impl Body {
    /// A body without content.
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// A body over bytes already in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(Box::new(io::Cursor::new(bytes.into())))
    }

    /// A body streamed chunk by chunk, e.g. from [`reqwest::Response::bytes_stream`].
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self(Box::new(BodyReader::new(Box::pin(stream))))
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(text)
    }
}

impl AsyncRead for Body {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut *self.0).poll_read(cx, buf)
    }
}

impl AsyncBufRead for Body {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        Pin::new(&mut *self.get_mut().0).poll_fill_buf(cx)
    }

    fn consume(mut self: Pin<&mut Self>, amount: usize) {
        Pin::new(&mut *self.0).consume(amount)
    }
}
