//! A forward-only XML cursor over a streamed response body.
//!
//! The cursor turns `quick-xml` events into owned [`Node`]s, merging adjacent text, character data and entity
//! references into one text node and dropping comments, processing instructions and declarations. Empty elements
//! are expanded to a start and an end node. It keeps the stack of open elements, which lets parsers skip or capture
//! whole subtrees without tracking depth themselves.

use crate::errors::{Error, ParseError};
use crate::http::Body;
use crate::Result;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};

/// A local and qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Name {
    pub(crate) local: String,
    pub(crate) qualified: String,
}

impl Name {
    fn from_qualified(qualified: &[u8], local: &[u8]) -> Result<Self> {
        Ok(Self {
            local: decode_utf8(local)?.to_owned(),
            qualified: decode_utf8(qualified)?.to_owned(),
        })
    }
}

/// A start tag with its decoded attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) name: Name,
    attributes: Vec<(Name, String)>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = Name::from_qualified(start.name().as_ref(), start.local_name().as_ref())?;
        let mut attributes = vec![];

        for attribute in start.attributes() {
            let attribute =
                attribute.map_err(|e| ParseError::new(format!("malformed attribute in <{}>: {}", name.local, e)))?;
            let key = Name::from_qualified(attribute.key.as_ref(), attribute.key.local_name().as_ref())?;
            let value = unescape_text(decode_utf8(&attribute.value)?)?;
            attributes.push((key, value));
        }

        Ok(Self { name, attributes })
    }

    /// Local name of the element.
    pub(crate) fn local_name(&self) -> &str {
        &self.name.local
    }

    /// Value of the attribute with the given local name.
    pub(crate) fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.local == local_name)
            .map(|(_, value)| value.as_str())
    }

    fn write_start_tag(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name.qualified);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(&key.qualified);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        out.push('>');
    }
}

/// One step of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Start(Element),
    End(Name),
    Text(String),
    Eof,
}

impl Node {
    fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| ParseError::new(format!("invalid UTF-8 in document: {}", e)).into())
}

fn unescape_text(raw: &str) -> Result<String> {
    unescape(raw)
        .map(|text| text.into_owned())
        .map_err(|e| ParseError::new(format!("invalid escape sequence: {}", e)).into())
}

/// Forward-only reader over an XML document, positioned between nodes.
///
/// The cursor owns the response body. [`close`] releases it; closing is idempotent and any read after it fails with
/// an invalid operation error.
///
/// [`close`]: XmlCursor::close
pub struct XmlCursor {
    reader: Option<Reader<Body>>,
    buf: Vec<u8>,
    pending: VecDeque<Node>,
    open: Vec<String>,
}

impl XmlCursor {
    /// Creates a cursor positioned before the first node of `body`.
    pub fn new(body: impl Into<Body>) -> Self {
        let mut reader = Reader::from_reader(body.into());
        reader.config_mut().expand_empty_elements = true;

        Self {
            reader: Some(reader),
            buf: vec![],
            pending: VecDeque::new(),
            open: vec![],
        }
    }

    /// Number of currently open elements.
    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    /// Local name of the innermost open element, or an empty string at the document level.
    pub(crate) fn current(&self) -> &str {
        self.open.last().map(String::as_str).unwrap_or_default()
    }

    /// Releases the underlying response body. Safe to call more than once.
    pub fn close(&mut self) {
        self.reader = None;
        self.pending.clear();
    }

    /// True once [`close`] has been called.
    ///
    /// [`close`]: XmlCursor::close
    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    async fn read_raw(&mut self) -> Result<Node> {
        loop {
            let reader = self
                .reader
                .as_mut()
                .ok_or_else(|| Error::invalid_operation("the XML reader has been closed"))?;
            self.buf.clear();

            let node = match reader.read_event_into_async(&mut self.buf).await? {
                Event::Start(start) => Some(Node::Start(Element::from_start(&start)?)),
                Event::End(end) => Some(Node::End(Name::from_qualified(
                    end.name().as_ref(),
                    end.local_name().as_ref(),
                )?)),
                Event::Text(text) => Some(Node::Text(unescape_text(decode_utf8(&text)?)?)),
                Event::CData(data) => Some(Node::Text(decode_utf8(&data)?.to_owned())),
                Event::GeneralRef(reference) => {
                    let name = decode_utf8(&reference)?;
                    Some(Node::Text(unescape_text(&format!("&{};", name))?))
                }
                Event::Eof => Some(Node::Eof),
                _ => None,
            };

            if let Some(node) = node {
                return Ok(node);
            }
        }
    }

    async fn fill(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            return Ok(());
        }

        match self.read_raw().await? {
            Node::Text(mut text) => loop {
                match self.read_raw().await? {
                    Node::Text(more) => text.push_str(&more),
                    other => {
                        self.pending.push_back(Node::Text(text));
                        self.pending.push_back(other);
                        return Ok(());
                    }
                }
            },
            node => self.pending.push_back(node),
        }

        Ok(())
    }

    /// Returns the next node without consuming it.
    pub(crate) async fn peek(&mut self) -> Result<&Node> {
        self.fill().await?;
        self.pending
            .front()
            .ok_or_else(|| Error::invalid_operation("the XML reader has been closed"))
    }

    /// Returns the next node that is not whitespace-only text, without consuming it.
    pub(crate) async fn peek_significant(&mut self) -> Result<&Node> {
        while self.peek().await?.is_blank_text() {
            self.next().await?;
        }

        self.peek().await
    }

    /// Consumes and returns the next node.
    pub(crate) async fn next(&mut self) -> Result<Node> {
        self.fill().await?;
        let node = self
            .pending
            .pop_front()
            .ok_or_else(|| Error::invalid_operation("the XML reader has been closed"))?;

        match &node {
            Node::Start(element) => self.open.push(element.name.local.clone()),
            Node::End(_) => {
                self.open.pop();
            }
            Node::Text(_) | Node::Eof => {}
        }

        Ok(node)
    }

    /// Consumes and returns the next node that is not whitespace-only text.
    pub(crate) async fn next_significant(&mut self) -> Result<Node> {
        loop {
            let node = self.next().await?;
            if !node.is_blank_text() {
                return Ok(node);
            }
        }
    }

    /// Consumes nodes up to and including the next start tag whose local name is one of `names`, at any depth.
    ///
    /// Returns `None` when the document ends first.
    pub(crate) async fn read_to_following(&mut self, names: &[&str]) -> Result<Option<Element>> {
        loop {
            match self.next().await? {
                Node::Start(element) if names.contains(&element.local_name()) => return Ok(Some(element)),
                Node::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Skips the rest of the element whose start tag was consumed last, including its end tag.
    pub(crate) async fn skip_element(&mut self) -> Result<()> {
        let depth = self.depth();
        let element = self.current().to_owned();

        loop {
            match self.next().await? {
                Node::End(_) if self.depth() < depth => return Ok(()),
                Node::Eof => return Err(ParseError::end_of_document(&element).into()),
                _ => {}
            }
        }
    }

    /// Reads the text content of the element whose start tag was consumed last, including its end tag.
    ///
    /// The element must not contain child elements.
    pub(crate) async fn read_text(&mut self) -> Result<String> {
        let depth = self.depth();
        let element = self.current().to_owned();
        let mut content = String::new();

        loop {
            match self.next().await? {
                Node::Text(text) => content.push_str(&text),
                Node::End(_) if self.depth() < depth => return Ok(content),
                Node::Start(child) => return Err(ParseError::unexpected(child.local_name(), &element).into()),
                Node::End(_) => {}
                Node::Eof => return Err(ParseError::end_of_document(&element).into()),
            }
        }
    }

    /// Captures the markup inside the element whose start tag was consumed last, consuming its end tag.
    pub(crate) async fn read_inner_xml(&mut self) -> Result<String> {
        let depth = self.depth();
        let element = self.current().to_owned();
        let mut markup = String::new();

        loop {
            match self.next().await? {
                Node::Start(child) => child.write_start_tag(&mut markup),
                Node::Text(text) => markup.push_str(&escape(text.as_str())),
                Node::End(_) if self.depth() < depth => return Ok(markup),
                Node::End(name) => {
                    markup.push_str("</");
                    markup.push_str(&name.qualified);
                    markup.push('>');
                }
                Node::Eof => return Err(ParseError::end_of_document(&element).into()),
            }
        }
    }
}

impl Debug for XmlCursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlCursor")
            .field("open", &self.open)
            .field("closed", &self.is_closed())
            .finish()
    }
}
