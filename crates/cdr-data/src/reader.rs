//! Streaming XML reader for call-detail records.
//!
//! [`TokenSource`] turns any `BufRead` into a forward-only sequence of
//! [`Token`]s without loading the document, and [`RecordExtractor`] decodes
//! each `<session>` subtree into a [`Session`] for downstream processing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cdr_core::models::{DialString, Direction, Session};
use cdr_core::{CdrError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info};

/// Element name of one call-detail record.
pub const DEFAULT_RECORD_TAG: &str = "session";

/// Child element carrying the dial string of a record.
const DIAL_STRING_TAG: &str = "outboundDialString";

// ── Tokens ────────────────────────────────────────────────────────────────────

/// An element start tag with its attributes, names stripped of any namespace
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl Element {
    /// Value of the first attribute called `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A structural token of the input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start(Element),
    End(String),
    Text(String),
}

// ── TokenSource ───────────────────────────────────────────────────────────────

/// Lazy, forward-only token stream over an XML document.
///
/// Self-closing elements are reported as a `Start` followed by an `End`.
/// Comments, declarations, processing instructions and doctypes are skipped.
/// Input that ends while an element is still open is an error.
pub struct TokenSource<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending_end: Option<String>,
    /// Names of the elements opened and not yet closed, innermost last.
    open: Vec<String>,
    finished: bool,
}

impl<R: BufRead> TokenSource<R> {
    pub fn new(input: R) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::new(),
            pending_end: None,
            open: Vec::new(),
            finished: false,
        }
    }

    /// Read the next token. `Ok(None)` marks the end of the document.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(Token::End(name)));
        }
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.finished = true;
                    return Err(CdrError::Xml(e));
                }
            };

            let token = match event {
                Event::Start(e) => {
                    let el = element(&e)?;
                    self.open.push(el.name.clone());
                    Token::Start(el)
                }
                Event::Empty(e) => {
                    let el = element(&e)?;
                    self.pending_end = Some(el.name.clone());
                    Token::Start(el)
                }
                Event::End(e) => {
                    self.open.pop();
                    Token::End(utf8(e.local_name().as_ref()))
                }
                Event::Text(e) => Token::Text(e.unescape()?.into_owned()),
                Event::CData(e) => Token::Text(utf8(&e.into_inner())),
                Event::Eof => {
                    self.finished = true;
                    return match self.open.pop() {
                        Some(tag) => Err(CdrError::TruncatedDocument { tag }),
                        None => Ok(None),
                    };
                }
                _ => continue,
            };
            return Ok(Some(token));
        }
    }

    /// Byte offset of the reader within the input.
    pub fn byte_offset(&self) -> u64 {
        self.reader.buffer_position() as u64
    }
}

impl<R: BufRead> Iterator for TokenSource<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Open `path` for buffered streaming.
pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| CdrError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

fn element(start: &BytesStart<'_>) -> Result<Element> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = utf8(attr.key.local_name().as_ref());
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name: utf8(start.local_name().as_ref()),
        attributes,
    })
}

fn utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

// ── RecordExtractor ───────────────────────────────────────────────────────────

/// Recognises record elements in a token stream and decodes them into
/// [`Session`]s.
#[derive(Debug)]
pub struct RecordExtractor {
    record_tag: String,
    extracted: u64,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_TAG)
    }
}

impl RecordExtractor {
    pub fn new(record_tag: impl Into<String>) -> Self {
        Self {
            record_tag: record_tag.into(),
            extracted: 0,
        }
    }

    /// Number of records decoded so far.
    pub fn extracted(&self) -> u64 {
        self.extracted
    }

    /// Advance to the next record element (at any depth) and decode it.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    pub fn next_session<R: BufRead>(
        &mut self,
        tokens: &mut TokenSource<R>,
    ) -> Result<Option<Session>> {
        while let Some(token) = tokens.next_token()? {
            if let Token::Start(element) = token {
                if element.name == self.record_tag {
                    let session = self.decode(element, tokens)?;
                    self.extracted += 1;
                    return Ok(Some(session));
                }
            }
        }
        Ok(None)
    }

    /// Decode every record in the stream, handing each one to `dispatch` as
    /// soon as it is complete.
    ///
    /// Returns the number of records extracted by this call. An error from
    /// `dispatch` stops extraction and is returned unchanged.
    pub fn extract<R, F>(&mut self, tokens: &mut TokenSource<R>, mut dispatch: F) -> Result<u64>
    where
        R: BufRead,
        F: FnMut(Session) -> Result<()>,
    {
        let start = self.extracted;
        while let Some(session) = self.next_session(tokens)? {
            dispatch(session)?;
        }
        let extracted = self.extracted - start;
        info!(
            records = extracted,
            bytes = tokens.byte_offset(),
            "finished extracting <{}> records",
            self.record_tag
        );
        Ok(extracted)
    }

    /// Consume the subtree of `record` up to its matching end tag.
    fn decode<R: BufRead>(&self, record: Element, tokens: &mut TokenSource<R>) -> Result<Session> {
        let mut session = session_from_attributes(record);
        let mut depth = 1usize;

        while depth > 0 {
            match tokens.next_token()? {
                Some(Token::Start(child)) => {
                    depth += 1;
                    if depth == 2 && child.name == DIAL_STRING_TAG {
                        session.dial_string = DialString {
                            description: child.attr("description").unwrap_or_default().to_string(),
                            prefix: child.attr("prefix").unwrap_or_default().to_string(),
                        };
                    }
                }
                Some(Token::End(_)) => depth -= 1,
                Some(Token::Text(_)) => {}
                None => {
                    return Err(CdrError::TruncatedDocument {
                        tag: self.record_tag.clone(),
                    })
                }
            }
        }

        if session.direction == Direction::Unknown {
            debug!(direction = %session.direction_raw, "record with unrecognised direction");
        }
        Ok(session)
    }
}

/// Map record attributes onto a [`Session`]. Unknown attributes are ignored
/// and missing ones stay empty.
fn session_from_attributes(record: Element) -> Session {
    let mut session = Session::default();
    for (name, value) in record.attributes {
        match name.as_str() {
            "direction" => {
                session.direction = Direction::from_attr(&value);
                session.direction_raw = value;
            }
            "durationMinutes" => session.duration = value,
            "transportCharges" => session.transport = value,
            "totalCharges" => session.total_charges = value,
            "platformRate" => session.platform_rate = value,
            "transferCharges" => session.transfer_charges = value,
            "recordingCharges" => session.recording_charges = value,
            "conferencingCharges" => session.conferencing_charges = value,
            "payphoneCharges" => session.payphone_charges = value,
            _ => {}
        }
    }
    session
}

// ── Tests ─────────────────────────────────────────────────────────────────────
