//! Decoding of `207 Multi-Status` listings into [`Blob`] records.

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::Event;
use std::io::Cursor;

use crate::blob_store::error::{BlobStoreError, Result};
use crate::blob_store::types::Blob;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementName {
    Multistatus,
    Response,
    Propstat,
    Prop,
    Href,
    Getcontentlength,
    Getlastmodified,
    Other,
}

pub(crate) fn element_from_bytes(raw: &[u8]) -> ElementName {
    let local = match raw.iter().position(|b| *b == b':') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    };

    if local.eq_ignore_ascii_case(b"multistatus") {
        ElementName::Multistatus
    } else if local.eq_ignore_ascii_case(b"response") {
        ElementName::Response
    } else if local.eq_ignore_ascii_case(b"propstat") {
        ElementName::Propstat
    } else if local.eq_ignore_ascii_case(b"prop") {
        ElementName::Prop
    } else if local.eq_ignore_ascii_case(b"href") {
        ElementName::Href
    } else if local.eq_ignore_ascii_case(b"getcontentlength") {
        ElementName::Getcontentlength
    } else if local.eq_ignore_ascii_case(b"getlastmodified") {
        ElementName::Getlastmodified
    } else {
        ElementName::Other
    }
}

fn path_ends_with<T: PartialEq>(stack: &[T], needle: &[T]) -> bool {
    stack.len() >= needle.len() && stack[stack.len() - needle.len()..] == needle[..]
}

const HREF_PATH: &[ElementName] = &[ElementName::Response, ElementName::Href];
const CONTENT_LENGTH_PATH: &[ElementName] = &[
    ElementName::Response,
    ElementName::Propstat,
    ElementName::Prop,
    ElementName::Getcontentlength,
];
const LAST_MODIFIED_PATH: &[ElementName] = &[
    ElementName::Response,
    ElementName::Propstat,
    ElementName::Prop,
    ElementName::Getlastmodified,
];

/// Raw property text collected for one `<response>`.
#[derive(Debug, Default)]
struct PendingBlob {
    href: String,
    content_length: Option<String>,
    last_modified: Option<String>,
}

impl PendingBlob {
    fn into_blob(self) -> Result<Blob> {
        let size = match self.content_length.as_deref() {
            None => 0,
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                BlobStoreError::parse(format!("cannot parse \"{raw}\" as content length: {e}"))
            })?,
        };

        let created = match self.last_modified.as_deref() {
            Some(raw) => parse_http_date(raw)?,
            None => {
                return Err(BlobStoreError::parse(format!(
                    "missing getlastmodified for \"{}\"",
                    self.href
                )));
            }
        };

        Ok(Blob {
            path: last_segment(&self.href).to_string(),
            size,
            created,
        })
    }
}

const RFC1123_GMT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC1123_UTC: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// Parse an RFC 1123 HTTP date such as `Wed, 29 Jul 2015 18:43:36 GMT`.
///
/// Only the fixed layout with a weekday, four-digit year and `GMT` (or `UTC`) zone is
/// accepted; RFC 2822 variants with numeric offsets are rejected.
pub fn parse_http_date(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, RFC1123_GMT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, RFC1123_UTC))
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            BlobStoreError::parse(format!("cannot parse \"{raw}\" as RFC 1123 date-time: {e}"))
        })
}

/// Reduce an `href` (absolute URL or path) to its trailing path segment.
pub fn last_segment(href: &str) -> &str {
    let trimmed = href.trim().trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

struct MultistatusParser {
    stack: Vec<ElementName>,
    current: PendingBlob,
    text: String,
    seen_root: bool,
    blobs: Vec<Blob>,
}

impl MultistatusParser {
    fn new() -> Self {
        Self {
            stack: Vec::with_capacity(16),
            current: PendingBlob::default(),
            text: String::new(),
            seen_root: false,
            blobs: Vec::new(),
        }
    }

    fn path_ends_with(&self, needle: &[ElementName]) -> bool {
        path_ends_with(&self.stack, needle)
    }

    fn in_tracked_leaf(&self) -> bool {
        self.path_ends_with(HREF_PATH)
            || self.path_ends_with(CONTENT_LENGTH_PATH)
            || self.path_ends_with(LAST_MODIFIED_PATH)
    }

    fn on_start(&mut self, raw: &[u8]) {
        let element = element_from_bytes(raw);
        match element {
            ElementName::Multistatus if self.stack.is_empty() => self.seen_root = true,
            ElementName::Response => self.current = PendingBlob::default(),
            _ => {}
        }
        self.stack.push(element);
        if self.in_tracked_leaf() {
            self.text.clear();
        }
    }

    fn on_text(&mut self, text: &str) {
        if self.in_tracked_leaf() {
            self.text.push_str(text);
        }
    }

    fn on_end(&mut self) -> Result<()> {
        if self.path_ends_with(HREF_PATH) {
            self.current.href = self.text.trim().to_string();
        } else if self.path_ends_with(CONTENT_LENGTH_PATH) {
            if let Some(value) = non_empty(&self.text) {
                self.current.content_length = Some(value);
            }
        } else if self.path_ends_with(LAST_MODIFIED_PATH) {
            if let Some(value) = non_empty(&self.text) {
                self.current.last_modified = Some(value);
            }
        }

        if self.stack.pop() == Some(ElementName::Response) {
            let finished = std::mem::take(&mut self.current);
            self.blobs.push(finished.into_blob()?);
        }
        Ok(())
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn utf8(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw)
        .map_err(|err| BlobStoreError::parse(format!("invalid UTF-8 in listing: {err}")))
}

fn decode_text(raw: &[u8]) -> Result<String> {
    Ok(unescape(utf8(raw)?)
        .map_err(|err| BlobStoreError::parse(format!("XML decode error: {err}")))?
        .into_owned())
}

fn decode_reference(raw: &[u8]) -> Option<String> {
    let name = std::str::from_utf8(raw).ok()?;
    if let Some(code) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(code, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(code) = name.strip_prefix('#') {
        return code
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}

fn line_of(body: &[u8], position: usize) -> usize {
    body[..position.min(body.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

/// Parse a WebDAV `207 Multi-Status` body into one [`Blob`] per `<response>`.
///
/// The result follows document order, but callers should treat it as a set.
pub fn parse_multistatus(body: &[u8]) -> Result<Vec<Blob>> {
    let content = body.trim_ascii_start();
    let offset = body.len() - content.len();

    let mut xml = Reader::from_reader(Cursor::new(content));
    xml.config_mut().trim_text(false);

    let syntax_error = |position: u64, detail: &dyn std::fmt::Display| {
        BlobStoreError::parse(format!(
            "XML syntax error on line {}: {detail}",
            line_of(body, offset + position as usize)
        ))
    };

    let mut buf = Vec::with_capacity(8 * 1024);
    let mut parser = MultistatusParser::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.on_start(e.name().as_ref()),
            Ok(Event::Empty(e)) => {
                parser.on_start(e.name().as_ref());
                parser.on_end()?;
            }
            Ok(Event::Text(e)) => {
                let text = decode_text(e.as_ref())?;
                parser.on_text(&text);
            }
            Ok(Event::CData(e)) => {
                parser.on_text(utf8(e.as_ref())?);
            }
            Ok(Event::GeneralRef(e)) => {
                let resolved = decode_reference(e.as_ref()).ok_or_else(|| {
                    BlobStoreError::parse(format!(
                        "unknown XML entity &{};",
                        String::from_utf8_lossy(e.as_ref())
                    ))
                })?;
                parser.on_text(&resolved);
            }
            Ok(Event::End(_)) => parser.on_end()?,
            Ok(Event::Eof) => break,
            Err(e) => return Err(syntax_error(xml.error_position(), &e)),
            _ => {}
        }
        buf.clear();
    }

    if !parser.stack.is_empty() {
        return Err(syntax_error(xml.buffer_position(), &"unexpected EOF"));
    }
    if !parser.seen_root {
        return Err(BlobStoreError::parse(
            "response is not a DAV: multistatus document",
        ));
    }

    Ok(parser.blobs)
}
