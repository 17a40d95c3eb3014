//! Parser for `207 Multi-Status` PROPFIND bodies.
//!
//! Only the handful of properties the mirror needs are extracted: the href,
//! whether `resourcetype` contains a `collection` marker, `getcontentlength`
//! and `getlastmodified`. Elements are matched by local name, so `D:`, `d:`,
//! `lp1:` or unprefixed documents all parse the same way.
//!
//! Properties are read per `propstat` and merged into the response only when
//! that propstat's `status` is 2xx (or missing). Servers list unknown
//! properties as empty elements under a `404` propstat; those never override
//! the values reported as found.

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;

/// The body could not be decoded as a multistatus document.
#[derive(Debug, Error)]
pub enum MultistatusError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("document has no multistatus root element")]
    NotMultistatus,

    #[error("document ends before all elements are closed")]
    Truncated,
}

/// One `response` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropfindEntry {
    /// Raw href, still percent-encoded.
    pub href: String,
    pub is_collection: bool,
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Href,
    ContentLength,
    LastModified,
    Status,
}

/// Properties collected inside one `propstat`, applied when it closes.
#[derive(Debug, Default)]
struct Propstat {
    depth: usize,
    is_collection: bool,
    content_length: Option<u64>,
    last_modified: Option<String>,
    status: Option<String>,
}

impl Propstat {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Default::default()
        }
    }

    fn succeeded(&self) -> bool {
        self.status.as_deref().is_none_or(status_is_success)
    }

    fn apply(self, entry: &mut PropfindEntry) {
        if !self.succeeded() {
            return;
        }
        entry.is_collection |= self.is_collection;
        if self.content_length.is_some() {
            entry.content_length = self.content_length;
        }
        if self.last_modified.is_some() {
            entry.last_modified = self.last_modified;
        }
    }
}

/// `HTTP/1.1 200 OK` style status line; anything unreadable counts as failed.
fn status_is_success(line: &str) -> bool {
    line.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .is_some_and(|code| (200..300).contains(&code))
}

pub fn parse_multistatus(body: &[u8]) -> Result<Vec<PropfindEntry>, MultistatusError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut saw_multistatus = false;

    let mut depth = 0usize;
    let mut current: Option<PropfindEntry> = None;
    let mut response_depth = 0usize;
    let mut propstat: Option<Propstat> = None;
    let mut resourcetype_depth: Option<usize> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"multistatus" if depth == 1 => saw_multistatus = true,
                    b"response" if current.is_none() => {
                        current = Some(PropfindEntry::default());
                        response_depth = depth;
                    }
                    b"href" if current.is_some() && depth == response_depth + 1 => {
                        field = Some(Field::Href);
                        text.clear();
                    }
                    b"propstat" if current.is_some() && propstat.is_none() => {
                        propstat = Some(Propstat::new(depth));
                    }
                    b"status" if propstat.as_ref().is_some_and(|p| depth == p.depth + 1) => {
                        field = Some(Field::Status);
                        text.clear();
                    }
                    b"resourcetype" if propstat.is_some() => resourcetype_depth = Some(depth),
                    b"collection" if resourcetype_depth.is_some() => {
                        if let Some(p) = propstat.as_mut() {
                            p.is_collection = true;
                        }
                    }
                    b"getcontentlength" if propstat.is_some() => {
                        field = Some(Field::ContentLength);
                        text.clear();
                    }
                    b"getlastmodified" if propstat.is_some() => {
                        field = Some(Field::LastModified);
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => match e.local_name().as_ref() {
                b"multistatus" if depth == 0 => saw_multistatus = true,
                b"collection" if resourcetype_depth.is_some() => {
                    if let Some(p) = propstat.as_mut() {
                        p.is_collection = true;
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if field.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"response" if depth == response_depth => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    b"propstat" if propstat.as_ref().is_some_and(|p| p.depth == depth) => {
                        if let (Some(p), Some(entry)) = (propstat.take(), current.as_mut()) {
                            p.apply(entry);
                        }
                    }
                    b"resourcetype" if resourcetype_depth == Some(depth) => {
                        resourcetype_depth = None;
                    }
                    b"href" => {
                        if let (Some(Field::Href), Some(entry)) = (field, current.as_mut()) {
                            entry.href = text.trim().to_string();
                            field = None;
                        }
                    }
                    b"status" | b"getcontentlength" | b"getlastmodified" => {
                        if let (Some(f), Some(p)) = (field.take(), propstat.as_mut()) {
                            store(p, f, text.trim());
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => {
                if depth != 0 || current.is_some() {
                    return Err(MultistatusError::Truncated);
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_multistatus {
        return Err(MultistatusError::NotMultistatus);
    }
    Ok(entries)
}

/// Empty or unparsable values are treated as absent.
fn store(propstat: &mut Propstat, field: Field, value: &str) {
    match field {
        Field::ContentLength => {
            if let Ok(len) = value.parse() {
                propstat.content_length = Some(len);
            }
        }
        Field::LastModified if !value.is_empty() => {
            propstat.last_modified = Some(value.to_string());
        }
        Field::Status => propstat.status = Some(value.to_string()),
        Field::LastModified | Field::Href => {}
    }
}
