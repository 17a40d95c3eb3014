//! Shallow directory listing over PROPFIND.
//!
//! [`DavLister`] lists the immediate children of one remote directory and
//! classifies them into subdirectories and files. Any failure (transport
//! error, status other than 207, undecodable body) is returned as a
//! [`ListingError`]; it is up to the caller to decide that a failed directory
//! simply has no children.

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::multistatus::{MultistatusError, PropfindEntry, parse_multistatus};
use super::transport::{DavTransport, TransportError};
use crate::path::{PathMapper, RemotePath, is_self_entry};

/// The only status a successful PROPFIND may return.
pub const MULTI_STATUS: u16 = 207;

/// Listing one directory failed.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected status {status} (expected {expected})")]
    UnexpectedStatus { status: u16, expected: u16 },

    #[error("could not decode listing: {0}")]
    Decode(#[from] MultistatusError),
}

impl ListingError {
    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ListingError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A remote file with the metadata the delta filter compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: RemotePath,
    /// `getcontentlength`, 0 when the server did not report one.
    pub size: u64,
    /// `getlastmodified`, or the listing time when missing or unparsable.
    pub modified: DateTime<Utc>,
}

/// One classified child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    Directory(RemotePath),
    File(RemoteFile),
}

/// Children of one directory, self-entry removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub directories: Vec<RemotePath>,
    pub files: Vec<RemoteFile>,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    fn push(&mut self, entry: ListingEntry) {
        match entry {
            ListingEntry::Directory(path) => self.directories.push(path),
            ListingEntry::File(file) => self.files.push(file),
        }
    }
}

/// Capability to list the immediate children of a remote directory.
pub trait DirectoryLister {
    fn list(&self, directory: &RemotePath) -> Result<Listing, ListingError>;
}

/// [`DirectoryLister`] that speaks PROPFIND through a [`DavTransport`].
pub struct DavLister<'a, T: DavTransport + ?Sized> {
    transport: &'a T,
    mapper: &'a PathMapper,
}

impl<'a, T: DavTransport + ?Sized> DavLister<'a, T> {
    pub fn new(transport: &'a T, mapper: &'a PathMapper) -> Self {
        Self { transport, mapper }
    }

    /// Turns parsed `response` elements into a listing of `directory`.
    pub fn classify(&self, directory: &RemotePath, entries: Vec<PropfindEntry>) -> Listing {
        let mut listing = Listing::default();
        for entry in entries {
            let Some(decoded) = decode_href(&entry.href) else {
                warn!(href = %entry.href, "could not decode path");
                continue;
            };
            let path = self.mapper.relative_to_base(&decoded);
            if is_self_entry(&path, directory) {
                continue;
            }

            if entry.is_collection {
                listing.push(ListingEntry::Directory(path));
            } else {
                let modified = parse_last_modified(entry.last_modified.as_deref());
                listing.push(ListingEntry::File(RemoteFile {
                    path,
                    size: entry.content_length.unwrap_or(0),
                    modified,
                }));
            }
        }
        listing
    }
}

impl<T: DavTransport + ?Sized> DirectoryLister for DavLister<'_, T> {
    fn list(&self, directory: &RemotePath) -> Result<Listing, ListingError> {
        let url = self.mapper.directory_url(directory);
        info!(url = %url, "sending request");

        let response = self.transport.propfind(&url)?;
        if response.status != MULTI_STATUS {
            return Err(ListingError::UnexpectedStatus {
                status: response.status,
                expected: MULTI_STATUS,
            });
        }
        debug!(body = %String::from_utf8_lossy(&response.body), "raw listing");

        let entries = parse_multistatus(&response.body)?;
        let listing = self.classify(directory, entries);
        info!(
            directory = %directory,
            directories = listing.directories.len(),
            files = listing.files.len(),
            "listed directory"
        );
        Ok(listing)
    }
}

/// Percent-decodes an href, reducing absolute URLs to their path first.
fn decode_href(href: &str) -> Option<String> {
    let path = if href.starts_with("http://") || href.starts_with("https://") {
        url::Url::parse(href).ok()?.path().to_string()
    } else {
        href.to_string()
    };
    percent_decode_str(&path)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Parses an RFC 1123 `getlastmodified` value. Anything unparsable becomes
/// "now" so a single odd entry never fails the whole listing.
pub fn parse_last_modified(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
        .map_or_else(Utc::now, |t| t.with_timezone(&Utc))
}
