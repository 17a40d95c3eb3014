//! Shared fixtures for the mirroring integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Mutex;

use davmirror_core::{DavResponse, DavTransport, TransportError};

pub const HOST: &str = "dav.test";
pub const BASE_DIR: &str = "/webdav";

/// Full URL for a path under the test server's base directory.
pub fn url(path: &str) -> String {
    format!("http://{HOST}{BASE_DIR}/{path}")
}

/// URL the lister uses for the directory at `path`.
pub fn dir_url(path: &str) -> String {
    if path.is_empty() {
        format!("http://{HOST}{BASE_DIR}/")
    } else {
        format!("{}/", url(path))
    }
}

/// A `response` element of a multistatus body.
pub enum Entry {
    Dir(String),
    File {
        href: String,
        len: u64,
        modified: String,
    },
}

impl Entry {
    pub fn dir(path: &str) -> Self {
        Entry::Dir(format!("{BASE_DIR}/{path}/"))
    }

    pub fn file(path: &str, len: u64) -> Self {
        Self::file_modified(path, len, "Wed, 06 Mar 2024 11:30:15 GMT")
    }

    pub fn file_modified(path: &str, len: u64, modified: &str) -> Self {
        Entry::File {
            href: format!("{BASE_DIR}/{path}"),
            len,
            modified: modified.to_string(),
        }
    }
}

/// Renders a `207 Multi-Status` body the way Apache `mod_dav` does.
pub fn multistatus(entries: &[Entry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<D:multistatus xmlns:D=\"DAV:\">\n",
    );
    for entry in entries {
        match entry {
            Entry::Dir(href) => xml.push_str(&format!(
                "<D:response><D:href>{href}</D:href><D:propstat><D:prop>\
                 <D:resourcetype><D:collection/></D:resourcetype>\
                 </D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response>\n"
            )),
            Entry::File {
                href,
                len,
                modified,
            } => xml.push_str(&format!(
                "<D:response><D:href>{href}</D:href><D:propstat><D:prop>\
                 <D:getcontentlength>{len}</D:getcontentlength>\
                 <D:getlastmodified>{modified}</D:getlastmodified>\
                 <D:resourcetype/>\
                 </D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response>\n"
            )),
        }
    }
    xml.push_str("</D:multistatus>\n");
    xml
}

/// In-memory WebDAV server keyed by exact URL. Unknown URLs answer 404;
/// URLs marked unreachable fail with a transport error instead.
#[derive(Default)]
pub struct FakeTransport {
    listings: HashMap<String, DavResponse>,
    resources: HashMap<String, DavResponse>,
    unreachable: HashSet<String>,
    requests: Mutex<Vec<(&'static str, String)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves a 207 listing for the directory at `path` (relative to the
    /// base directory). The self-entry is added automatically.
    #[must_use]
    pub fn directory(mut self, path: &str, children: Vec<Entry>) -> Self {
        let mut entries = vec![Entry::dir(path)];
        entries.extend(children);
        self.listings
            .insert(dir_url(path), DavResponse::new(207, multistatus(&entries)));
        self
    }

    /// Answers PROPFIND on the directory at `path` with `status`.
    #[must_use]
    pub fn directory_status(mut self, path: &str, status: u16) -> Self {
        self.listings
            .insert(dir_url(path), DavResponse::new(status, ""));
        self
    }

    #[must_use]
    pub fn file(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(url(path), DavResponse::new(200, body));
        self
    }

    #[must_use]
    pub fn file_status(mut self, path: &str, status: u16) -> Self {
        self.resources
            .insert(url(path), DavResponse::new(status, "server error"));
        self
    }

    /// Answers PROPFIND on the directory at `path` with a 207 and `body`
    /// verbatim.
    #[must_use]
    pub fn directory_body(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.listings
            .insert(dir_url(path), DavResponse::new(207, body));
        self
    }

    /// PROPFIND on the directory at `path` fails as if the connection
    /// dropped.
    #[must_use]
    pub fn directory_unreachable(mut self, path: &str) -> Self {
        self.unreachable.insert(dir_url(path));
        self
    }

    /// GET on the file at `path` fails as if the connection dropped.
    #[must_use]
    pub fn file_unreachable(mut self, path: &str) -> Self {
        self.unreachable.insert(url(path));
        self
    }

    /// Requests seen so far, as `(method, url)`.
    pub fn requests(&self) -> Vec<(&'static str, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of GETs seen so far.
    pub fn get_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|(method, _)| *method == "GET")
            .count()
    }

    fn answer(
        &self,
        method: &'static str,
        table: &HashMap<String, DavResponse>,
        url: &str,
    ) -> Result<DavResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((method, url.to_string()));
        if self.unreachable.contains(url) {
            return Err(TransportError::Request {
                method,
                url: url.to_string(),
                source: Box::new(io::Error::from(io::ErrorKind::ConnectionReset)),
            });
        }
        Ok(table
            .get(url)
            .cloned()
            .unwrap_or_else(|| DavResponse::new(404, "")))
    }
}

impl DavTransport for FakeTransport {
    fn propfind(&self, url: &str) -> Result<DavResponse, TransportError> {
        self.answer("PROPFIND", &self.listings, url)
    }

    fn get(&self, url: &str) -> Result<DavResponse, TransportError> {
        self.answer("GET", &self.resources, url)
    }
}

/// The tree used by most tests:
///
/// ```text
/// docs/
///   a.txt        (10 bytes)
///   notes/
///     b.txt      (20 bytes)
/// ```
pub fn docs_tree() -> FakeTransport {
    FakeTransport::new()
        .directory(
            "docs",
            vec![Entry::file("docs/a.txt", 10), Entry::dir("docs/notes")],
        )
        .directory("docs/notes", vec![Entry::file("docs/notes/b.txt", 20)])
        .file("docs/a.txt", "0123456789")
        .file("docs/notes/b.txt", "abcdefghijklmnopqrst")
}

/// Installs a test subscriber so failing runs print their log.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
