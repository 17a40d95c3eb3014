//! Path rewriting between the remote URL namespace and the local filesystem.
//!
//! Remote resources are named by [`RemotePath`], a normalized slash-separated
//! path relative to the server's base directory. The [`PathMapper`] rebases a
//! remote path under the local root (relative to the remote directory the run
//! started from) and builds request URLs for it.
//!
//! # Invariants
//!
//! - A `RemotePath` never has leading, trailing or doubled slashes.
//! - A mapped local path never escapes the local root: `.`/`..` segments are
//!   dropped while joining, and rebasing always happens relative to the
//!   traversal root rather than by concatenating absolute remote paths.

use std::fmt;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::config::{MirrorConfig, Protocol};

/// Characters escaped inside a single URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A decoded, normalized path relative to the server's base directory.
///
/// The empty path names the base directory itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath(String);

impl RemotePath {
    /// Normalizes `raw`: drops empty segments, so leading, trailing and
    /// doubled slashes disappear.
    pub fn new(raw: &str) -> Self {
        let normalized = raw
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(normalized)
    }

    /// The base directory itself.
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Appends a child name (which may itself contain slashes).
    #[must_use]
    pub fn join(&self, child: &str) -> Self {
        Self::new(&format!("{}/{}", self.0, child))
    }

    /// Last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Returns the remainder of `self` below `ancestor`, matching on segment
    /// boundaries. `None` if `ancestor` is not a prefix of `self`.
    pub fn strip_ancestor(&self, ancestor: &RemotePath) -> Option<&str> {
        if ancestor.is_root() {
            return Some(&self.0);
        }
        if self.0 == ancestor.0 {
            return Some("");
        }
        self.0
            .strip_prefix(ancestor.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for RemotePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps `remote_path` (relative to the base directory) to its local path.
///
/// The traversal root prefix is stripped, residual separators are trimmed and
/// the remainder is joined onto `local_root`. Total: a path outside
/// `remote_root` is joined as a whole. `remote_path == remote_root` yields
/// `local_root` itself.
pub fn to_local_path(remote_path: &str, remote_root: &str, local_root: &Path) -> PathBuf {
    let remote = RemotePath::new(remote_path);
    let root = RemotePath::new(remote_root);
    let rest = remote.strip_ancestor(&root).unwrap_or(remote.as_str());
    join_local(local_root, rest)
}

/// Joins slash- or backslash-separated segments onto `base`, skipping
/// anything that could climb out of it.
fn join_local(base: &Path, rest: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in rest.split(['/', '\\']) {
        match segment {
            "" | "." | ".." => {}
            name => path.push(name),
        }
    }
    path
}

/// Per-run path and URL translation.
#[derive(Debug, Clone)]
pub struct PathMapper {
    protocol: Protocol,
    host: String,
    base_dir: RemotePath,
    remote_root: RemotePath,
    local_root: PathBuf,
}

impl PathMapper {
    pub fn new(config: &MirrorConfig) -> Self {
        Self {
            protocol: config.protocol,
            host: config.host.trim().trim_matches('/').to_string(),
            base_dir: RemotePath::new(&config.base_dir),
            remote_root: RemotePath::new(&config.remote_dir),
            local_root: config.local_dir.clone(),
        }
    }

    /// Remote directory the traversal starts from.
    pub fn remote_root(&self) -> &RemotePath {
        &self.remote_root
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn base_dir(&self) -> &RemotePath {
        &self.base_dir
    }

    /// Local path for a remote resource.
    pub fn to_local(&self, remote: &RemotePath) -> PathBuf {
        let rest = remote
            .strip_ancestor(&self.remote_root)
            .unwrap_or(remote.as_str());
        join_local(&self.local_root, rest)
    }

    /// True when `remote` maps onto the local root itself.
    pub fn is_root(&self, remote: &RemotePath) -> bool {
        remote.strip_ancestor(&self.remote_root) == Some("")
    }

    /// `{protocol}://{host}/{base_dir}`.
    pub fn base_url(&self) -> String {
        self.build_url(&RemotePath::root(), false)
    }

    /// URL of a file resource.
    pub fn file_url(&self, remote: &RemotePath) -> String {
        self.build_url(remote, false)
    }

    /// URL of a collection. Carries a trailing slash so servers answer
    /// directly instead of redirecting.
    pub fn directory_url(&self, remote: &RemotePath) -> String {
        self.build_url(remote, true)
    }

    fn build_url(&self, remote: &RemotePath, trailing_slash: bool) -> String {
        let mut url = format!("{}://{}", self.protocol, self.host);
        let mut has_path = false;
        for segment in self.base_dir.segments().chain(remote.segments()) {
            url.push('/');
            url.extend(utf8_percent_encode(segment, SEGMENT));
            has_path = true;
        }
        if trailing_slash || !has_path {
            url.push('/');
        }
        url
    }

    /// Rebases a decoded href path onto the base directory.
    ///
    /// Slashes are trimmed, the base-directory prefix is stripped and the
    /// result normalized. Hrefs outside the base directory are kept whole.
    pub fn relative_to_base(&self, href_path: &str) -> RemotePath {
        let resource = RemotePath::new(href_path);
        match resource.strip_ancestor(&self.base_dir) {
            Some(rest) => RemotePath::new(rest),
            None => resource,
        }
    }
}

/// Whether `resource` is the echo of the directory being listed.
///
/// Servers return the listed collection as the first `response` element.
/// The check is a suffix match against the listed directory, so a child whose
/// path happens to end with the parent's full path is dropped as well. For the
/// base directory itself (empty path) only the empty path matches.
pub fn is_self_entry(resource: &RemotePath, listed: &RemotePath) -> bool {
    if listed.is_root() {
        resource.is_root()
    } else {
        resource.as_str().ends_with(listed.as_str())
    }
}
