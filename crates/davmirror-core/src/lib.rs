//! Recursive WebDAV directory mirroring.
//!
//! A run lists a remote directory tree breadth-first with `PROPFIND`
//! (`Depth: 1`), recreates its directories under a local root and downloads
//! every file, optionally skipping files that already exist locally with a
//! matching size or modification time ("delta mode").
//!
//! ```no_run
//! use davmirror_core::{FsStore, Mirror, MirrorConfig, Protocol, UreqTransport};
//!
//! let config = MirrorConfig::new(Protocol::Https, "cloud.example.com")
//!     .base_dir("/remote.php/webdav")
//!     .remote_dir("Documents")
//!     .local_dir("backup");
//! let transport = UreqTransport::new(&config.credentials);
//! let report = Mirror::new(config, transport, FsStore)?.run()?;
//! println!("{} files downloaded", report.files_downloaded);
//! # Ok::<(), davmirror_core::MirrorError>(())
//! ```

pub mod config;
pub mod dav;
pub mod delta;
pub mod error;
pub mod fetch;
pub mod local;
pub mod mirror;
pub mod path;
pub mod traverse;

pub use config::{Credentials, DeltaCriteria, DeltaSettings, MirrorConfig, Protocol};
pub use dav::{DavResponse, DavTransport, DirectoryLister, RemoteFile, UreqTransport};
pub use error::{
    ConfigError, ConnectionError, FetchError, ListingError, MirrorError, TransportError,
};
pub use local::{FsStore, LocalMetadata, LocalStore};
pub use mirror::{Mirror, MirrorReport};
pub use path::{PathMapper, RemotePath, to_local_path};
pub use traverse::TraversalResult;
