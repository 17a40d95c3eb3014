//! Downloading a single remote file to its mapped local path.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::dav::{DavTransport, TransportError};
use crate::local::LocalStore;
use crate::path::{PathMapper, RemotePath};

/// Downloading one file failed. Never fatal for the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server answered {status}")]
    UnexpectedStatus { status: u16 },

    #[error("failed to create parent directory {}: {source}", path.display())]
    CreateParent {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct ResourceFetcher<'a, T: DavTransport + ?Sized, S: LocalStore + ?Sized> {
    transport: &'a T,
    store: &'a S,
    mapper: &'a PathMapper,
}

impl<'a, T, S> ResourceFetcher<'a, T, S>
where
    T: DavTransport + ?Sized,
    S: LocalStore + ?Sized,
{
    pub fn new(transport: &'a T, store: &'a S, mapper: &'a PathMapper) -> Self {
        Self {
            transport,
            store,
            mapper,
        }
    }

    /// Downloads `remote` and overwrites its local counterpart. Returns the
    /// number of bytes written.
    ///
    /// Nothing is written unless the server answers 2xx. A failed write may
    /// leave a partial file behind.
    pub fn fetch(&self, remote: &RemotePath) -> Result<u64, FetchError> {
        let url = self.mapper.file_url(remote);
        info!(url = %url, "sending request");

        let response = self.transport.get(&url)?;
        if !response.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: response.status,
            });
        }

        let local_path = self.mapper.to_local(remote);
        if let Some(parent) = local_path.parent() {
            self.store
                .create_dir_all(parent)
                .map_err(|source| FetchError::CreateParent {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        self.store
            .write_file(&local_path, &response.body)
            .map_err(|source| FetchError::Write {
                path: local_path.clone(),
                source,
            })?;

        let bytes = response.body.len() as u64;
        info!(
            resource = %remote,
            local_path = %local_path.display(),
            bytes,
            "resource downloaded"
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MirrorConfig, Protocol};
    use crate::dav::DavResponse;
    use crate::local::FsStore;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    struct GetOnly(HashMap<String, DavResponse>);

    impl DavTransport for GetOnly {
        fn propfind(&self, _url: &str) -> Result<DavResponse, TransportError> {
            unreachable!()
        }

        fn get(&self, url: &str) -> Result<DavResponse, TransportError> {
            Ok(self
                .0
                .get(url)
                .cloned()
                .unwrap_or_else(|| DavResponse::new(404, "")))
        }
    }

    fn setup(local: &std::path::Path) -> PathMapper {
        PathMapper::new(
            &MirrorConfig::new(Protocol::Http, "dav.test")
                .base_dir("/webdav")
                .remote_dir("docs")
                .local_dir(local),
        )
    }

    #[test]
    fn test_fetch_writes_body_under_mapped_path() {
        let temp = TempDir::new().unwrap();
        let mapper = setup(temp.path());
        let transport = GetOnly(HashMap::from([(
            "http://dav.test/webdav/docs/notes/b%20c.txt".to_string(),
            DavResponse::new(200, "twenty bytes of text"),
        )]));
        let fetcher = ResourceFetcher::new(&transport, &FsStore, &mapper);

        let bytes = fetcher.fetch(&RemotePath::new("docs/notes/b c.txt")).unwrap();
        assert_eq!(bytes, 20);
        assert_eq!(
            fs::read(temp.path().join("notes/b c.txt")).unwrap(),
            b"twenty bytes of text"
        );
    }

    #[test]
    fn test_fetch_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"stale content, much longer").unwrap();
        let mapper = setup(temp.path());
        let transport = GetOnly(HashMap::from([(
            "http://dav.test/webdav/docs/a.txt".to_string(),
            DavResponse::new(200, "fresh"),
        )]));

        ResourceFetcher::new(&transport, &FsStore, &mapper)
            .fetch(&RemotePath::new("docs/a.txt"))
            .unwrap();
        assert_eq!(fs::read(temp.path().join("a.txt")).unwrap(), b"fresh");
    }

    #[test]
    fn test_non_success_status_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let mapper = setup(temp.path());
        let transport = GetOnly(HashMap::new());

        let err = ResourceFetcher::new(&transport, &FsStore, &mapper)
            .fetch(&RemotePath::new("docs/gone.txt"))
            .unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedStatus { status: 404 }));
        assert!(!temp.path().join("gone.txt").exists());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        // a directory where the file should go
        fs::create_dir(temp.path().join("a.txt")).unwrap();
        let mapper = setup(temp.path());
        let transport = GetOnly(HashMap::from([(
            "http://dav.test/webdav/docs/a.txt".to_string(),
            DavResponse::new(200, "x"),
        )]));

        let err = ResourceFetcher::new(&transport, &FsStore, &mapper)
            .fetch(&RemotePath::new("docs/a.txt"))
            .unwrap_err();
        assert!(matches!(err, FetchError::Write { .. }));
    }
}
