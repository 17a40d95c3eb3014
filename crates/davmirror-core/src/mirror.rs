//! The mirroring run: traverse, materialize directories, download files.
//!
//! The two phases never overlap. Every directory is created before the
//! first download starts, so a file's parent always exists by the time it is
//! written (the fetcher still creates missing parents on its own).
//!
//! Listing and download failures are logged and counted in the
//! [`MirrorReport`]; only a failure to create a local directory aborts the
//! run.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{ConfigError, MirrorConfig};
use crate::dav::{DavLister, DavTransport, RemoteFile, TransportError};
use crate::delta::DeltaFilter;
use crate::fetch::ResourceFetcher;
use crate::local::LocalStore;
use crate::path::PathMapper;
use crate::traverse::{Traversal, TraversalResult};

/// Status the connection check expects from the base URL.
const CONNECTION_OK: u16 = 200;

/// A run could not start or had to stop.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start download workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// The connection check against the base URL failed.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unexpected status {status} (expected {expected})")]
    UnexpectedStatus { status: u16, expected: u16 },
}

impl ConnectionError {
    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConnectionError::UnexpectedStatus { status, .. } => Some(*status),
            ConnectionError::Transport(_) => None,
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Local directories ensured, including the local root.
    pub directories: u64,
    pub files_downloaded: u64,
    pub bytes_downloaded: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub listings_failed: u64,
}

impl MirrorReport {
    /// True if any listing or download failed.
    pub fn has_failures(&self) -> bool {
        self.files_failed > 0 || self.listings_failed > 0
    }
}

#[derive(Default)]
struct DownloadTally {
    files: AtomicU64,
    bytes: AtomicU64,
    failed: AtomicU64,
}

pub struct Mirror<T: DavTransport, S: LocalStore> {
    config: MirrorConfig,
    mapper: PathMapper,
    transport: T,
    store: S,
}

impl<T: DavTransport, S: LocalStore> Mirror<T, S> {
    /// Validates `config` and binds it to the given network and filesystem
    /// capabilities.
    pub fn new(config: MirrorConfig, transport: T, store: S) -> Result<Self, MirrorError> {
        config.validate()?;
        let mapper = PathMapper::new(&config);
        Ok(Self {
            config,
            mapper,
            transport,
            store,
        })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// GETs the base URL and expects a plain 200.
    pub fn check_connection(&self) -> Result<(), ConnectionError> {
        let url = self.mapper.base_url();
        info!(url = %url, "testing connection");
        let response = self.transport.get(&url)?;
        if response.status != CONNECTION_OK {
            return Err(ConnectionError::UnexpectedStatus {
                status: response.status,
                expected: CONNECTION_OK,
            });
        }
        Ok(())
    }

    /// Discovers what a run would create and download without touching the
    /// local tree.
    pub fn plan(&self) -> TraversalResult {
        let lister = DavLister::new(&self.transport, &self.mapper);
        let delta = DeltaFilter::new(self.config.delta, &self.store);
        Traversal::new(&lister, &delta, &self.mapper).traverse(self.mapper.remote_root())
    }

    pub fn run(&self) -> Result<MirrorReport, MirrorError> {
        info!(
            remote_dir = %self.mapper.remote_root(),
            local_dir = %self.mapper.local_root().display(),
            delta = self.config.delta.enabled,
            criteria = ?self.config.delta.criteria.names(),
            jobs = self.config.download_jobs,
            "starting mirror"
        );

        let plan = self.plan();
        let directories = self.materialize(&plan)?;
        let tally = self.download(&plan.files)?;

        let report = MirrorReport {
            directories,
            files_downloaded: tally.files.into_inner(),
            bytes_downloaded: tally.bytes.into_inner(),
            files_skipped: plan.skipped,
            files_failed: tally.failed.into_inner(),
            listings_failed: plan.failed_listings,
        };
        info!(?report, "mirror complete");
        Ok(report)
    }

    /// Creates the local root and one local directory per discovered remote
    /// directory.
    fn materialize(&self, plan: &TraversalResult) -> Result<u64, MirrorError> {
        self.ensure_directory(self.mapper.local_root())?;
        let mut count = 1;
        for directory in &plan.directories {
            // A listing can echo the start directory back; it is the root.
            if self.mapper.is_root(directory) {
                continue;
            }
            self.ensure_directory(&self.mapper.to_local(directory))?;
            count += 1;
        }
        Ok(count)
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), MirrorError> {
        match self.store.create_dir_all(path) {
            Ok(()) => {
                debug!(path = %path.display(), "directory ready");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "directory already exists");
                Ok(())
            }
            Err(source) => Err(MirrorError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn download(&self, files: &[RemoteFile]) -> Result<DownloadTally, MirrorError> {
        let fetcher = ResourceFetcher::new(&self.transport, &self.store, &self.mapper);
        let tally = DownloadTally::default();
        let fetch_one = |file: &RemoteFile| match fetcher.fetch(&file.path) {
            Ok(bytes) => {
                tally.files.fetch_add(1, Ordering::Relaxed);
                tally.bytes.fetch_add(bytes, Ordering::Relaxed);
            }
            Err(e) => {
                error!(resource = %file.path, error = %e, "download failed");
                tally.failed.fetch_add(1, Ordering::Relaxed);
            }
        };

        let jobs = self.config.download_jobs;
        if jobs <= 1 {
            files.iter().for_each(fetch_one);
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .thread_name(|i| format!("davmirror-download-{i}"))
                .build()?;
            pool.install(|| files.par_iter().for_each(fetch_one));
        }
        Ok(tally)
    }
}
