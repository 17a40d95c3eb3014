//! Breadth-first discovery of the remote tree.
//!
//! [`Traversal`] lists directories level by level from a start directory,
//! collecting every discovered subdirectory and every file the delta filter
//! does not skip. A directory whose listing fails is logged and treated as
//! empty; its siblings are still visited.
//!
//! There is no cycle detection. A server that reports a directory as its own
//! descendant will keep the traversal going.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::dav::{DirectoryLister, RemoteFile};
use crate::delta::DeltaFilter;
use crate::local::LocalStore;
use crate::path::{PathMapper, RemotePath};

/// Everything one traversal discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalResult {
    /// Discovered subdirectories in visit order. The start directory is not
    /// included.
    pub directories: Vec<RemotePath>,
    /// Files to download.
    pub files: Vec<RemoteFile>,
    /// Files the delta filter skipped.
    pub skipped: u64,
    /// Directories whose listing failed.
    pub failed_listings: u64,
}

pub struct Traversal<'a, L: DirectoryLister + ?Sized, S: LocalStore + ?Sized> {
    lister: &'a L,
    delta: &'a DeltaFilter<'a, S>,
    mapper: &'a PathMapper,
}

impl<'a, L, S> Traversal<'a, L, S>
where
    L: DirectoryLister + ?Sized,
    S: LocalStore + ?Sized,
{
    pub fn new(lister: &'a L, delta: &'a DeltaFilter<'a, S>, mapper: &'a PathMapper) -> Self {
        Self {
            lister,
            delta,
            mapper,
        }
    }

    pub fn traverse(&self, start: &RemotePath) -> TraversalResult {
        let mut result = TraversalResult::default();
        let mut frontier = VecDeque::from([start.clone()]);

        while let Some(directory) = frontier.pop_front() {
            let listing = match self.lister.list(&directory) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(
                        directory = %directory,
                        status = e.status(),
                        error = %e,
                        "failed to list directory"
                    );
                    result.failed_listings += 1;
                    continue;
                }
            };

            if listing.is_empty() {
                debug!(directory = %directory, "empty directory");
            }

            for subdirectory in listing.directories {
                frontier.push_back(subdirectory.clone());
                result.directories.push(subdirectory);
            }

            for file in listing.files {
                let local_path = self.mapper.to_local(&file.path);
                if self.delta.should_skip(&local_path, &file) {
                    result.skipped += 1;
                } else {
                    result.files.push(file);
                }
            }
        }

        debug!(
            directories = result.directories.len(),
            files = result.files.len(),
            skipped = result.skipped,
            failed_listings = result.failed_listings,
            "traversal complete"
        );
        result
    }
}
