//! Delta mode: deciding whether a remote file can be skipped.
//!
//! Rules, in order:
//! 1. Delta mode off: never skip.
//! 2. No local file: never skip.
//! 3. No criteria configured: the local file existing is enough to skip.
//! 4. Otherwise skip if *any* configured criterion matches (OR, not AND).
//!
//! `DATE` compares at whole-second resolution because `getlastmodified`
//! carries no sub-second part.

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{DeltaCriteria, DeltaSettings};
use crate::dav::RemoteFile;
use crate::local::{LocalMetadata, LocalStore};

/// Why a file was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Delta mode without criteria; the file exists.
    Exists,
    Size,
    Date,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Exists => f.write_str("EXISTS"),
            SkipReason::Size => f.write_str(DeltaCriteria::SIZE),
            SkipReason::Date => f.write_str(DeltaCriteria::DATE),
        }
    }
}

/// Reasons to skip `remote` given the existing local file `local`. Empty
/// means "download it".
pub fn skip_reasons(
    settings: &DeltaSettings,
    local: &LocalMetadata,
    remote: &RemoteFile,
) -> Vec<SkipReason> {
    if !settings.enabled {
        return Vec::new();
    }
    let criteria = settings.criteria;
    if criteria.is_empty() {
        return vec![SkipReason::Exists];
    }

    let mut reasons = Vec::new();
    if criteria.size && local.len == remote.size {
        reasons.push(SkipReason::Size);
    }
    if criteria.date
        && local
            .modified
            .is_some_and(|modified| same_second(modified, remote.modified))
    {
        reasons.push(SkipReason::Date);
    }
    reasons
}

fn same_second(local: SystemTime, remote: DateTime<Utc>) -> bool {
    DateTime::<Utc>::from(local).timestamp() == remote.timestamp()
}

/// Delta decision bound to a local store.
pub struct DeltaFilter<'a, S: LocalStore + ?Sized> {
    settings: DeltaSettings,
    store: &'a S,
}

impl<'a, S: LocalStore + ?Sized> DeltaFilter<'a, S> {
    pub fn new(settings: DeltaSettings, store: &'a S) -> Self {
        Self { settings, store }
    }

    /// True if the file at `local_path` already satisfies delta mode for
    /// `remote`.
    pub fn should_skip(&self, local_path: &Path, remote: &RemoteFile) -> bool {
        if !self.settings.enabled {
            return false;
        }

        let local = match self.store.stat(local_path) {
            Ok(Some(local)) => local,
            Ok(None) => return false,
            Err(e) => {
                warn!(
                    local_path = %local_path.display(),
                    error = %e,
                    "could not stat local file, downloading"
                );
                return false;
            }
        };

        let reasons = skip_reasons(&self.settings, &local, remote);
        if reasons.is_empty() {
            return false;
        }

        let reasons = reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        info!(
            local_path = %local_path.display(),
            reasons = %reasons,
            "delta mode: skipped file"
        );
        true
    }
}
