//! Run configuration for the mirroring engine.
//!
//! A [`MirrorConfig`] is produced once by the surrounding layer (CLI flags,
//! config file) and then borrowed by every component for the duration of a
//! run. [`MirrorConfig::validate`] must pass before any network activity.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Configuration errors. These are fatal: a run must not start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No host configured.
    #[error("host is required")]
    MissingHost,

    /// Protocol other than `http` or `https`.
    #[error("protocol must be http or https, got '{0}'")]
    InvalidProtocol(String),

    /// Delta criterion other than `SIZE` or `DATE`.
    #[error("unknown delta criterion '{0}' (expected SIZE or DATE)")]
    UnknownDeltaCriterion(String),

    /// Zero download workers.
    #[error("download job count must be at least 1")]
    ZeroJobs,
}

/// URL scheme used to reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(ConfigError::InvalidProtocol(other.to_string())),
        }
    }
}

/// Static credential pair attached to every request.
///
/// The password is kept in a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Debug)]
pub struct Credentials {
    pub user: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: &str) -> Self {
        Self {
            user: user.into(),
            password: SecretString::from(password),
        }
    }

    /// Value for the `Authorization` header (HTTP basic auth).
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.user, self.password.expose_secret());
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// Which comparisons delta mode uses to decide a local file is current.
///
/// An empty set means "existence alone is enough".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaCriteria {
    /// Local size equals remote `getcontentlength`.
    pub size: bool,
    /// Local mtime equals remote `getlastmodified`.
    pub date: bool,
}

impl DeltaCriteria {
    pub const SIZE: &'static str = "SIZE";
    pub const DATE: &'static str = "DATE";

    pub fn is_empty(&self) -> bool {
        !self.size && !self.date
    }

    /// Names of the configured criteria, in a stable order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.size {
            names.push(Self::SIZE);
        }
        if self.date {
            names.push(Self::DATE);
        }
        names
    }
}

impl FromStr for DeltaCriteria {
    type Err = ConfigError;

    /// Parses a comma-separated list such as `SIZE,DATE`. Empty items are
    /// ignored, so `""` yields the empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut criteria = DeltaCriteria::default();
        for flag in s.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if flag.eq_ignore_ascii_case(Self::SIZE) {
                criteria.size = true;
            } else if flag.eq_ignore_ascii_case(Self::DATE) {
                criteria.date = true;
            } else {
                return Err(ConfigError::UnknownDeltaCriterion(flag.to_string()));
            }
        }
        Ok(criteria)
    }
}

/// Delta mode switch plus its criteria.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaSettings {
    pub enabled: bool,
    pub criteria: DeltaCriteria,
}

impl DeltaSettings {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enabled(criteria: DeltaCriteria) -> Self {
        Self {
            enabled: true,
            criteria,
        }
    }
}

/// Everything a mirroring run needs.
#[derive(Debug)]
pub struct MirrorConfig {
    pub protocol: Protocol,
    /// Hostname, optionally with `:port`.
    pub host: String,
    /// Server-side prefix of the WebDAV tree (e.g. `/remote.php/webdav`).
    pub base_dir: String,
    /// Local directory the remote tree is rebuilt under.
    pub local_dir: PathBuf,
    /// Directory to start from, relative to `base_dir`.
    pub remote_dir: String,
    pub credentials: Credentials,
    pub delta: DeltaSettings,
    /// Number of concurrent downloads. 1 means strictly sequential.
    pub download_jobs: usize,
}

impl MirrorConfig {
    pub fn new(protocol: Protocol, host: impl Into<String>) -> Self {
        Self {
            protocol,
            host: host.into(),
            base_dir: String::new(),
            local_dir: PathBuf::from("."),
            remote_dir: String::new(),
            credentials: Credentials::default(),
            delta: DeltaSettings::disabled(),
            download_jobs: 1,
        }
    }

    #[must_use]
    pub fn base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    #[must_use]
    pub fn local_dir(mut self, local_dir: impl Into<PathBuf>) -> Self {
        self.local_dir = local_dir.into();
        self
    }

    #[must_use]
    pub fn remote_dir(mut self, remote_dir: impl Into<String>) -> Self {
        self.remote_dir = remote_dir.into();
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn delta(mut self, delta: DeltaSettings) -> Self {
        self.delta = delta;
        self
    }

    #[must_use]
    pub fn download_jobs(mut self, jobs: usize) -> Self {
        self.download_jobs = jobs;
        self
    }

    /// Checks the invariants a run depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.download_jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        Ok(())
    }
}
