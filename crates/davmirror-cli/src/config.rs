//! Configuration file support for the davmirror CLI.
//!
//! Configuration is read from `~/.config/davmirror/config.toml` (XDG standard)
//! or `~/Library/Application Support/com.davmirror.davmirror/config.toml` on
//! macOS, unless `--config` points somewhere else. Every key is optional and
//! every key can be overridden on the command line.
//!
//! # Example configuration
//!
//! ```toml
//! protocol = "https"
//! host = "cloud.example.com"
//! base_dir = "/remote.php/webdav"
//! remote_dir = "Photos"
//! local_dir = "/backup/photos"
//! user = "alice"
//! password = "app-password"
//! delta = true
//! delta_criteria = "SIZE,DATE"
//! jobs = 4
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use davmirror_core::{
    ConfigError, Credentials, DeltaCriteria, DeltaSettings, MirrorConfig, Protocol,
};

/// Run settings from one source (file or command line). `None` means "not
/// set here".
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `http` or `https`
    pub protocol: Option<String>,

    /// Server hostname, optionally with `:port`
    pub host: Option<String>,

    /// Server-side WebDAV prefix (e.g. `/remote.php/webdav`)
    pub base_dir: Option<String>,

    /// Directory to mirror, relative to `base_dir`
    pub remote_dir: Option<String>,

    /// Local directory to mirror into
    pub local_dir: Option<PathBuf>,

    pub user: Option<String>,

    #[serde(alias = "pass")]
    pub password: Option<String>,

    /// Enable delta mode
    pub delta: Option<bool>,

    /// Comma-separated delta criteria (`SIZE`, `DATE`)
    #[serde(alias = "df")]
    pub delta_criteria: Option<String>,

    /// Concurrent downloads
    pub jobs: Option<usize>,
}

impl Settings {
    /// Load settings from `explicit`, or from the default location.
    ///
    /// A missing default file yields empty settings; a missing explicit file
    /// is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path()?;
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    return Ok(Settings::default());
                }
                path
            }
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(settings)
    }

    /// Field-wise merge where values already set in `self` win.
    #[must_use]
    pub fn or(self, fallback: Settings) -> Settings {
        Settings {
            protocol: self.protocol.or(fallback.protocol),
            host: self.host.or(fallback.host),
            base_dir: self.base_dir.or(fallback.base_dir),
            remote_dir: self.remote_dir.or(fallback.remote_dir),
            local_dir: self.local_dir.or(fallback.local_dir),
            user: self.user.or(fallback.user),
            password: self.password.or(fallback.password),
            delta: self.delta.or(fallback.delta),
            delta_criteria: self.delta_criteria.or(fallback.delta_criteria),
            jobs: self.jobs.or(fallback.jobs),
        }
    }

    /// Resolve into a mirror configuration, applying defaults for anything
    /// still unset.
    pub fn into_mirror_config(self) -> Result<MirrorConfig, ConfigError> {
        let protocol = match self.protocol.as_deref() {
            Some(protocol) => protocol.parse()?,
            None => Protocol::default(),
        };
        let host = self.host.unwrap_or_default();
        if host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }

        let criteria = match self.delta_criteria.as_deref() {
            Some(criteria) => criteria.parse()?,
            None => DeltaCriteria::default(),
        };
        let delta = if self.delta.unwrap_or(false) {
            DeltaSettings::enabled(criteria)
        } else {
            DeltaSettings::disabled()
        };

        let credentials = Credentials::new(
            self.user.unwrap_or_default(),
            self.password.as_deref().unwrap_or_default(),
        );

        let mut config = MirrorConfig::new(protocol, host)
            .base_dir(self.base_dir.unwrap_or_default())
            .remote_dir(self.remote_dir.unwrap_or_default())
            .credentials(credentials)
            .delta(delta)
            .download_jobs(self.jobs.unwrap_or(1));
        if let Some(local_dir) = self.local_dir {
            config = config.local_dir(local_dir);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Get the path to the default configuration file.
///
/// Uses XDG config directory on Linux, Application Support on macOS.
pub fn config_path() -> Result<PathBuf> {
    let base_dirs = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

    #[cfg(target_os = "macos")]
    {
        let config_dir = base_dirs
            .home_dir()
            .join("Library/Application Support/com.davmirror.davmirror");
        Ok(config_dir.join("config.toml"))
    }

    #[cfg(not(target_os = "macos"))]
    {
        let config_dir = base_dirs.config_dir().join("davmirror");
        Ok(config_dir.join("config.toml"))
    }
}
