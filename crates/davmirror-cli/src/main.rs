#![deny(unsafe_code)]

mod config;
mod exit_code;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use davmirror_core::{
    ConfigError, ConnectionError, FsStore, Mirror, MirrorError, UreqTransport,
};

use crate::config::Settings;

/// Mirror a directory tree from a WebDAV server to the local filesystem
#[derive(Parser)]
#[command(name = "davmirror")]
#[command(author, version)]
#[command(after_help = "EXAMPLES:
    # Mirror a Nextcloud folder into ./photos
    davmirror --protocol https --host cloud.example.com \\
        --base-dir /remote.php/webdav --remote-dir Photos --local-dir photos \\
        --user alice

    # Only download files whose size changed
    davmirror --host dav.local --delta --df SIZE

    # Show what would be downloaded
    davmirror --host dav.local --remote-dir docs --dry-run

Settings can also be stored in ~/.config/davmirror/config.toml.
")]
struct Cli {
    /// Protocol to use, http or https [default: http]
    #[arg(long)]
    protocol: Option<String>,

    /// WebDAV host, optionally with :port
    #[arg(long)]
    host: Option<String>,

    /// Server-side WebDAV prefix (e.g. /remote.php/webdav)
    #[arg(long, value_name = "DIR")]
    base_dir: Option<String>,

    /// Directory to mirror, relative to the base directory (e.g. /some/dir)
    #[arg(long, value_name = "DIR")]
    remote_dir: Option<String>,

    /// Local directory to mirror into [default: .]
    #[arg(long, value_name = "DIR")]
    local_dir: Option<PathBuf>,

    /// User name for basic authentication
    #[arg(long, env = "DAVMIRROR_USER")]
    user: Option<String>,

    /// Password (insecure, prefer DAVMIRROR_PASSWORD or the config file)
    #[arg(long, env = "DAVMIRROR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Delta mode: skip files that already exist locally (see --df)
    #[arg(long)]
    delta: bool,

    /// Delta criteria, comma separated: SIZE, DATE. A file is skipped if
    /// any of them matches
    #[arg(long = "df", value_name = "CRITERIA")]
    delta_criteria: Option<String>,

    /// Number of concurrent downloads [default: 1]
    #[arg(short, long)]
    jobs: Option<usize>,

    /// List what would be downloaded without writing anything
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Only check that the server answers the base URL
    #[arg(long)]
    check: bool,

    /// Config file (default is ~/.config/davmirror/config.toml)
    #[arg(long, value_name = "FILE", env = "DAVMIRROR_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress logging and the summary line
    #[arg(short, long)]
    quiet: bool,
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            protocol: cli.protocol.clone(),
            host: cli.host.clone(),
            base_dir: cli.base_dir.clone(),
            remote_dir: cli.remote_dir.clone(),
            local_dir: cli.local_dir.clone(),
            user: cli.user.clone(),
            password: cli.password.clone(),
            // an absent flag must not override `delta = true` from the file
            delta: cli.delta.then_some(true),
            delta_criteria: cli.delta_criteria.clone(),
            jobs: cli.jobs,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = categorize_error(&e);

            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");

            if !is_quiet {
                eprintln!("Error: {e:#}");
            }

            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    let file = Settings::load(cli.config.as_deref())?;
    let config = Settings::from(&cli)
        .or(file)
        .into_mirror_config()
        .context("Invalid configuration")?;

    let transport = UreqTransport::new(&config.credentials);
    let mirror = Mirror::new(config, transport, FsStore)?;
    tracing::info!(
        url = %mirror.mapper().base_url(),
        local_dir = %mirror.mapper().local_root().display(),
        "configuration resolved"
    );

    if cli.check {
        let base_url = mirror.mapper().base_url();
        mirror
            .check_connection()
            .with_context(|| format!("Connection check failed for {base_url}"))?;
        if !cli.quiet {
            println!("Connected to {}", mirror.mapper().base_url());
        }
        return Ok(());
    }

    if cli.dry_run {
        let plan = mirror.plan();
        println!("{}", output::format_plan(&plan));
        return Ok(());
    }

    let report = mirror.run().context("Mirror failed")?;
    if !cli.quiet {
        println!("{}", output::format_report(&report));
    }
    Ok(())
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Categorize an error into an exit code by walking the typed error chain
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.downcast_ref::<ConfigError>().is_some()
            || cause.downcast_ref::<toml::de::Error>().is_some()
        {
            return exit_code::USAGE_ERROR;
        }

        if let Some(MirrorError::CreateDirectory { source, .. }) =
            cause.downcast_ref::<MirrorError>()
            && source.kind() == io::ErrorKind::PermissionDenied
        {
            return exit_code::PERMISSION_DENIED;
        }

        if cause.downcast_ref::<ConnectionError>().is_some() {
            return exit_code::CONNECTION_FAILED;
        }
    }

    exit_code::GENERAL_ERROR
}
