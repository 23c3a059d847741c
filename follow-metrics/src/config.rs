//! Command-line and environment configuration.
//!
//! Everything a run needs is gathered into an [`AppConfig`] value up front
//! and handed to the components that need it.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::warn;

use crate::cache::LookupCacheConfig;
use crate::export::ExportKind;
use crate::fetcher::RetryPolicy;
use crate::x_api::{ClientConfig, Credentials, OAuth1Credentials};

/// Number of identifiers kept in fast mode.
pub const FAST_SAMPLE_SIZE: usize = 10;

/// Placeholder prefix used in sample configuration; treated as unset.
const PLACEHOLDER_PREFIX: &str = "YOUR_";

/// Errors building the run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required credentials are missing
    #[error("X API credentials not configured: set {0}")]
    MissingCredentials(String),
}

/// Normal runs process every identifier; fast runs a small sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Normal,
    /// First [`FAST_SAMPLE_SIZE`] identifiers only, no rate limit waits.
    Fast,
}

impl RunMode {
    /// Shrink `items` to the working set for this mode.
    pub fn sample<T>(self, items: &mut Vec<T>) {
        if self == RunMode::Fast {
            items.truncate(FAST_SAMPLE_SIZE);
        }
    }

    /// Retry policy for this mode.
    pub fn retry_policy(self) -> RetryPolicy {
        match self {
            RunMode::Normal => RetryPolicy::default(),
            RunMode::Fast => RetryPolicy::fast(),
        }
    }
}

/// Account list selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListArg {
    Followers,
    Following,
}

impl From<ListArg> for ExportKind {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Followers => ExportKind::Followers,
            ListArg::Following => ExportKind::Following,
        }
    }
}

/// Build an enriched spreadsheet of the accounts in an X data export.
#[derive(Debug, Parser)]
#[command(name = "follow-metrics", version, about)]
pub struct Cli {
    /// Root of the unpacked X data export
    #[arg(long, env = "X_DATA_PATH", default_value = "./X Data")]
    pub data_dir: PathBuf,

    /// Report file (defaults to <data-dir>/<list>_report.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Lookup cache file (defaults to the per-user application data directory)
    #[arg(long, env = "FOLLOW_METRICS_CACHE")]
    pub cache_file: Option<PathBuf>,

    /// Neither read nor write the lookup cache
    #[arg(long)]
    pub no_cache: bool,

    /// Only process a small sample and skip rate limit waits
    #[arg(long)]
    pub fast: bool,

    /// Which account list of the export to report on
    #[arg(long, value_enum, default_value_t = ListArg::Followers)]
    pub list: ListArg,

    /// Sign requests with OAuth 1.0a instead of using a bearer token
    #[arg(long)]
    pub oauth: bool,

    /// X API base URL
    #[arg(long, env = "X_API_BASE_URL", default_value = "https://api.twitter.com")]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, env = "X_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    #[arg(long, env = "X_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "X_API_SECRET_KEY", hide_env_values = true)]
    pub api_secret_key: Option<String>,

    #[arg(long, env = "X_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "X_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub access_token_secret: Option<String>,
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub output: PathBuf,
    pub kind: ExportKind,
    /// `None` disables the lookup cache.
    pub cache: Option<LookupCacheConfig>,
    pub mode: RunMode,
    pub client: ClientConfig,
    pub policy: RetryPolicy,
}

impl AppConfig {
    /// Resolve command-line arguments into a run configuration.
    ///
    /// Fails only when credentials are missing. An undeterminable cache
    /// location disables caching with a warning.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let credentials = credentials(&cli)?;
        let kind = ExportKind::from(cli.list);
        let mode = if cli.fast {
            RunMode::Fast
        } else {
            RunMode::Normal
        };

        let output = cli
            .output
            .unwrap_or_else(|| cli.data_dir.join(default_report_name(kind)));

        let cache = if cli.no_cache {
            None
        } else {
            match cli.cache_file {
                Some(path) => Some(LookupCacheConfig::new(path)),
                None => match LookupCacheConfig::default_location() {
                    Ok(config) => Some(config),
                    Err(e) => {
                        warn!(error = %e, "Lookup cache disabled");
                        None
                    }
                },
            }
        };

        let client = ClientConfig::new(credentials)
            .with_base_url(cli.base_url)
            .with_timeout(cli.timeout);

        Ok(Self {
            data_dir: cli.data_dir,
            output,
            kind,
            cache,
            mode,
            client,
            policy: mode.retry_policy(),
        })
    }

    /// Whether the lookup cache is in use.
    pub fn use_cache(&self) -> bool {
        self.cache.is_some()
    }
}

fn default_report_name(kind: ExportKind) -> &'static str {
    match kind {
        ExportKind::Followers => "follower_report.csv",
        ExportKind::Following => "following_report.csv",
    }
}

/// A credential value that is present and not a sample placeholder.
fn configured(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.starts_with(PLACEHOLDER_PREFIX))
        .map(str::to_string)
}

fn credentials(cli: &Cli) -> Result<Credentials, ConfigError> {
    if !cli.oauth {
        return configured(&cli.bearer_token)
            .map(Credentials::Bearer)
            .ok_or_else(|| ConfigError::MissingCredentials("X_BEARER_TOKEN".to_string()));
    }

    let mut missing = Vec::new();
    let mut require = |name: &'static str, value: &Option<String>| {
        configured(value).unwrap_or_else(|| {
            missing.push(name);
            String::new()
        })
    };

    let consumer_key = require("X_API_KEY", &cli.api_key);
    let consumer_secret = require("X_API_SECRET_KEY", &cli.api_secret_key);
    let access_token = require("X_ACCESS_TOKEN", &cli.access_token);
    let access_token_secret = require("X_ACCESS_TOKEN_SECRET", &cli.access_token_secret);

    if !missing.is_empty() {
        return Err(ConfigError::MissingCredentials(missing.join(", ")));
    }

    Ok(Credentials::OAuth1(OAuth1Credentials {
        consumer_key,
        consumer_secret,
        access_token,
        access_token_secret,
    }))
}
