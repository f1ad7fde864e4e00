use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use reqwest::Url;
use thiserror::Error;

use crate::chain::Commitment;
use crate::wallet::AllowList;
use crate::withdrawal::DEFAULT_PAGE_SIZE;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_KEYPAIR_PATH: &str = "~/.config/solana/id.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {field} URL {value:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid allow-list entry {0:?}")]
    InvalidAllowListEntry(String),
    #[error("allow-list override is empty")]
    EmptyAllowList,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Deployment settings, from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Base URL of the admin backend
    #[arg(long, env = "BACKEND_URI")]
    pub backend_uri: String,

    /// Solana JSON-RPC endpoint
    #[arg(long, env = "SOLANA_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Operator keypair file
    #[arg(long, env = "ADMIN_KEYPAIR", default_value = DEFAULT_KEYPAIR_PATH)]
    pub keypair: String,

    /// Let the wallet reconnect silently at start-up
    #[arg(long, env = "ADMIN_AUTO_CONNECT")]
    pub auto_connect: bool,

    /// Override the built-in operator allow-list (comma separated public keys)
    #[arg(long = "allow", env = "ADMIN_ALLOWLIST", value_delimiter = ',')]
    pub allowlist: Vec<String>,

    /// Commitment a payout must reach (processed/confirmed/finalized)
    #[arg(long, default_value = "confirmed")]
    pub commitment: Commitment,

    /// HTTP timeout in seconds for backend and RPC calls
    #[arg(long, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Delay between confirmation polls in milliseconds
    #[arg(long, default_value_t = 500)]
    pub poll_interval_ms: u64,

    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub backend_url: Url,
    pub rpc_url: Url,
    pub keypair_path: PathBuf,
    pub auto_connect: bool,
    pub allowlist: AllowList,
    pub commitment: Commitment,
    pub http_timeout: Duration,
    pub poll_interval: Duration,
    pub page_size: usize,
}

impl ConsoleConfig {
    pub fn from_args(args: ConfigArgs) -> Result<Self, ConfigError> {
        let backend_url = parse_url("backend", &args.backend_uri)?;
        let rpc_url = parse_url("RPC", &args.rpc_url)?;
        let allowlist = if args.allowlist.is_empty() {
            AllowList::default()
        } else {
            AllowList::parse(&args.allowlist)?
        };
        if args.page_size == 0 {
            return Err(ConfigError::Zero("page size"));
        }
        if args.http_timeout_secs == 0 {
            return Err(ConfigError::Zero("HTTP timeout"));
        }

        Ok(Self {
            backend_url,
            rpc_url,
            keypair_path: expand_home(&args.keypair),
            auto_connect: args.auto_connect,
            allowlist,
            commitment: args.commitment,
            http_timeout: Duration::from_secs(args.http_timeout_secs),
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            page_size: args.page_size,
        })
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
