use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{env, path::PathBuf};
use thiserror::Error;

pub const BUCKET_NAME_VAR: &str = "BUCKET_NAME";
pub const MAX_AGE_DAYS_VAR: &str = "MAX_AGE_DAYS";
pub const SENDER_ADDR_VAR: &str = "SENDER_ADDR";
pub const RECIPIENT_ADDR_VAR: &str = "RECIPIENT_ADDR";
pub const ENDPOINT_URL_VAR: &str = "S3_ENDPOINT_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("MAX_AGE_DAYS value `{value}` is invalid: {reason}")]
    InvalidMaxAge { value: String, reason: String },
}

/// Settings every check needs. Resolved once when an invocation surface
/// starts and passed by reference from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub bucket: String,
    pub max_age_days: u32,
    pub sender: String,
    pub recipient: String,
    pub endpoint_url: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Alerts when backup manifests in a bucket go stale")]
pub struct Args {
    #[command(flatten)]
    pub monitor: MonitorArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Default)]
pub struct MonitorArgs {
    /// Bucket to scan for manifests (overrides BUCKET_NAME)
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Days a backup may age before it is stale (overrides MAX_AGE_DAYS)
    #[arg(long, global = true)]
    pub max_age_days: Option<String>,

    /// Sender address for alerts (overrides SENDER_ADDR)
    #[arg(long, global = true)]
    pub sender: Option<String>,

    /// Recipient address for alerts (overrides RECIPIENT_ADDR)
    #[arg(long, global = true)]
    pub recipient: Option<String>,

    /// S3-compatible endpoint to list instead of AWS (overrides S3_ENDPOINT_URL)
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    /// Log messages instead of sending them through SES
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single check and print its outcome as JSON
    Check {
        /// Send the report even if nothing is stale
        #[arg(long)]
        test_email: bool,

        /// JSON event document to pass to the check
        #[arg(long)]
        event: Option<PathBuf>,

        /// Scan newline-separated keys from a file instead of listing the bucket
        #[arg(long)]
        keys_file: Option<PathBuf>,
    },
    /// Serve an HTTP trigger that runs a check per request
    Serve {
        /// Host to bind to (overrides BACKUP_MONITOR_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides BACKUP_MONITOR_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Bind address for the HTTP trigger.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl MonitorConfig {
    /// Resolve from the process environment, letting CLI flags win.
    pub fn from_env_and_args(args: &MonitorArgs) -> Result<Self, ConfigError> {
        Self::resolve(args, |name| env::var(name).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    ///
    /// Empty values count as missing. Fails on the first missing setting,
    /// then on an invalid max age.
    pub fn resolve(
        args: &MonitorArgs,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let setting = |flag: &Option<String>, name: &'static str| {
            flag.clone()
                .or_else(|| lookup(name))
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let bucket = setting(&args.bucket, BUCKET_NAME_VAR)?;
        let sender = setting(&args.sender, SENDER_ADDR_VAR)?;
        let recipient = setting(&args.recipient, RECIPIENT_ADDR_VAR)?;
        let max_age_days = parse_max_age(&setting(&args.max_age_days, MAX_AGE_DAYS_VAR)?)?;
        let endpoint_url = args
            .endpoint_url
            .clone()
            .or_else(|| lookup(ENDPOINT_URL_VAR))
            .filter(|value| !value.is_empty());

        Ok(Self {
            bucket,
            max_age_days,
            sender,
            recipient,
            endpoint_url,
        })
    }
}

fn parse_max_age(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidMaxAge {
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("not an integer"))?;
    if days < 1 {
        return Err(invalid("must be positive"));
    }
    u32::try_from(days).map_err(|_| invalid("too large"))
}

impl ServerConfig {
    pub fn from_env_and_args(host: Option<String>, port: Option<u16>) -> Result<Self> {
        let env_host = env::var("BACKUP_MONITOR_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("BACKUP_MONITOR_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BACKUP_MONITOR_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading BACKUP_MONITOR_PORT"),
        };

        Ok(Self {
            host: host.unwrap_or(env_host),
            port: port.unwrap_or(env_port),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
