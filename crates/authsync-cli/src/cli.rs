use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "authsync")]
#[command(about = "authsync: reconcile declared auth methods with the auth service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Auth service address (overrides config and AUTHSYNC_ADDR env var)
    #[arg(short, long, global = true, env = "AUTHSYNC_ADDR")]
    pub addr: Option<String>,

    /// Bearer token for the auth service
    #[arg(long, global = true, env = "AUTHSYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "AUTHSYNC_PROFILE", default_value = "default")]
    pub profile: String,

    /// Local state file
    #[arg(long, global = true, default_value = "authsync.state.json")]
    pub state: PathBuf,

    /// Use an in-process auth service instead of a remote one
    #[arg(long, global = true)]
    pub memory: bool,

    /// Read the current version before every update instead of letting the
    /// service resolve it
    #[arg(long, global = true)]
    pub read_before_write: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update the auth method described by a TOML file
    Apply(ApplyArgs),
    /// Refresh local state from the auth service
    Refresh,
    /// Delete the tracked auth method
    Destroy,
    /// Start tracking an existing auth method
    Import(ImportArgs),
    /// Print the tracked state
    Show(ShowArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    /// Path to the desired state (TOML)
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Auth method id (e.g. amoidc_1234567890)
    pub id: String,
}

#[derive(clap::Args)]
pub struct ShowArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (addr, token, log_level)
    pub key: String,
    /// Value
    pub value: String,
}
