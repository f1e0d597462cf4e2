//! CLI argument definitions.

use std::{path::PathBuf, time::Duration};

use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::{
    constants::{
        DEFAULT_ACCOUNTS, DEFAULT_LISTING_CAP, DEFAULT_OPERATION_COUNTS, DEFAULT_RPC_URL,
        DEFAULT_SETUP_AUTHORIZATIONS, DEFAULT_SETUP_DATA, DEFAULT_SETUP_PRODUCTS,
    },
    logging::LogArgs,
    operations::OperationKind,
};

/// Benchmark harness for the data-market ownership, processing-right and
/// product-trading contracts.
#[derive(Debug, Clone, Parser)]
#[command(name = "datamarket-bench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Logging configuration arguments.
    #[command(flatten)]
    pub logging: LogArgs,
}

/// Available commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check node connectivity and send a canary read to every contract module.
    Check(ConnectionArgs),
    /// Build the dataset and run the benchmark plan.
    Run(Box<RunCommand>),
    /// List the benchmarked operation kinds.
    List,
}

/// Arguments of the `run` command.
#[derive(Debug, Clone, Args)]
pub struct RunCommand {
    /// Node and contract arguments.
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Benchmark plan arguments.
    #[command(flatten)]
    pub run: RunArgs,
}

/// Node and contract arguments.
#[derive(Debug, Clone, Args)]
#[command(next_help_heading = "Connection")]
pub struct ConnectionArgs {
    /// JSON-RPC endpoint of the node.
    #[arg(
        long = "rpc-url",
        env = "DATAMARKET_BENCH_RPC_URL",
        default_value = DEFAULT_RPC_URL,
        value_parser = parse_url
    )]
    pub rpc_url: Url,

    /// RPC request timeout (e.g. "30s", "1m").
    #[arg(
        long = "rpc-timeout",
        env = "DATAMARKET_BENCH_RPC_TIMEOUT",
        default_value = "30s",
        value_parser = parse_duration
    )]
    pub rpc_timeout: Duration,

    /// Address of the `OwnershipRegistrationContract`.
    #[arg(
        long = "ownership-address",
        env = "DATAMARKET_BENCH_OWNERSHIP_ADDRESS",
        value_parser = parse_address
    )]
    pub ownership_address: Address,

    /// Address of the `ProcessingRightGrantingContract`.
    #[arg(
        long = "processing-address",
        env = "DATAMARKET_BENCH_PROCESSING_ADDRESS",
        value_parser = parse_address
    )]
    pub processing_address: Address,

    /// Address of the `ProductTradingContract`.
    #[arg(
        long = "trading-address",
        env = "DATAMARKET_BENCH_TRADING_ADDRESS",
        value_parser = parse_address
    )]
    pub trading_address: Address,

    /// Number of node-managed accounts to send from.
    #[arg(
        long = "accounts",
        env = "DATAMARKET_BENCH_ACCOUNTS",
        default_value_t = DEFAULT_ACCOUNTS
    )]
    pub accounts: usize,
}

/// Benchmark plan arguments.
#[derive(Debug, Clone, Args)]
#[command(next_help_heading = "Benchmark")]
pub struct RunArgs {
    /// Data resources to register during setup.
    #[arg(
        long = "setup-data",
        env = "DATAMARKET_BENCH_SETUP_DATA",
        default_value_t = DEFAULT_SETUP_DATA
    )]
    pub setup_data: usize,

    /// Processing rights to grant during setup.
    #[arg(
        long = "setup-authorizations",
        env = "DATAMARKET_BENCH_SETUP_AUTHORIZATIONS",
        default_value_t = DEFAULT_SETUP_AUTHORIZATIONS
    )]
    pub setup_authorizations: usize,

    /// Data products to create during setup.
    #[arg(
        long = "setup-products",
        env = "DATAMARKET_BENCH_SETUP_PRODUCTS",
        default_value_t = DEFAULT_SETUP_PRODUCTS
    )]
    pub setup_products: usize,

    /// Operation counts every batch kind is run at (comma separated).
    #[arg(
        long = "counts",
        env = "DATAMARKET_BENCH_COUNTS",
        value_delimiter = ',',
        default_values_t = DEFAULT_OPERATION_COUNTS
    )]
    pub counts: Vec<usize>,

    /// Operation kinds to run (comma separated). Runs all when omitted.
    #[arg(long = "operations", env = "DATAMARKET_BENCH_OPERATIONS", value_delimiter = ',')]
    pub operations: Vec<OperationKind>,

    /// Maximum number of products listed ahead of a purchase batch.
    #[arg(
        long = "listing-cap",
        env = "DATAMARKET_BENCH_LISTING_CAP",
        default_value_t = DEFAULT_LISTING_CAP
    )]
    pub listing_cap: usize,

    /// Retries for read-only calls. Transactions are never retried.
    #[arg(long = "read-retries", env = "DATAMARKET_BENCH_READ_RETRIES", default_value = "0")]
    pub read_retries: u32,

    /// Initial backoff between read retries (e.g. "100ms").
    #[arg(
        long = "retry-backoff",
        env = "DATAMARKET_BENCH_RETRY_BACKOFF",
        default_value = "100ms",
        value_parser = parse_duration
    )]
    pub retry_backoff: Duration,

    /// Stop issuing new attempts in a batch after this long (e.g. "5m").
    #[arg(
        long = "batch-timeout",
        env = "DATAMARKET_BENCH_BATCH_TIMEOUT",
        value_parser = parse_duration
    )]
    pub batch_timeout: Option<Duration>,

    /// Skip reading back derived IDs during setup. Mismatches then go unreported.
    #[arg(
        long = "skip-id-verification",
        env = "DATAMARKET_BENCH_SKIP_ID_VERIFICATION",
        default_value = "false"
    )]
    pub skip_id_verification: bool,

    /// Seed for reproducible inputs and sampling.
    #[arg(long = "seed", env = "DATAMARKET_BENCH_SEED")]
    pub seed: Option<u64>,

    /// Write results as JSON to this file.
    #[arg(long = "output", short = 'o', env = "DATAMARKET_BENCH_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Summary format printed on stdout.
    #[arg(long = "format", default_value = "text")]
    pub format: OutputFormat,

    /// Disable progress bars.
    #[arg(long = "no-progress", default_value = "false")]
    pub no_progress: bool,
}

/// Format of the summary printed on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables.
    #[default]
    Text,
    /// JSON document.
    Json,
}

/// Parse a duration string like "100ms", "30s", "5m".
fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

/// Parse a URL string.
fn parse_url(s: &str) -> Result<Url, url::ParseError> {
    Url::parse(s)
}

/// Parse an Ethereum address from hex string.
fn parse_address(s: &str) -> Result<Address, alloy_primitives::hex::FromHexError> {
    s.parse()
}
