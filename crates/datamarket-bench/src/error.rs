//! Error types for the benchmark harness.

use thiserror::Error;

use crate::{config::ConfigError, gateway::GatewayError, operations::Module};

/// Main error type for the benchmark harness.
///
/// Only fatal conditions end up here. Per-attempt [`GatewayError`]s raised
/// while building the dataset or running a batch are absorbed by those loops
/// and show up as a lower success rate instead.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The RPC endpoint could not be reached at startup.
    #[error("RPC endpoint unreachable: {0}")]
    Connectivity(String),

    /// A canary read against a module failed with something other than a revert.
    #[error("{module} module unreachable: {reason}")]
    ModuleUnreachable {
        /// The module whose canary read failed.
        module: Module,
        /// Why the module is considered unreachable.
        reason: String,
    },

    /// The node exposes no usable accounts.
    #[error("no accounts available to send transactions from")]
    NoAccounts,

    /// A gateway failure that could not be absorbed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Writing the results file failed.
    #[error("Output error: {0}")]
    Output(String),
}

/// Result type alias for harness operations.
pub type BenchResult<T> = Result<T, BenchError>;
