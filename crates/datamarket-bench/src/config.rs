//! Configuration types and validation.

use std::{path::PathBuf, time::Duration};

use alloy_primitives::Address;
use thiserror::Error;
use url::Url;

use crate::{
    cli::{ConnectionArgs, OutputFormat, RunArgs},
    constants::DEFAULT_RETRY_MAX_BACKOFF,
    dataset::SetupTargets,
    driver::{DriverConfig, RetryPolicy},
    gateway::ContractAddresses,
    operations::OperationKind,
};

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid URL format.
    #[error("invalid {field} URL: {reason}")]
    InvalidUrl {
        /// The field name that contains the invalid URL.
        field: &'static str,
        /// The reason the URL is invalid.
        reason: String,
    },
    /// A field value is out of the allowed range.
    #[error("{field} must be {constraint}, got {value}")]
    OutOfRange {
        /// The field name that is out of range.
        field: &'static str,
        /// The constraint description.
        constraint: &'static str,
        /// The actual value.
        value: String,
    },
    /// Two contract modules point at the same address.
    #[error("{first} and {second} share address {address}")]
    DuplicateAddress {
        /// First field.
        first: &'static str,
        /// Second field.
        second: &'static str,
        /// The shared address.
        address: Address,
    },
}

/// Validated node and contract configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// RPC request timeout.
    pub rpc_timeout: Duration,
    /// Contract module addresses.
    pub contracts: ContractAddresses,
    /// Number of node-managed accounts to use.
    pub accounts: usize,
}

impl ConnectionConfig {
    /// Validates connection arguments.
    pub fn from_args(args: &ConnectionArgs) -> Result<Self, ConfigError> {
        validate_url(&args.rpc_url, "rpc-url")?;

        if args.rpc_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "rpc-timeout",
                constraint: "greater than zero",
                value: format!("{:?}", args.rpc_timeout),
            });
        }
        if args.accounts == 0 {
            return Err(ConfigError::OutOfRange {
                field: "accounts",
                constraint: "at least 1",
                value: "0".to_string(),
            });
        }

        let contracts = ContractAddresses {
            ownership: args.ownership_address,
            processing: args.processing_address,
            trading: args.trading_address,
        };
        validate_contracts(&contracts)?;

        Ok(Self {
            rpc_url: args.rpc_url.clone(),
            rpc_timeout: args.rpc_timeout,
            contracts,
            accounts: args.accounts,
        })
    }
}

/// Validated configuration of a benchmark run.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Node and contracts.
    pub connection: ConnectionConfig,
    /// Setup phase targets.
    pub setup: SetupTargets,
    /// Operation counts every kind is run at.
    pub counts: Vec<usize>,
    /// Operation kinds to run, in order.
    pub operations: Vec<OperationKind>,
    /// Load driver settings.
    pub driver: DriverConfig,
    /// Read back derived IDs during setup.
    pub verify_ids: bool,
    /// RNG seed.
    pub seed: Option<u64>,
    /// JSON results file.
    pub output: Option<PathBuf>,
    /// Summary format.
    pub format: OutputFormat,
    /// Show progress bars.
    pub progress: bool,
}

impl BenchConfig {
    /// Validates `run` arguments.
    pub fn from_args(connection: &ConnectionArgs, run: &RunArgs) -> Result<Self, ConfigError> {
        let connection = ConnectionConfig::from_args(connection)?;

        if run.counts.is_empty() {
            return Err(ConfigError::OutOfRange {
                field: "counts",
                constraint: "a non-empty list",
                value: "[]".to_string(),
            });
        }
        if run.listing_cap == 0 {
            return Err(ConfigError::OutOfRange {
                field: "listing-cap",
                constraint: "at least 1",
                value: "0".to_string(),
            });
        }
        if run.retry_backoff > DEFAULT_RETRY_MAX_BACKOFF {
            return Err(ConfigError::OutOfRange {
                field: "retry-backoff",
                constraint: "at most 2s",
                value: format!("{:?}", run.retry_backoff),
            });
        }
        if run.batch_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::OutOfRange {
                field: "batch-timeout",
                constraint: "greater than zero",
                value: "0s".to_string(),
            });
        }

        let operations =
            if run.operations.is_empty() { OperationKind::ALL.to_vec() } else { dedup(&run.operations) };

        Ok(Self {
            connection,
            setup: SetupTargets {
                data: run.setup_data,
                authorizations: run.setup_authorizations,
                products: run.setup_products,
            },
            counts: run.counts.clone(),
            operations,
            driver: DriverConfig {
                listing_cap: run.listing_cap,
                retry: RetryPolicy {
                    max_retries: run.read_retries,
                    initial_backoff: run.retry_backoff,
                    max_backoff: DEFAULT_RETRY_MAX_BACKOFF,
                },
                batch_timeout: run.batch_timeout,
                progress: !run.no_progress,
            },
            verify_ids: !run.skip_id_verification,
            seed: run.seed,
            output: run.output.clone(),
            format: run.format,
            progress: !run.no_progress,
        })
    }
}

/// Validate that a URL has a scheme and host.
pub fn validate_url(url: &Url, field: &'static str) -> Result<(), ConfigError> {
    if url.scheme().is_empty() {
        return Err(ConfigError::InvalidUrl { field, reason: "missing scheme".to_string() });
    }

    if url.host().is_none() {
        return Err(ConfigError::InvalidUrl { field, reason: "missing host".to_string() });
    }

    Ok(())
}

/// Validate that every module has a distinct, non-zero address.
pub fn validate_contracts(contracts: &ContractAddresses) -> Result<(), ConfigError> {
    let fields = [
        ("ownership-address", contracts.ownership),
        ("processing-address", contracts.processing),
        ("trading-address", contracts.trading),
    ];

    for (i, &(field, address)) in fields.iter().enumerate() {
        if address.is_zero() {
            return Err(ConfigError::OutOfRange {
                field,
                constraint: "a non-zero address",
                value: address.to_string(),
            });
        }
        if let Some(&(second, _)) = fields[i + 1..].iter().find(|(_, other)| *other == address) {
            return Err(ConfigError::DuplicateAddress { first: field, second, address });
        }
    }

    Ok(())
}

fn dedup(kinds: &[OperationKind]) -> Vec<OperationKind> {
    let mut out = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !out.contains(kind) {
            out.push(*kind);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Command};

    fn run_args(extra: &[&str]) -> (ConnectionArgs, RunArgs) {
        let args = [
            "datamarket-bench",
            "run",
            "--ownership-address",
            "0x1111111111111111111111111111111111111111",
            "--processing-address",
            "0x2222222222222222222222222222222222222222",
            "--trading-address",
            "0x3333333333333333333333333333333333333333",
        ]
        .into_iter()
        .chain(extra.iter().copied());
        let Command::Run(cmd) = Cli::try_parse_from(args).unwrap().command else {
            panic!("expected run")
        };
        (cmd.connection, cmd.run)
    }

    fn parse(extra: &[&str]) -> Result<BenchConfig, ConfigError> {
        let (connection, run) = run_args(extra);
        BenchConfig::from_args(&connection, &run)
    }

    #[test]
    fn test_defaults_run_every_kind() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.operations, OperationKind::ALL.to_vec());
        assert_eq!(config.setup, SetupTargets { data: 500, authorizations: 200, products: 100 });
        assert_eq!(config.driver.listing_cap, 50);
        assert_eq!(config.driver.retry.max_retries, 0);
        assert!(config.progress);
        assert!(config.verify_ids);
    }

    #[test]
    fn test_skip_id_verification_opts_out() {
        let config = parse(&["--skip-id-verification"]).unwrap();
        assert!(!config.verify_ids);
    }

    #[test]
    fn test_rejects_zero_accounts() {
        let err = parse(&["--accounts", "0"]).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "accounts", .. }));
    }

    #[test]
    fn test_rejects_empty_counts() {
        let (connection, mut run) = run_args(&[]);
        run.counts.clear();
        let err = BenchConfig::from_args(&connection, &run).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "counts", .. }));
    }

    #[test]
    fn test_rejects_zero_listing_cap() {
        let err = parse(&["--listing-cap", "0"]).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "listing-cap", .. }));
    }

    #[test]
    fn test_rejects_zero_batch_timeout() {
        let err = parse(&["--batch-timeout", "0s"]).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "batch-timeout", .. }));
    }

    #[test]
    fn test_rejects_duplicate_addresses() {
        let contracts = ContractAddresses {
            ownership: Address::repeat_byte(1),
            processing: Address::repeat_byte(2),
            trading: Address::repeat_byte(1),
        };
        let err = validate_contracts(&contracts).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateAddress {
                first: "ownership-address",
                second: "trading-address",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_zero_address() {
        let contracts = ContractAddresses {
            ownership: Address::repeat_byte(1),
            processing: Address::ZERO,
            trading: Address::repeat_byte(3),
        };
        assert!(matches!(
            validate_contracts(&contracts),
            Err(ConfigError::OutOfRange { field: "processing-address", .. })
        ));
    }

    #[test]
    fn test_url_without_host() {
        let url = Url::parse("file:///some/path").unwrap();
        let result = validate_url(&url, "rpc-url");
        assert!(matches!(result, Err(ConfigError::InvalidUrl { field: "rpc-url", .. })));
    }

    #[test]
    fn test_operations_are_deduplicated() {
        let config =
            parse(&["--operations", "ownership-verify,ownership-verify,trading-get-history"])
                .unwrap();
        assert_eq!(
            config.operations,
            vec![OperationKind::OwnershipVerify, OperationKind::TradingGetHistory]
        );
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::OutOfRange {
            field: "accounts",
            constraint: "at least 1",
            value: "0".to_string(),
        };
        assert_eq!(error.to_string(), "accounts must be at least 1, got 0");
    }
}
