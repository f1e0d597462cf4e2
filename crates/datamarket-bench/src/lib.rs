#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod accounts;
pub use accounts::AccountPool;

mod cli;
pub use cli::{Cli, Command, ConnectionArgs, OutputFormat, RunArgs, RunCommand};

mod config;
pub use config::{BenchConfig, ConfigError, ConnectionConfig, validate_contracts, validate_url};

mod constants;
pub use constants::*;

mod corpus;
pub use corpus::{AuthorizationRecord, Corpus, DataRecord, ProductRecord};

mod dataset;
pub use dataset::{
    CreatedProducts, Dataset, DatasetBuilder, GRANT_CONSTRAINTS, GRANT_PURPOSE, GRANT_SCOPE,
    GrantedAuthorizations, PhaseReport, RegisteredData, SetupReport, SetupTargets,
};

mod derive;
pub use derive::{PackedEncoder, derive_authorization_id, derive_data_id, derive_product_id};

mod driver;
pub use driver::{BatchOutcome, BatchStatus, DriverConfig, LoadDriver, RetryPolicy};

mod error;
pub use error::*;

mod fixtures;
pub use fixtures::{
    random_data_hash, random_listing_price, random_metadata, random_string, random_watermark,
    rng_from_seed,
};

mod gateway;
pub use gateway::{
    AlloyChainClient, AlloyGateway, AuthorizationView, BlockContext, CallOutput, ChainClient,
    ContractAddresses, ContractGateway, DataResourceView, GatewayError, GatewayResult,
    HttpProvider, IOwnershipRegistration, IProcessingRightGranting, IProductTrading, Invocation,
    ProductView, Receipt, Submission, TradeView, build_provider,
};

mod logging;
pub use logging::{LogArgs, LogFormat};

mod metrics;
pub use metrics::{ModuleLoadAverage, OperationResult, OperationSummary, ResultTable, Stat};

mod operations;
pub use operations::{EntityKind, Module, OperationKind};

mod output;
pub use output::{print_summary, save_results, write_summary};

mod progress;

mod suite;
pub use suite::{BenchSuite, CanaryResult, Preflight, PreflightReport, SuiteReport, preflight};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
