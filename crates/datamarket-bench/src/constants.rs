//! Defaults shared by the CLI, the dataset builder and the load driver.

use std::time::Duration;

/// Default JSON-RPC endpoint (a local Ganache / Anvil node).
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Default number of node-managed accounts taken from `eth_accounts`.
pub const DEFAULT_ACCOUNTS: usize = 10;

/// Default number of data resources registered during setup.
pub const DEFAULT_SETUP_DATA: usize = 500;

/// Default number of processing-right authorizations granted during setup.
pub const DEFAULT_SETUP_AUTHORIZATIONS: usize = 200;

/// Default number of data products created during setup.
pub const DEFAULT_SETUP_PRODUCTS: usize = 100;

/// Operation counts every batch kind is run at by default.
pub const DEFAULT_OPERATION_COUNTS: [usize; 5] = [10, 20, 50, 100, 200];

/// Upper bound on products listed before a purchase batch.
pub const DEFAULT_LISTING_CAP: usize = 50;

/// Gas budget for `registerDataResource`.
pub const REGISTER_GAS: u64 = 300_000;

/// Gas budget for `transferOwnership`.
pub const TRANSFER_GAS: u64 = 200_000;

/// Gas budget for `grantProcessingRight`.
pub const GRANT_GAS: u64 = 400_000;

/// Gas budget for `revokeAuthorization`.
pub const REVOKE_GAS: u64 = 200_000;

/// Gas budget for `createDataProduct`.
pub const CREATE_PRODUCT_GAS: u64 = 500_000;

/// Gas budget for `listProductForSale`.
pub const LIST_PRODUCT_GAS: u64 = 200_000;

/// Gas budget for `purchaseProduct`.
pub const PURCHASE_GAS: u64 = 300_000;

/// Duration of every granted processing right (one day).
pub const AUTHORIZATION_DURATION_SECS: u64 = 86_400;

/// Price used when listing products ahead of a purchase batch (0.001 ETH).
pub const PURCHASE_LISTING_PRICE_WEI: u128 = 1_000_000_000_000_000;

/// Lower bound of the random listing price (0.001 ETH).
pub const MIN_LISTING_PRICE_WEI: u128 = 1_000_000_000_000_000;

/// Upper bound of the random listing price (0.01 ETH).
pub const MAX_LISTING_PRICE_WEI: u128 = 10_000_000_000_000_000;

/// Length of the random string hashed into a data hash.
pub const DATA_HASH_SEED_LEN: usize = 32;

/// Length of the random metadata string of a registered resource.
pub const METADATA_LEN: usize = 20;

/// Length of the random watermark-feature string of a registered resource.
pub const WATERMARK_LEN: usize = 16;

/// Default read-only retry attempts (reads only, submissions are never retried).
pub const DEFAULT_READ_RETRIES: u32 = 0;

/// Initial backoff between read retries.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Upper bound on the backoff between read retries.
pub const DEFAULT_RETRY_MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Default RPC request timeout.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);
