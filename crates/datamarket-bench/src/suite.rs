//! Benchmark suite: preflight, setup barrier and the batch plan.

use std::time::Instant;

use alloy_primitives::{Address, B256, keccak256};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    accounts::AccountPool,
    config::BenchConfig,
    dataset::{DatasetBuilder, SetupReport},
    driver::LoadDriver,
    error::{BenchError, BenchResult},
    fixtures::rng_from_seed,
    gateway::{BlockContext, ChainClient, ContractGateway, Invocation},
    metrics::{ModuleLoadAverage, OperationSummary, ResultTable},
    operations::Module,
};

/// Preimage of the ID read by canary calls. The ID is never registered.
const CANARY_PREIMAGE: &[u8] = b"test";

/// Result of the canary read against one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanaryResult {
    /// Probed module.
    pub module: Module,
    /// Contract method called.
    pub method: &'static str,
    /// The call reverted. A revert still proves the module answers.
    pub reverted: bool,
}

/// What the preflight found out about the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreflightReport {
    /// Chain ID reported by the node.
    pub chain_id: u64,
    /// Latest block at preflight time.
    pub latest_block: BlockContext,
    /// Accounts the run sends from.
    pub accounts: Vec<Address>,
    /// Canary read per module.
    pub canaries: Vec<CanaryResult>,
}

/// A passed preflight.
#[derive(Debug, Clone)]
pub struct Preflight {
    /// Sender accounts.
    pub accounts: AccountPool,
    /// Findings.
    pub report: PreflightReport,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Preflight findings.
    pub preflight: PreflightReport,
    /// Setup phases.
    pub setup: SetupReport,
    /// One row per batch, in execution order.
    pub results: ResultTable,
    /// Rows grouped by module and operation.
    pub summary: Vec<OperationSummary>,
    /// Rows averaged per module and requested count.
    pub module_averages: Vec<ModuleLoadAverage>,
    /// Wall-clock duration of the whole run.
    pub elapsed_secs: f64,
}

/// Checks connectivity, selects the sender accounts and sends a canary read to every module.
///
/// A canary read that reverts is fine. Any other failure means the module is
/// unreachable and aborts the run before load is generated.
pub async fn preflight<C, G>(chain: &C, gateway: &G, account_limit: usize) -> BenchResult<Preflight>
where
    C: ChainClient,
    G: ContractGateway,
{
    if !chain.is_connected().await {
        return Err(BenchError::Connectivity("node did not answer eth_blockNumber".to_string()));
    }

    let chain_id = chain.chain_id().await?;
    let latest_block = chain.latest_context().await?;
    info!(chain_id, block = latest_block.number, "Connected to node");

    let accounts = AccountPool::take(chain.list_accounts().await?, account_limit)?;
    for &account in accounts.as_slice() {
        match chain.balance(account).await {
            Ok(balance) => debug!(%account, %balance, "Sender account"),
            Err(err) => warn!(%account, error = %err, "Could not read sender balance"),
        }
    }
    info!(accounts = accounts.len(), "Selected sender accounts");

    let canary_id = keccak256(CANARY_PREIMAGE);
    let mut canaries = Vec::with_capacity(Module::ALL.len());
    for module in Module::ALL {
        let canary = canary_call(module, canary_id, accounts.get(0));
        let method = canary.method();

        let reverted = match gateway.invoke(canary).await {
            Ok(_) => false,
            Err(err) if err.is_revert() => {
                debug!(%module, error = %err, "Canary read reverted");
                true
            }
            Err(err) => {
                return Err(BenchError::ModuleUnreachable { module, reason: err.to_string() });
            }
        };
        info!(%module, method, "Module reachable");
        canaries.push(CanaryResult { module, method, reverted });
    }

    Ok(Preflight {
        report: PreflightReport {
            chain_id,
            latest_block,
            accounts: accounts.as_slice().to_vec(),
            canaries,
        },
        accounts,
    })
}

const fn canary_call(module: Module, canary_id: B256, account: Address) -> Invocation {
    match module {
        Module::Ownership => Invocation::GetDataResource { data_id: canary_id },
        Module::Processing => {
            Invocation::VerifyAuthorization { data_id: canary_id, grantee: account }
        }
        Module::Trading => Invocation::GetProductTransactionHistory { product_id: canary_id },
    }
}

/// Owns the run context: clients, configuration and the results table.
#[derive(Debug)]
pub struct BenchSuite<C, G> {
    chain: C,
    gateway: G,
    config: BenchConfig,
}

impl<C, G> BenchSuite<C, G>
where
    C: ChainClient,
    G: ContractGateway,
{
    /// Creates a suite.
    pub const fn new(chain: C, gateway: G, config: BenchConfig) -> Self {
        Self { chain, gateway, config }
    }

    /// Returns the run configuration.
    pub const fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Runs the preflight, builds the dataset, then every batch of the plan.
    ///
    /// Batches run kind by kind, each kind at every configured count. Only
    /// preflight failures are returned as errors.
    pub async fn run(&self) -> BenchResult<SuiteReport> {
        let start = Instant::now();
        let Preflight { accounts, report: preflight } =
            preflight(&self.chain, &self.gateway, self.config.connection.accounts).await?;

        let mut rng = rng_from_seed(self.config.seed);
        let setup_rng = ChaCha8Rng::from_rng(&mut rng);
        let driver_rng = ChaCha8Rng::from_rng(&mut rng);

        let dataset = DatasetBuilder::new(&self.chain, &self.gateway, &accounts, setup_rng)
            .with_verify_ids(self.config.verify_ids)
            .with_progress(self.config.progress)
            .build(self.config.setup)
            .await;

        let mut driver = LoadDriver::new(
            &self.gateway,
            &dataset.corpus,
            &accounts,
            self.config.driver,
            driver_rng,
        );
        let mut results = ResultTable::new();

        for &kind in &self.config.operations {
            info!(%kind, counts = ?self.config.counts, "Running operation");
            for &count in &self.config.counts {
                let outcome = driver.run(kind, count).await;
                results.record(kind.module(), kind.operation(), count, &outcome);
            }
        }

        let summary = results.summarize();
        let module_averages = results.module_averages_by_count();
        let elapsed_secs = start.elapsed().as_secs_f64();
        info!(batches = results.len(), elapsed_secs, "Benchmark complete");

        Ok(SuiteReport {
            preflight,
            setup: dataset.report,
            results,
            summary,
            module_averages,
            elapsed_secs,
        })
    }
}
