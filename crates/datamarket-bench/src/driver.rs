//! Load driver: executes one batch of a single operation kind.

use std::time::{Duration, Instant};

use alloy_primitives::{Address, U256};
use backon::{ExponentialBuilder, Retryable};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::{
    accounts::AccountPool,
    constants::{
        AUTHORIZATION_DURATION_SECS, DEFAULT_LISTING_CAP, DEFAULT_READ_RETRIES,
        DEFAULT_RETRY_BACKOFF, DEFAULT_RETRY_MAX_BACKOFF, PURCHASE_LISTING_PRICE_WEI,
    },
    corpus::Corpus,
    dataset::{GRANT_CONSTRAINTS, GRANT_PURPOSE, GRANT_SCOPE},
    fixtures::{random_data_hash, random_listing_price, random_metadata, random_watermark},
    gateway::{CallOutput, ContractGateway, GatewayResult, Invocation, Submission},
    operations::OperationKind,
    progress::progress_bar,
};

/// Retry policy for read-only calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Initial delay for exponential backoff.
    pub initial_backoff: Duration,
    /// Maximum delay between retries.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_READ_RETRIES,
            initial_backoff: DEFAULT_RETRY_BACKOFF,
            max_backoff: DEFAULT_RETRY_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a `backon` [`ExponentialBuilder`] from this policy.
    pub fn to_backoff_builder(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_backoff)
            .with_max_delay(self.max_backoff)
            .with_max_times(self.max_retries as usize)
            .with_jitter()
    }
}

/// Load driver settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Maximum number of products listed ahead of a purchase batch.
    pub listing_cap: usize,
    /// Retry policy for read-only calls.
    pub retry: RetryPolicy,
    /// Stop issuing attempts once a batch has run this long.
    pub batch_timeout: Option<Duration>,
    /// Show a progress bar per batch.
    pub progress: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            listing_cap: DEFAULT_LISTING_CAP,
            retry: RetryPolicy::default(),
            batch_timeout: None,
            progress: false,
        }
    }
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every requested attempt was issued.
    #[default]
    Completed,
    /// The corpus had nothing this kind could operate on. No call was made.
    NoUsableCorpus,
    /// The batch timeout expired before every attempt was issued.
    TimedOut,
}

/// Measurements of one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    /// Attempts issued.
    pub attempted: usize,
    /// Attempts that succeeded.
    pub successes: usize,
    /// Wall-clock duration of the timed section.
    pub elapsed_secs: f64,
    /// Successful operations per second.
    pub tps: f64,
    /// Elapsed time per successful operation, in milliseconds.
    pub mean_latency_ms: f64,
    /// Median latency of the successful attempts, in milliseconds.
    pub p50_latency_ms: f64,
    /// 95th percentile latency of the successful attempts, in milliseconds.
    pub p95_latency_ms: f64,
    /// How the batch ended.
    pub status: BatchStatus,
}

impl BatchOutcome {
    /// An outcome with no attempts.
    pub fn empty(status: BatchStatus) -> Self {
        Self { status, ..Default::default() }
    }

    /// Computes the outcome of a timed section.
    ///
    /// `latencies` holds the duration of every successful attempt.
    pub fn from_timings(
        attempted: usize,
        mut latencies: Vec<Duration>,
        elapsed: Duration,
        status: BatchStatus,
    ) -> Self {
        let successes = latencies.len();
        let elapsed_secs = elapsed.as_secs_f64();
        let (tps, mean_latency_ms) = if successes == 0 || elapsed_secs == 0.0 {
            (0.0, if successes == 0 { 0.0 } else { elapsed_secs / successes as f64 * 1000.0 })
        } else {
            (successes as f64 / elapsed_secs, elapsed_secs / successes as f64 * 1000.0)
        };

        latencies.sort_unstable();
        let millis: Vec<f64> = latencies.iter().map(|d| d.as_secs_f64() * 1000.0).collect();

        Self {
            attempted,
            successes,
            elapsed_secs,
            tps,
            mean_latency_ms,
            p50_latency_ms: percentile(&millis, 50.0),
            p95_latency_ms: percentile(&millis, 95.0),
            status,
        }
    }
}

/// Nearest-rank percentile of an ascending slice. Zero for an empty slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// A single planned request.
#[derive(Debug)]
enum Attempt {
    Call(Invocation),
    Send { submission: Submission, sender: Address },
}

/// Runs batches of operations against a finished corpus.
///
/// Attempts are issued one after the other. A failed attempt is counted and
/// the batch moves on.
#[derive(Debug)]
pub struct LoadDriver<'a, G> {
    gateway: &'a G,
    corpus: &'a Corpus,
    accounts: &'a AccountPool,
    config: DriverConfig,
    rng: ChaCha8Rng,
}

impl<'a, G: ContractGateway> LoadDriver<'a, G> {
    /// Creates a driver over `corpus`.
    pub const fn new(
        gateway: &'a G,
        corpus: &'a Corpus,
        accounts: &'a AccountPool,
        config: DriverConfig,
        rng: ChaCha8Rng,
    ) -> Self {
        Self { gateway, corpus, accounts, config, rng }
    }

    /// Runs `n` attempts of `kind`.
    pub async fn run(&mut self, kind: OperationKind, n: usize) -> BatchOutcome {
        if n == 0 {
            return BatchOutcome::empty(BatchStatus::Completed);
        }
        if let Some(required) = kind.requirement()
            && self.corpus.count(required) == 0
        {
            info!(%kind, %required, "No usable corpus entries, skipping batch");
            return BatchOutcome::empty(BatchStatus::NoUsableCorpus);
        }

        if kind == OperationKind::TradingPurchaseProduct {
            return self.run_purchases(n).await;
        }

        let bar = progress_bar(n, kind.to_string(), self.config.progress);
        let mut latencies = Vec::with_capacity(n);
        let mut attempted = 0;
        let mut status = BatchStatus::Completed;
        let start = Instant::now();

        for i in 0..n {
            let Some(attempt) = self.plan(kind, i) else { break };
            attempted += 1;

            let begin = Instant::now();
            let ok = self.execute(attempt).await;
            let latency = begin.elapsed();
            trace!(%kind, attempt = i, ok, latency_ms = latency.as_secs_f64() * 1000.0);
            if ok {
                latencies.push(latency);
            }
            bar.inc(1);

            if i + 1 < n && self.expired(start) {
                status = BatchStatus::TimedOut;
                break;
            }
        }

        bar.finish_and_clear();
        self.finish(kind, n, attempted, latencies, start.elapsed(), status)
    }

    /// Lists products ahead of time, untimed, then times purchases of the
    /// listed ones by a second account.
    async fn run_purchases(&mut self, n: usize) -> BatchOutcome {
        let kind = OperationKind::TradingPurchaseProduct;
        let seller = self.accounts.get(0);
        let buyer = self.accounts.get(1);
        let price = U256::from(PURCHASE_LISTING_PRICE_WEI);

        let to_list = self.config.listing_cap.min(self.corpus.products().len());
        let mut listed = Vec::with_capacity(to_list);
        for product in &self.corpus.products()[..to_list] {
            let submission = Submission::ListProductForSale { product_id: product.id, price };
            if self.send(submission, seller).await {
                listed.push((product.id, price));
            }
        }
        debug!(requested = to_list, listed = listed.len(), "Listed products for purchase batch");

        if listed.is_empty() {
            info!(%kind, "No products could be listed, skipping batch");
            return BatchOutcome::empty(BatchStatus::NoUsableCorpus);
        }

        let count = n.min(listed.len());
        let bar = progress_bar(count, kind.to_string(), self.config.progress);
        let mut latencies = Vec::with_capacity(count);
        let mut attempted = 0;
        let mut status = BatchStatus::Completed;
        let start = Instant::now();

        for (i, &(product_id, price)) in listed[..count].iter().enumerate() {
            attempted += 1;
            let begin = Instant::now();
            let ok =
                self.send(Submission::PurchaseProduct { product_id, value: price }, buyer).await;
            let latency = begin.elapsed();
            trace!(%kind, attempt = i, ok, latency_ms = latency.as_secs_f64() * 1000.0);
            if ok {
                latencies.push(latency);
            }
            bar.inc(1);

            if i + 1 < count && self.expired(start) {
                status = BatchStatus::TimedOut;
                break;
            }
        }

        bar.finish_and_clear();
        self.finish(kind, n, attempted, latencies, start.elapsed(), status)
    }

    fn finish(
        &self,
        kind: OperationKind,
        requested: usize,
        attempted: usize,
        latencies: Vec<Duration>,
        elapsed: Duration,
        status: BatchStatus,
    ) -> BatchOutcome {
        let outcome = BatchOutcome::from_timings(attempted, latencies, elapsed, status);
        info!(
            %kind,
            requested,
            attempted = outcome.attempted,
            successes = outcome.successes,
            tps = outcome.tps,
            mean_latency_ms = outcome.mean_latency_ms,
            status = ?outcome.status,
            "Batch complete"
        );
        outcome
    }

    fn expired(&self, start: Instant) -> bool {
        self.config.batch_timeout.is_some_and(|timeout| start.elapsed() >= timeout)
    }

    /// Picks the entity, sender and arguments of attempt `i`.
    fn plan(&mut self, kind: OperationKind, i: usize) -> Option<Attempt> {
        let sender = self.accounts.get(i);
        let counterparty = self.accounts.get(i + 1);
        let rng = &mut self.rng;
        let corpus = self.corpus;

        let attempt = match kind {
            OperationKind::OwnershipRegister => Attempt::Send {
                submission: Submission::RegisterDataResource {
                    data_hash: random_data_hash(rng),
                    metadata: random_metadata(rng),
                    watermark_features: random_watermark(rng),
                },
                sender,
            },
            OperationKind::OwnershipTransfer => Attempt::Send {
                submission: Submission::TransferOwnership {
                    data_id: corpus.sample_data(rng)?.id,
                    new_owner: counterparty,
                },
                sender,
            },
            OperationKind::OwnershipVerify => {
                let data_id = corpus.sample_data(rng)?.id;
                let account = self.accounts.random(rng);
                Attempt::Call(Invocation::VerifyOwnership { data_id, account })
            }
            OperationKind::OwnershipGetResource => Attempt::Call(Invocation::GetDataResource {
                data_id: corpus.sample_data(rng)?.id,
            }),
            OperationKind::ProcessingGrantRight => Attempt::Send {
                submission: Submission::GrantProcessingRight {
                    data_id: corpus.sample_data(rng)?.id,
                    grantee: counterparty,
                    duration_secs: AUTHORIZATION_DURATION_SECS,
                    purpose: GRANT_PURPOSE.to_string(),
                    scope: GRANT_SCOPE.to_string(),
                    constraints: GRANT_CONSTRAINTS.to_string(),
                },
                sender,
            },
            OperationKind::ProcessingRevoke => Attempt::Send {
                submission: Submission::RevokeAuthorization {
                    auth_id: corpus.sample_authorization(rng)?.id,
                },
                sender,
            },
            OperationKind::ProcessingVerify => {
                let data_id = corpus.sample_data(rng)?.id;
                let grantee = self.accounts.random(rng);
                Attempt::Call(Invocation::VerifyAuthorization { data_id, grantee })
            }
            OperationKind::ProcessingGetActive => {
                Attempt::Call(Invocation::GetActiveAuthorizations {
                    data_id: corpus.sample_data(rng)?.id,
                })
            }
            OperationKind::TradingCreateProduct => Attempt::Send {
                submission: Submission::CreateDataProduct {
                    original_data_id: corpus.data_at(i)?.id,
                    product_metadata: format!("Performance test product {i}"),
                    derivative_chain: Vec::new(),
                },
                sender,
            },
            OperationKind::TradingListProduct => Attempt::Send {
                submission: Submission::ListProductForSale {
                    product_id: corpus.sample_product(rng)?.id,
                    price: random_listing_price(rng),
                },
                sender,
            },
            OperationKind::TradingPurchaseProduct => return None,
            OperationKind::TradingGetHistory => {
                Attempt::Call(Invocation::GetProductTransactionHistory {
                    product_id: corpus.sample_product(rng)?.id,
                })
            }
        };
        Some(attempt)
    }

    async fn execute(&self, attempt: Attempt) -> bool {
        match attempt {
            Attempt::Call(invocation) => self.call(invocation).await.is_ok(),
            Attempt::Send { submission, sender } => self.send(submission, sender).await,
        }
    }

    /// Read-only call, retried on anything but a revert.
    async fn call(&self, invocation: Invocation) -> GatewayResult<CallOutput> {
        let backoff = self.config.retry.to_backoff_builder();
        let method = invocation.method();

        (|| async { self.gateway.invoke(invocation.clone()).await })
            .retry(backoff)
            .when(|e| !e.is_revert())
            .notify(|err, dur| {
                debug!(method, error = %err, delay = ?dur, "Retrying read-only call");
            })
            .await
    }

    /// Transaction, sent exactly once.
    async fn send(&self, submission: Submission, sender: Address) -> bool {
        let gas = submission.gas_budget();
        match self.gateway.submit(submission, sender, gas).await {
            Ok(_) => true,
            Err(err) => {
                trace!(%sender, error = %err, "Submission failed");
                false
            }
        }
    }
}
