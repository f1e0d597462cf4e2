//! Dependency-aware dataset builder.
//!
//! Setup runs three phases in a fixed order: register data resources, grant
//! processing rights on them, then create products from them. Each phase
//! consumes the output type of the one before it ([`RegisteredData`] →
//! [`GrantedAuthorizations`] → [`CreatedProducts`]), and only the last one can
//! be turned into a [`Corpus`].
//!
//! A failed item is logged, counted and skipped. IDs are never queried from
//! the node: they are derived from the submitted inputs and the context of the
//! block that included the transaction.

use std::time::Instant;

use alloy_primitives::{Address, B256};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    accounts::AccountPool,
    constants::AUTHORIZATION_DURATION_SECS,
    corpus::{AuthorizationRecord, Corpus, DataRecord, ProductRecord},
    derive::{derive_authorization_id, derive_data_id, derive_product_id},
    fixtures::{random_data_hash, random_metadata, random_watermark},
    gateway::{
        BlockContext, CallOutput, ChainClient, ContractGateway, GatewayError, GatewayResult,
        Invocation, Receipt, Submission,
    },
    progress::progress_bar,
};

/// Purpose declared on every setup grant.
pub const GRANT_PURPOSE: &str = "Performance testing";

/// Scope declared on every setup grant.
pub const GRANT_SCOPE: &str = "Full access";

/// Constraints declared on every setup grant.
pub const GRANT_CONSTRAINTS: &str = "No constraints";

/// Number of entities each setup phase tries to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SetupTargets {
    /// Data resources to register.
    pub data: usize,
    /// Authorizations to grant, capped at the number of registered resources.
    pub authorizations: usize,
    /// Products to create, capped at the number of registered resources.
    pub products: usize,
}

/// Outcome of one setup phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseReport {
    /// Requested entity count.
    pub target: usize,
    /// Submissions sent.
    pub attempted: usize,
    /// Entities added to the corpus.
    pub succeeded: usize,
    /// Submissions that failed or whose block context could not be read.
    pub failed: usize,
    /// Derived IDs the read-back check did not confirm.
    pub id_mismatches: usize,
    /// The phase had no prerequisites and did not run.
    pub skipped: bool,
    /// Wall-clock duration of the phase.
    pub elapsed_secs: f64,
}

/// Reports of the three setup phases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetupReport {
    /// Data registration.
    pub registration: PhaseReport,
    /// Processing-right grants.
    pub authorization: PhaseReport,
    /// Product creation.
    pub products: PhaseReport,
}

/// A finished dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Entities available to batches.
    pub corpus: Corpus,
    /// How setup went.
    pub report: SetupReport,
}

/// Output of the registration phase.
#[derive(Debug)]
pub struct RegisteredData {
    corpus: Corpus,
    report: SetupReport,
}

/// Output of the authorization phase.
#[derive(Debug)]
pub struct GrantedAuthorizations {
    corpus: Corpus,
    report: SetupReport,
}

/// Output of the product phase.
#[derive(Debug)]
pub struct CreatedProducts {
    corpus: Corpus,
    report: SetupReport,
}

impl CreatedProducts {
    /// Seals the corpus.
    pub fn finish(self) -> Dataset {
        Dataset { corpus: self.corpus, report: self.report }
    }
}

/// Builds the corpus through the three ordered setup phases.
#[derive(Debug)]
pub struct DatasetBuilder<'a, C, G> {
    chain: &'a C,
    gateway: &'a G,
    accounts: &'a AccountPool,
    rng: ChaCha8Rng,
    verify_ids: bool,
    progress: bool,
}

impl<'a, C, G> DatasetBuilder<'a, C, G>
where
    C: ChainClient,
    G: ContractGateway,
{
    /// Creates a builder sending from `accounts`.
    pub const fn new(
        chain: &'a C,
        gateway: &'a G,
        accounts: &'a AccountPool,
        rng: ChaCha8Rng,
    ) -> Self {
        Self { chain, gateway, accounts, rng, verify_ids: true, progress: false }
    }

    /// Reads back every derived ID before adding it to the corpus. On by default.
    pub const fn with_verify_ids(mut self, verify_ids: bool) -> Self {
        self.verify_ids = verify_ids;
        self
    }

    /// Shows a progress bar per phase.
    pub const fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Runs all three phases.
    pub async fn build(mut self, targets: SetupTargets) -> Dataset {
        let registered = self.register_data(targets.data).await;
        let granted = self.grant_authorizations(registered, targets.authorizations).await;
        let created = self.create_products(granted, targets.products).await;
        let dataset = created.finish();

        info!(
            data = dataset.corpus.data().len(),
            authorizations = dataset.corpus.authorizations().len(),
            products = dataset.corpus.products().len(),
            "Dataset ready"
        );
        dataset
    }

    /// Registers `target` data resources, owners assigned round-robin.
    pub async fn register_data(&mut self, target: usize) -> RegisteredData {
        let start = Instant::now();
        let mut corpus = Corpus::default();
        let mut report = PhaseReport { target, ..Default::default() };
        let bar = progress_bar(target, "Registering data", self.progress);
        info!(target, "Registering data resources");

        for i in 0..target {
            let owner = self.accounts.get(i);
            let data_hash = random_data_hash(&mut self.rng);
            let metadata = random_metadata(&mut self.rng);
            let watermark = random_watermark(&mut self.rng);

            report.attempted += 1;
            let submission = Submission::RegisterDataResource {
                data_hash,
                metadata: metadata.clone(),
                watermark_features: watermark.clone(),
            };

            match self.submit_and_locate(submission, owner).await {
                Ok(block) => {
                    let id = derive_data_id(data_hash, &metadata, &block, owner);
                    if self.confirm_data(id).await {
                        corpus.push_data(DataRecord {
                            id,
                            data_hash,
                            metadata,
                            watermark,
                            block,
                            owner,
                        });
                        report.succeeded += 1;
                    } else {
                        report.id_mismatches += 1;
                    }
                }
                Err(err) => {
                    debug!(index = i, %owner, error = %err, "Data registration failed");
                    report.failed += 1;
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        report.elapsed_secs = start.elapsed().as_secs_f64();
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            id_mismatches = report.id_mismatches,
            "Data registration complete"
        );

        RegisteredData {
            corpus,
            report: SetupReport { registration: report, ..Default::default() },
        }
    }

    /// Grants up to `target` processing rights on randomly sampled resources.
    ///
    /// The grantor is the resource owner and the grantee the next account in
    /// the pool.
    pub async fn grant_authorizations(
        &mut self,
        registered: RegisteredData,
        target: usize,
    ) -> GrantedAuthorizations {
        let RegisteredData { mut corpus, mut report } = registered;
        let count = target.min(corpus.data().len());
        let mut phase = PhaseReport { target, ..Default::default() };

        if corpus.data().is_empty() {
            if target > 0 {
                warn!(target, "No data resources registered, skipping authorization phase");
            }
            phase.skipped = true;
            report.authorization = phase;
            return GrantedAuthorizations { corpus, report };
        }

        let start = Instant::now();
        let bar = progress_bar(count, "Granting rights", self.progress);
        info!(count, "Granting processing rights");

        for i in 0..count {
            let index = self.rng.random_range(0..corpus.data().len());
            let (data_id, grantor) = {
                let record = &corpus.data()[index];
                (record.id, record.owner)
            };
            let grantee = self.accounts.next_after(grantor);

            phase.attempted += 1;
            let submission = Submission::GrantProcessingRight {
                data_id,
                grantee,
                duration_secs: AUTHORIZATION_DURATION_SECS,
                purpose: GRANT_PURPOSE.to_string(),
                scope: GRANT_SCOPE.to_string(),
                constraints: GRANT_CONSTRAINTS.to_string(),
            };

            match self.submit_and_locate(submission, grantor).await {
                Ok(block) => {
                    let id = derive_authorization_id(data_id, grantee, &block, grantor);
                    if self.confirm_authorization(data_id, id).await {
                        let record = AuthorizationRecord { id, data_id, grantor, grantee, block };
                        if corpus.push_authorization(record) {
                            phase.succeeded += 1;
                        } else {
                            warn!(%id, %data_id, "Authorization references unknown data, dropped");
                            phase.failed += 1;
                        }
                    } else {
                        phase.id_mismatches += 1;
                    }
                }
                Err(err) => {
                    debug!(index = i, %data_id, %grantor, error = %err, "Grant failed");
                    phase.failed += 1;
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        phase.elapsed_secs = start.elapsed().as_secs_f64();
        info!(
            succeeded = phase.succeeded,
            failed = phase.failed,
            id_mismatches = phase.id_mismatches,
            "Authorization phase complete"
        );

        report.authorization = phase;
        GrantedAuthorizations { corpus, report }
    }

    /// Creates up to `target` products, product `i` derived from resource `i`
    /// by its owner.
    pub async fn create_products(
        &mut self,
        granted: GrantedAuthorizations,
        target: usize,
    ) -> CreatedProducts {
        let GrantedAuthorizations { mut corpus, mut report } = granted;
        let count = target.min(corpus.data().len());
        let mut phase = PhaseReport { target, ..Default::default() };

        if corpus.data().is_empty() {
            if target > 0 {
                warn!(target, "No data resources registered, skipping product phase");
            }
            phase.skipped = true;
            report.products = phase;
            return CreatedProducts { corpus, report };
        }

        let start = Instant::now();
        let bar = progress_bar(count, "Creating products", self.progress);
        info!(count, "Creating data products");

        for i in 0..count {
            let (original_data_id, creator) = {
                let record = &corpus.data()[i];
                (record.id, record.owner)
            };
            let metadata = format!("Test product {i}");

            phase.attempted += 1;
            let submission = Submission::CreateDataProduct {
                original_data_id,
                product_metadata: metadata.clone(),
                derivative_chain: Vec::new(),
            };

            match self.submit_and_locate(submission, creator).await {
                Ok(block) => {
                    let id = derive_product_id(original_data_id, &metadata, &block, creator);
                    if self.confirm_product(creator, id).await {
                        let record =
                            ProductRecord { id, original_data_id, metadata, block, creator };
                        if corpus.push_product(record) {
                            phase.succeeded += 1;
                        } else {
                            warn!(
                                %id,
                                %original_data_id,
                                "Product references unknown data, dropped"
                            );
                            phase.failed += 1;
                        }
                    } else {
                        phase.id_mismatches += 1;
                    }
                }
                Err(err) => {
                    debug!(
                        index = i,
                        %original_data_id,
                        %creator,
                        error = %err,
                        "Product creation failed"
                    );
                    phase.failed += 1;
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        phase.elapsed_secs = start.elapsed().as_secs_f64();
        info!(
            succeeded = phase.succeeded,
            failed = phase.failed,
            id_mismatches = phase.id_mismatches,
            "Product phase complete"
        );

        report.products = phase;
        CreatedProducts { corpus, report }
    }

    /// Sends a submission and returns the context of the block that included it.
    ///
    /// The context is read per transaction: the contracts hash the including
    /// block's timestamp, which changes from one transaction to the next.
    async fn submit_and_locate(
        &self,
        submission: Submission,
        sender: Address,
    ) -> GatewayResult<BlockContext> {
        let gas = submission.gas_budget();
        let receipt = self.gateway.submit(submission, sender, gas).await?;
        self.inclusion_context(&receipt).await
    }

    async fn inclusion_context(&self, receipt: &Receipt) -> GatewayResult<BlockContext> {
        match receipt.block_number {
            Some(number) => self.chain.context_at(number).await,
            None => self.chain.latest_context().await,
        }
    }

    async fn confirm_data(&self, id: B256) -> bool {
        if !self.verify_ids {
            return true;
        }
        let result = self.gateway.invoke(Invocation::GetDataResource { data_id: id }).await;
        let confirmed = matches!(&result, Ok(CallOutput::DataResource(r)) if r.is_registered);
        report_unconfirmed("data", id, confirmed, result.err());
        confirmed
    }

    async fn confirm_authorization(&self, data_id: B256, id: B256) -> bool {
        if !self.verify_ids {
            return true;
        }
        let result = self.gateway.invoke(Invocation::GetActiveAuthorizations { data_id }).await;
        let confirmed = matches!(
            &result,
            Ok(CallOutput::Authorizations(auths)) if auths.iter().any(|a| a.auth_id == id)
        );
        report_unconfirmed("authorization", id, confirmed, result.err());
        confirmed
    }

    async fn confirm_product(&self, creator: Address, id: B256) -> bool {
        if !self.verify_ids {
            return true;
        }
        let result = self.gateway.invoke(Invocation::GetUserProducts { user: creator }).await;
        let confirmed = matches!(
            &result,
            Ok(CallOutput::Products(products)) if products.iter().any(|p| p.product_id == id)
        );
        report_unconfirmed("product", id, confirmed, result.err());
        confirmed
    }
}

fn report_unconfirmed(entity: &str, id: B256, confirmed: bool, error: Option<GatewayError>) {
    if confirmed {
        return;
    }
    match error {
        Some(err) => warn!(entity, %id, error = %err, "Could not read back derived ID"),
        None => warn!(entity, %id, "Derived ID not found on chain"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fixtures::rng_from_seed,
        operations::EntityKind,
        test_utils::{MockChain, MockGateway, mock_network},
    };

    async fn pool(chain: &MockChain) -> AccountPool {
        AccountPool::new(chain.list_accounts().await.unwrap()).unwrap()
    }

    async fn build(
        chain: &MockChain,
        gateway: &MockGateway,
        targets: SetupTargets,
        verify_ids: bool,
    ) -> Dataset {
        let accounts = pool(chain).await;
        DatasetBuilder::new(chain, gateway, &accounts, rng_from_seed(Some(11)))
            .with_verify_ids(verify_ids)
            .build(targets)
            .await
    }

    fn assert_rederivable(corpus: &Corpus) {
        assert!(corpus.data().iter().all(|r| r.rederive() == r.id));
        assert!(corpus.authorizations().iter().all(|r| r.rederive() == r.id));
        assert!(corpus.products().iter().all(|r| r.rederive() == r.id));
    }

    #[tokio::test]
    async fn test_every_fifth_registration_fails() {
        let (chain, gateway) = mock_network(10);
        let gateway = gateway.fail_every_nth_submission(5);
        let accounts = pool(&chain).await;

        let mut builder = DatasetBuilder::new(&chain, &gateway, &accounts, rng_from_seed(Some(1)));
        let registered = builder.register_data(500).await;

        assert_eq!(registered.corpus.data().len(), 400);
        assert_eq!(registered.report.registration.failed, 100);
        assert_eq!(registered.report.registration.attempted, 500);
        assert_rederivable(&registered.corpus);
    }

    #[tokio::test]
    async fn test_full_build_respects_bounds() {
        let (chain, gateway) = mock_network(10);
        let targets = SetupTargets { data: 30, authorizations: 50, products: 40 };
        let dataset = build(&chain, &gateway, targets, true).await;
        let corpus = &dataset.corpus;

        assert_eq!(corpus.count(EntityKind::Data), 30);
        assert_eq!(corpus.count(EntityKind::Authorization), 30);
        assert_eq!(corpus.count(EntityKind::Product), 30);
        assert_eq!(dataset.report.authorization.attempted, 30);
        assert_eq!(dataset.report.products.id_mismatches, 0);
        assert_rederivable(corpus);
    }

    #[tokio::test]
    async fn test_grants_come_from_owner_to_next_account() {
        let (chain, gateway) = mock_network(4);
        let accounts = pool(&chain).await;
        let targets = SetupTargets { data: 8, authorizations: 8, products: 0 };
        let dataset = build(&chain, &gateway, targets, false).await;

        for auth in dataset.corpus.authorizations() {
            let data = dataset.corpus.data().iter().find(|d| d.id == auth.data_id).unwrap();
            assert_eq!(auth.grantor, data.owner);
            assert_eq!(auth.grantee, accounts.next_after(auth.grantor));
            assert_ne!(auth.grantee, auth.grantor);
        }
    }

    #[tokio::test]
    async fn test_products_follow_data_order() {
        let (chain, gateway) = mock_network(3);
        let targets = SetupTargets { data: 5, authorizations: 0, products: 3 };
        let dataset = build(&chain, &gateway, targets, false).await;

        let corpus = &dataset.corpus;
        for (i, product) in corpus.products().iter().enumerate() {
            assert_eq!(product.original_data_id, corpus.data()[i].id);
            assert_eq!(product.creator, corpus.data()[i].owner);
            assert_eq!(product.metadata, format!("Test product {i}"));
        }
    }

    #[tokio::test]
    async fn test_no_data_skips_dependent_phases() {
        let (chain, gateway) = mock_network(2);
        let gateway = gateway.fail_method("registerDataResource");
        let targets = SetupTargets { data: 5, authorizations: 5, products: 5 };
        let dataset = build(&chain, &gateway, targets, false).await;

        assert!(dataset.corpus.is_empty());
        assert!(dataset.report.authorization.skipped);
        assert!(dataset.report.products.skipped);
        assert_eq!(gateway.requests_for("grantProcessingRight"), 0);
        assert_eq!(gateway.requests_for("createDataProduct"), 0);
    }

    #[tokio::test]
    async fn test_missing_receipt_block_falls_back_to_latest() {
        let (chain, gateway) = mock_network(2);
        let gateway = gateway.omit_receipt_block_numbers();
        let targets = SetupTargets { data: 6, authorizations: 3, products: 3 };
        let dataset = build(&chain, &gateway, targets, true).await;

        assert_eq!(dataset.corpus.data().len(), 6);
        assert_eq!(dataset.report.registration.id_mismatches, 0);
        assert_rederivable(&dataset.corpus);
    }

    #[tokio::test]
    async fn test_wrong_context_is_reported_not_masked() {
        let (chain, gateway) = mock_network(2);
        let chain = chain.with_context_skew(3);
        let targets = SetupTargets { data: 4, authorizations: 0, products: 0 };
        let dataset = build(&chain, &gateway, targets, true).await;

        assert_eq!(dataset.report.registration.id_mismatches, 4);
        assert!(dataset.corpus.data().is_empty());
    }

    #[tokio::test]
    async fn test_default_builder_reports_wrong_context() {
        let (chain, gateway) = mock_network(2);
        let chain = chain.with_context_skew(3);
        let accounts = pool(&chain).await;

        let mut builder = DatasetBuilder::new(&chain, &gateway, &accounts, rng_from_seed(Some(5)));
        let registered = builder.register_data(4).await;

        assert_eq!(registered.report.registration.id_mismatches, 4);
        assert_eq!(registered.report.registration.succeeded, 0);
        assert!(registered.corpus.data().is_empty());
    }

    #[tokio::test]
    async fn test_seed_reproduces_inputs() {
        let targets = SetupTargets { data: 5, authorizations: 0, products: 0 };
        let (chain_a, gateway_a) = mock_network(2);
        let (chain_b, gateway_b) = mock_network(2);
        let a = build(&chain_a, &gateway_a, targets, false).await;
        let b = build(&chain_b, &gateway_b, targets, false).await;

        let ids_a: Vec<_> = a.corpus.data().iter().map(|r| r.id).collect();
        let ids_b: Vec<_> = b.corpus.data().iter().map(|r| r.id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
