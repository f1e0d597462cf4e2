//! In-memory chain and contract mocks.
//!
//! [`MockChain`] and [`MockGateway`] share one simulated ledger. Every
//! successful submission mines a block one second after the previous one, and
//! IDs are assigned with the same derivation the real contracts use, so a
//! corpus built against the mocks can be re-derived and verified.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use alloy_primitives::{Address, B256, U256, keccak256};
use async_trait::async_trait;

use crate::{
    derive::{derive_authorization_id, derive_data_id, derive_product_id},
    gateway::{
        AuthorizationView, BlockContext, CallOutput, ChainClient, ContractGateway,
        DataResourceView, GatewayError, GatewayResult, Invocation, ProductView, Receipt,
        Submission, TradeView,
    },
    operations::Module,
};

/// Timestamp of the simulated genesis block.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Chain ID reported by [`MockChain`].
pub const MOCK_CHAIN_ID: u64 = 1337;

/// Balance reported for every mock account (100 ETH).
pub const MOCK_BALANCE_WEI: u128 = 100_000_000_000_000_000_000;

type Shared = Arc<Mutex<MockLedger>>;

#[derive(Debug)]
struct MockLedger {
    blocks: Vec<u64>,
    resources: HashMap<B256, DataResourceView>,
    authorizations: Vec<AuthorizationView>,
    products: HashMap<B256, ProductView>,
    product_order: Vec<B256>,
    trades: HashMap<B256, Vec<TradeView>>,

    submissions: u64,
    invocations: u64,
    per_method: HashMap<&'static str, u64>,

    fail_every: Option<u64>,
    failing_methods: HashSet<&'static str>,
    unreachable: HashSet<Module>,
    transient_call_failures: u32,
    omit_block_numbers: bool,
    access_control: bool,
    context_skew: u64,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self {
            blocks: vec![GENESIS_TIMESTAMP],
            resources: HashMap::new(),
            authorizations: Vec::new(),
            products: HashMap::new(),
            product_order: Vec::new(),
            trades: HashMap::new(),
            submissions: 0,
            invocations: 0,
            per_method: HashMap::new(),
            fail_every: None,
            failing_methods: HashSet::new(),
            unreachable: HashSet::new(),
            transient_call_failures: 0,
            omit_block_numbers: false,
            access_control: true,
            context_skew: 0,
        }
    }
}

fn revert(method: &'static str, reason: &str) -> GatewayError {
    GatewayError::RemoteSubmission { method, reason: reason.to_string(), reverted: true }
}

impl MockLedger {
    fn next_context(&self) -> BlockContext {
        let number = self.blocks.len() as u64;
        let timestamp = self.blocks.last().copied().unwrap_or(GENESIS_TIMESTAMP) + 1;
        BlockContext { number, timestamp }
    }

    fn context(&self, number: u64) -> GatewayResult<BlockContext> {
        let timestamp = self
            .blocks
            .get(number as usize)
            .ok_or_else(|| GatewayError::Rpc(format!("block not found: {number}")))?;
        Ok(BlockContext { number, timestamp: timestamp + self.context_skew })
    }

    fn is_authorized(&self, data_id: B256, account: Address) -> bool {
        self.authorizations.iter().any(|a| a.data_id == data_id && a.grantee == account && a.is_valid)
    }

    fn execute(
        &mut self,
        submission: Submission,
        sender: Address,
        ctx: BlockContext,
    ) -> GatewayResult<()> {
        let method = submission.method();
        let checked = self.access_control;
        let now = U256::from(ctx.timestamp);

        match submission {
            Submission::RegisterDataResource { data_hash, metadata, watermark_features } => {
                if self.resources.values().any(|r| r.data_hash == data_hash) {
                    return Err(revert(method, "data already registered"));
                }
                let data_id = derive_data_id(data_hash, &metadata, &ctx, sender);
                self.resources.insert(
                    data_id,
                    DataResourceView {
                        data_hash,
                        metadata,
                        watermark_features,
                        owner: sender,
                        registration_time: now,
                        data_id,
                        is_registered: true,
                    },
                );
            }
            Submission::TransferOwnership { data_id, new_owner } => {
                let resource = self
                    .resources
                    .get_mut(&data_id)
                    .ok_or_else(|| revert(method, "data not registered"))?;
                if checked && resource.owner != sender {
                    return Err(revert(method, "caller is not the owner"));
                }
                if new_owner == Address::ZERO {
                    return Err(revert(method, "invalid new owner"));
                }
                resource.owner = new_owner;
            }
            Submission::GrantProcessingRight {
                data_id,
                grantee,
                duration_secs,
                purpose,
                scope,
                constraints,
            } => {
                let resource =
                    self.resources.get(&data_id).ok_or_else(|| revert(method, "data not registered"))?;
                if checked && resource.owner != sender {
                    return Err(revert(method, "caller is not the owner"));
                }
                let auth_id = derive_authorization_id(data_id, grantee, &ctx, sender);
                self.authorizations.push(AuthorizationView {
                    auth_id,
                    data_id,
                    grantor: sender,
                    grantee,
                    grant_time: now,
                    expiration_time: now + U256::from(duration_secs),
                    purpose,
                    scope,
                    constraints,
                    is_valid: true,
                });
            }
            Submission::RevokeAuthorization { auth_id } => {
                let auth = self
                    .authorizations
                    .iter_mut()
                    .find(|a| a.auth_id == auth_id)
                    .ok_or_else(|| revert(method, "authorization not found"))?;
                if !auth.is_valid {
                    return Err(revert(method, "authorization already revoked"));
                }
                if checked && auth.grantor != sender {
                    return Err(revert(method, "caller is not the grantor"));
                }
                auth.is_valid = false;
            }
            Submission::CreateDataProduct { original_data_id, product_metadata, derivative_chain } => {
                let resource = self
                    .resources
                    .get(&original_data_id)
                    .ok_or_else(|| revert(method, "data not registered"))?;
                if checked
                    && resource.owner != sender
                    && !self.is_authorized(original_data_id, sender)
                {
                    return Err(revert(method, "no processing right"));
                }
                let product_id =
                    derive_product_id(original_data_id, &product_metadata, &ctx, sender);
                self.product_order.push(product_id);
                self.products.insert(
                    product_id,
                    ProductView {
                        product_id,
                        original_data_id,
                        derivative_chain,
                        creator: sender,
                        product_metadata,
                        creation_time: now,
                        current_owner: sender,
                        price: U256::ZERO,
                        is_listed: false,
                    },
                );
            }
            Submission::ListProductForSale { product_id, price } => {
                let product = self
                    .products
                    .get_mut(&product_id)
                    .ok_or_else(|| revert(method, "product not found"))?;
                if checked && product.current_owner != sender {
                    return Err(revert(method, "caller is not the owner"));
                }
                if price.is_zero() {
                    return Err(revert(method, "price must be positive"));
                }
                product.price = price;
                product.is_listed = true;
            }
            Submission::PurchaseProduct { product_id, value } => {
                let product = self
                    .products
                    .get_mut(&product_id)
                    .ok_or_else(|| revert(method, "product not found"))?;
                if !product.is_listed {
                    return Err(revert(method, "product not for sale"));
                }
                if value < product.price {
                    return Err(revert(method, "insufficient payment"));
                }
                let seller = product.current_owner;
                product.current_owner = sender;
                product.is_listed = false;
                let price = product.price;
                let trades = self.trades.entry(product_id).or_default();
                let tx_id = keccak256([product_id.as_slice(), sender.as_slice()].concat());
                trades.push(TradeView {
                    tx_id,
                    product_id,
                    seller,
                    buyer: sender,
                    price,
                    transaction_time: now,
                });
            }
        }
        Ok(())
    }

    fn call(&self, invocation: Invocation) -> CallOutput {
        match invocation {
            Invocation::VerifyOwnership { data_id, account } => CallOutput::Bool(
                self.resources.get(&data_id).is_some_and(|r| r.is_registered && r.owner == account),
            ),
            Invocation::GetDataResource { data_id } => CallOutput::DataResource(
                self.resources.get(&data_id).cloned().unwrap_or_else(|| DataResourceView {
                    data_hash: B256::ZERO,
                    metadata: String::new(),
                    watermark_features: String::new(),
                    owner: Address::ZERO,
                    registration_time: U256::ZERO,
                    data_id: B256::ZERO,
                    is_registered: false,
                }),
            ),
            Invocation::VerifyAuthorization { data_id, grantee } => {
                CallOutput::Bool(self.is_authorized(data_id, grantee))
            }
            Invocation::GetActiveAuthorizations { data_id } => CallOutput::Authorizations(
                self.authorizations
                    .iter()
                    .filter(|a| a.data_id == data_id && a.is_valid)
                    .cloned()
                    .collect(),
            ),
            Invocation::GetProductTransactionHistory { product_id } => {
                CallOutput::Trades(self.trades.get(&product_id).cloned().unwrap_or_default())
            }
            Invocation::GetUserProducts { user } => CallOutput::Products(
                self.product_order
                    .iter()
                    .filter_map(|id| self.products.get(id))
                    .filter(|p| p.creator == user || p.current_owner == user)
                    .cloned()
                    .collect(),
            ),
        }
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, MockLedger> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates a mock chain with `accounts` funded accounts and a gateway bound to it.
pub fn mock_network(accounts: usize) -> (MockChain, MockGateway) {
    let state = Shared::default();
    let accounts = (1..=accounts as u64)
        .map(|i| Address::from_word(B256::from(U256::from(i))))
        .collect();
    (
        MockChain { state: Arc::clone(&state), accounts, connected: true },
        MockGateway { state },
    )
}

/// Mock [`ChainClient`] over the shared ledger.
#[derive(Debug, Clone)]
pub struct MockChain {
    state: Shared,
    accounts: Vec<Address>,
    connected: bool,
}

impl MockChain {
    /// Makes the node unreachable.
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// Shifts every reported block timestamp by `secs`.
    pub fn with_context_skew(self, secs: u64) -> Self {
        lock(&self.state).context_skew = secs;
        self
    }

    /// Number of mined blocks, genesis included.
    pub fn block_count(&self) -> usize {
        lock(&self.state).blocks.len()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn is_connected(&self) -> bool {
        self.connected
    }

    async fn chain_id(&self) -> GatewayResult<u64> {
        Ok(MOCK_CHAIN_ID)
    }

    async fn list_accounts(&self) -> GatewayResult<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn balance(&self, _account: Address) -> GatewayResult<U256> {
        Ok(U256::from(MOCK_BALANCE_WEI))
    }

    async fn latest_context(&self) -> GatewayResult<BlockContext> {
        let state = lock(&self.state);
        state.context(state.blocks.len() as u64 - 1)
    }

    async fn context_at(&self, block_number: u64) -> GatewayResult<BlockContext> {
        lock(&self.state).context(block_number)
    }
}

/// Mock [`ContractGateway`] simulating the three contracts.
#[derive(Debug, Clone)]
pub struct MockGateway {
    state: Shared,
}

impl MockGateway {
    /// Rejects every `n`-th submission (counted across all methods) with a revert.
    pub fn fail_every_nth_submission(self, n: u64) -> Self {
        lock(&self.state).fail_every = Some(n);
        self
    }

    /// Rejects every submission of `method` with a revert.
    pub fn fail_method(self, method: &'static str) -> Self {
        lock(&self.state).failing_methods.insert(method);
        self
    }

    /// Makes every call and submission to `module` fail without a node answer.
    pub fn unreachable_module(self, module: Module) -> Self {
        lock(&self.state).unreachable.insert(module);
        self
    }

    /// Makes the next `count` calls fail with a transport error.
    pub fn fail_next_calls(self, count: u32) -> Self {
        lock(&self.state).transient_call_failures = count;
        self
    }

    /// Returns receipts without a block number.
    pub fn omit_receipt_block_numbers(self) -> Self {
        lock(&self.state).omit_block_numbers = true;
        self
    }

    /// Lets any sender transfer, grant, revoke, create and list.
    pub fn without_access_control(self) -> Self {
        lock(&self.state).access_control = false;
        self
    }

    /// Total submissions received, failed ones included.
    pub fn submission_count(&self) -> u64 {
        lock(&self.state).submissions
    }

    /// Total calls received, failed ones included.
    pub fn invocation_count(&self) -> u64 {
        lock(&self.state).invocations
    }

    /// Submissions and calls received for `method`.
    pub fn requests_for(&self, method: &str) -> u64 {
        lock(&self.state).per_method.get(method).copied().unwrap_or_default()
    }

    /// Products currently listed for sale.
    pub fn listed_products(&self) -> usize {
        lock(&self.state).products.values().filter(|p| p.is_listed).count()
    }

    /// Current owner of a registered resource.
    pub fn owner_of(&self, data_id: B256) -> Option<Address> {
        lock(&self.state).resources.get(&data_id).map(|r| r.owner)
    }
}

#[async_trait]
impl ContractGateway for MockGateway {
    async fn invoke(&self, invocation: Invocation) -> GatewayResult<CallOutput> {
        let mut state = lock(&self.state);
        let method = invocation.method();
        state.invocations += 1;
        *state.per_method.entry(method).or_default() += 1;

        if state.unreachable.contains(&invocation.module()) {
            return Err(GatewayError::RemoteCall {
                method,
                reason: "connection refused".into(),
                reverted: false,
            });
        }
        if state.transient_call_failures > 0 {
            state.transient_call_failures -= 1;
            return Err(GatewayError::RemoteCall {
                method,
                reason: "request timed out".into(),
                reverted: false,
            });
        }

        Ok(state.call(invocation))
    }

    async fn submit(
        &self,
        submission: Submission,
        sender: Address,
        gas_limit: u64,
    ) -> GatewayResult<Receipt> {
        let mut state = lock(&self.state);
        let method = submission.method();
        state.submissions += 1;
        *state.per_method.entry(method).or_default() += 1;

        if state.unreachable.contains(&submission.module()) {
            return Err(GatewayError::RemoteSubmission {
                method,
                reason: "connection refused".into(),
                reverted: false,
            });
        }
        if state.fail_every.is_some_and(|n| n > 0 && state.submissions % n == 0) {
            return Err(revert(method, "injected failure"));
        }
        if state.failing_methods.contains(method) {
            return Err(revert(method, "injected failure"));
        }

        let ctx = state.next_context();
        state.execute(submission, sender, ctx)?;
        state.blocks.push(ctx.timestamp);

        Ok(Receipt {
            tx_hash: keccak256(ctx.number.to_be_bytes()),
            block_number: (!state.omit_block_numbers).then_some(ctx.number),
            gas_used: gas_limit / 2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_assigns_derived_id() {
        let (chain, gateway) = mock_network(2);
        let owner = chain.list_accounts().await.unwrap()[0];
        let receipt = gateway
            .submit(
                Submission::RegisterDataResource {
                    data_hash: B256::repeat_byte(1),
                    metadata: "meta".into(),
                    watermark_features: "wm".into(),
                },
                owner,
                300_000,
            )
            .await
            .unwrap();

        let ctx = chain.context_at(receipt.block_number.unwrap()).await.unwrap();
        let id = derive_data_id(B256::repeat_byte(1), "meta", &ctx, owner);
        assert_eq!(gateway.owner_of(id), Some(owner));
        assert_eq!(chain.block_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_submission_mines_nothing() {
        let (chain, gateway) = mock_network(1);
        let gateway = gateway.fail_every_nth_submission(1);
        let err = gateway
            .submit(
                Submission::RevokeAuthorization { auth_id: B256::ZERO },
                Address::ZERO,
                200_000,
            )
            .await
            .unwrap_err();
        assert!(err.is_revert());
        assert_eq!(chain.block_count(), 1);
        assert_eq!(gateway.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_resource_reads_as_unregistered() {
        let (_, gateway) = mock_network(1);
        let output =
            gateway.invoke(Invocation::GetDataResource { data_id: B256::ZERO }).await.unwrap();
        assert!(matches!(output, CallOutput::DataResource(r) if !r.is_registered));
    }

    #[tokio::test]
    async fn test_unreachable_module_is_not_a_revert() {
        let (_, gateway) = mock_network(1);
        let gateway = gateway.unreachable_module(Module::Trading);
        let err = gateway
            .invoke(Invocation::GetProductTransactionHistory { product_id: B256::ZERO })
            .await
            .unwrap_err();
        assert!(!err.is_revert());
        assert!(gateway.invoke(Invocation::GetDataResource { data_id: B256::ZERO }).await.is_ok());
    }
}
