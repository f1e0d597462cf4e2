//! Client traits for the node and the contract modules.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use super::{BlockContext, CallOutput, GatewayResult, Invocation, Receipt, Submission};

/// Node-level queries.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Returns true if the node answers requests.
    async fn is_connected(&self) -> bool;

    /// Returns the chain ID.
    async fn chain_id(&self) -> GatewayResult<u64>;

    /// Returns the node-managed accounts (`eth_accounts`).
    async fn list_accounts(&self) -> GatewayResult<Vec<Address>>;

    /// Returns the balance of an account in wei.
    async fn balance(&self, account: Address) -> GatewayResult<U256>;

    /// Returns the context of the latest block.
    async fn latest_context(&self) -> GatewayResult<BlockContext>;

    /// Returns the context of the given block.
    async fn context_at(&self, block_number: u64) -> GatewayResult<BlockContext>;
}

/// Uniform access to the three contract modules.
///
/// Implementations never retry. Retrying is a caller decision.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Performs a read-only call.
    async fn invoke(&self, invocation: Invocation) -> GatewayResult<CallOutput>;

    /// Sends a transaction from `sender` and waits for a successful receipt.
    async fn submit(
        &self,
        submission: Submission,
        sender: Address,
        gas_limit: u64,
    ) -> GatewayResult<Receipt>;
}
