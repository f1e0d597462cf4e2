//! Alloy-backed [`ChainClient`].

use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use async_trait::async_trait;

use super::{BlockContext, ChainClient, GatewayError, GatewayResult, HttpProvider};

/// Node-level queries over an HTTP provider.
#[derive(Debug, Clone)]
pub struct AlloyChainClient {
    provider: HttpProvider,
}

impl AlloyChainClient {
    /// Wraps an existing provider.
    pub const fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }

    async fn context(&self, tag: BlockNumberOrTag) -> GatewayResult<BlockContext> {
        let block = self
            .provider
            .get_block_by_number(tag)
            .await?
            .ok_or_else(|| GatewayError::Rpc(format!("block not found: {tag}")))?;

        Ok(BlockContext { number: block.header.number, timestamp: block.header.timestamp })
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn is_connected(&self) -> bool {
        match self.provider.get_block_number().await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(error = %err, "Connectivity check failed");
                false
            }
        }
    }

    async fn chain_id(&self) -> GatewayResult<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn list_accounts(&self) -> GatewayResult<Vec<Address>> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn balance(&self, account: Address) -> GatewayResult<U256> {
        Ok(self.provider.get_balance(account).await?)
    }

    async fn latest_context(&self) -> GatewayResult<BlockContext> {
        self.context(BlockNumberOrTag::Latest).await
    }

    async fn context_at(&self, block_number: u64) -> GatewayResult<BlockContext> {
        self.context(BlockNumberOrTag::Number(block_number)).await
    }
}
