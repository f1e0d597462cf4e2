//! RPC operation gateway.
//!
//! [`ChainClient`] covers node-level queries and [`ContractGateway`] gives a
//! uniform `invoke` / `submit` surface over the three contract modules. Every
//! failure is normalised into a [`GatewayError`].

use std::time::Duration;

use alloy_network::Ethereum;
use alloy_provider::RootProvider;
use alloy_rpc_client::RpcClient;
use alloy_transport_http::{Http, reqwest::Client};
use url::Url;

mod chain;
mod contracts;
mod error;
mod traits;
mod types;

pub use chain::AlloyChainClient;
pub use contracts::{
    AlloyGateway, IOwnershipRegistration, IProcessingRightGranting, IProductTrading,
};
pub use error::{GatewayError, GatewayResult};
pub use traits::{ChainClient, ContractGateway};
pub use types::{
    AuthorizationView, BlockContext, CallOutput, ContractAddresses, DataResourceView, Invocation,
    ProductView, Receipt, Submission, TradeView,
};

/// Shared type alias for the HTTP provider.
///
/// No fillers are attached: transactions are sent with `eth_sendTransaction`
/// from node-managed accounts, so the node fills nonce and gas price.
pub type HttpProvider = RootProvider<Ethereum>;

/// Creates an HTTP provider with the given request timeout.
pub fn build_provider(endpoint: Url, timeout: Duration) -> GatewayResult<HttpProvider> {
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Rpc(format!("Failed to build HTTP client: {e}")))?;

    let http = Http::with_client(client, endpoint);
    let rpc_client = RpcClient::new(http, false);

    Ok(RootProvider::new(rpc_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider() {
        let provider = build_provider(
            Url::parse("http://localhost:8545").unwrap(),
            Duration::from_secs(5),
        );
        assert!(provider.is_ok());
    }
}
