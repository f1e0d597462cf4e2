//! Contract bindings and the Alloy-backed [`ContractGateway`].

use alloy_contract::{CallBuilder, CallDecoder};
use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, U256};
use alloy_rpc_types_eth::TransactionReceipt;
use alloy_sol_types::sol;
use async_trait::async_trait;

use super::{
    AuthorizationView, CallOutput, ContractAddresses, ContractGateway, DataResourceView,
    GatewayError, GatewayResult, HttpProvider, Invocation, ProductView, Receipt, Submission,
    TradeView,
};

sol! {
    /// `OwnershipRegistrationContract` interface.
    #[sol(rpc)]
    interface IOwnershipRegistration {
        /// A registered data resource.
        struct DataResource {
            bytes32 dataHash;
            string metadata;
            string watermarkFeatures;
            address owner;
            uint256 registrationTime;
            bytes32 dataId;
            bool isRegistered;
        }

        /// Registers a resource and returns its ID.
        function registerDataResource(
            bytes32 _dataHash,
            string _metadata,
            string _watermarkFeatures
        ) external returns (bytes32);

        /// Moves a resource to a new owner. Only the current owner may call.
        function transferOwnership(bytes32 _dataId, address _newOwner) external;

        /// Returns true if `_checkAddress` owns the resource.
        function verifyOwnership(bytes32 _dataId, address _checkAddress) external view returns (bool);

        /// Returns the resource, or a zero-value struct for an unknown ID.
        function getDataResource(bytes32 _dataId) external view returns (DataResource memory);
    }
}

sol! {
    /// `ProcessingRightGrantingContract` interface.
    #[sol(rpc)]
    interface IProcessingRightGranting {
        /// A processing right granted on a resource.
        struct Authorization {
            bytes32 authId;
            bytes32 dataId;
            address grantor;
            address grantee;
            uint256 grantTime;
            uint256 expirationTime;
            string purpose;
            string scope;
            string constraints;
            bool isValid;
        }

        /// Grants a processing right and returns its ID. Only the data owner may call.
        function grantProcessingRight(
            bytes32 _dataId,
            address _grantee,
            uint256 _duration,
            string _purpose,
            string _scope,
            string _constraints
        ) external returns (bytes32);

        /// Invalidates an authorization.
        function revokeAuthorization(bytes32 _authId) external;

        /// Returns true if `_grantee` holds a valid right on the resource.
        function verifyAuthorization(bytes32 _dataId, address _grantee) external view returns (bool);

        /// Returns the valid authorizations of a resource.
        function getActiveAuthorizations(bytes32 _dataId) external view returns (Authorization[] memory);
    }
}

sol! {
    /// `ProductTradingContract` interface.
    #[sol(rpc)]
    interface IProductTrading {
        /// One completed sale.
        struct Trade {
            bytes32 txId;
            bytes32 productId;
            address seller;
            address buyer;
            uint256 price;
            uint256 transactionTime;
        }

        /// A product derived from a registered resource.
        struct DataProduct {
            bytes32 productId;
            bytes32 originalDataId;
            bytes32[] derivativeChain;
            address creator;
            string productMetadata;
            uint256 creationTime;
            address currentOwner;
            uint256 price;
            bool isListed;
        }

        /// Creates a product derived from a registered resource and returns its ID.
        function createDataProduct(
            bytes32 _originalDataId,
            string _productMetadata,
            bytes32[] _derivativeChain
        ) external returns (bytes32);

        /// Puts a product up for sale. Only the current owner may call.
        function listProductForSale(bytes32 _productId, uint256 _price) external;

        /// Buys a listed product. `msg.value` must cover the price.
        function purchaseProduct(bytes32 _productId) external payable;

        /// Returns the trades of a product.
        function getProductTransactionHistory(bytes32 _productId) external view returns (Trade[] memory);

        /// Returns the products created by or owned by a user.
        function getUserProducts(address _user) external view returns (DataProduct[] memory);
    }
}

impl From<IOwnershipRegistration::DataResource> for DataResourceView {
    fn from(r: IOwnershipRegistration::DataResource) -> Self {
        Self {
            data_hash: r.dataHash,
            metadata: r.metadata,
            watermark_features: r.watermarkFeatures,
            owner: r.owner,
            registration_time: r.registrationTime,
            data_id: r.dataId,
            is_registered: r.isRegistered,
        }
    }
}

impl From<IProcessingRightGranting::Authorization> for AuthorizationView {
    fn from(a: IProcessingRightGranting::Authorization) -> Self {
        Self {
            auth_id: a.authId,
            data_id: a.dataId,
            grantor: a.grantor,
            grantee: a.grantee,
            grant_time: a.grantTime,
            expiration_time: a.expirationTime,
            purpose: a.purpose,
            scope: a.scope,
            constraints: a.constraints,
            is_valid: a.isValid,
        }
    }
}

impl From<IProductTrading::Trade> for TradeView {
    fn from(t: IProductTrading::Trade) -> Self {
        Self {
            tx_id: t.txId,
            product_id: t.productId,
            seller: t.seller,
            buyer: t.buyer,
            price: t.price,
            transaction_time: t.transactionTime,
        }
    }
}

impl From<IProductTrading::DataProduct> for ProductView {
    fn from(p: IProductTrading::DataProduct) -> Self {
        Self {
            product_id: p.productId,
            original_data_id: p.originalDataId,
            derivative_chain: p.derivativeChain,
            creator: p.creator,
            product_metadata: p.productMetadata,
            creation_time: p.creationTime,
            current_owner: p.currentOwner,
            price: p.price,
            is_listed: p.isListed,
        }
    }
}

impl From<&TransactionReceipt> for Receipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        }
    }
}

/// Returns true if the node executed the request and answered with an error.
///
/// A JSON-RPC error response is how nodes report reverts for both `eth_call`
/// and `eth_sendTransaction`. Anything else (no response, empty return data,
/// undecodable output) means the module could not be reached as expected.
fn is_node_rejection(err: &alloy_contract::Error) -> bool {
    match err {
        alloy_contract::Error::TransportError(e) => e.as_error_resp().is_some(),
        _ => false,
    }
}

fn call_error(method: &'static str, err: alloy_contract::Error) -> GatewayError {
    GatewayError::RemoteCall { method, reverted: is_node_rejection(&err), reason: err.to_string() }
}

fn submission_error(method: &'static str, err: alloy_contract::Error) -> GatewayError {
    GatewayError::RemoteSubmission {
        method,
        reverted: is_node_rejection(&err),
        reason: err.to_string(),
    }
}

/// [`ContractGateway`] over the three deployed contracts.
#[allow(missing_debug_implementations)]
pub struct AlloyGateway {
    ownership: IOwnershipRegistration::IOwnershipRegistrationInstance<HttpProvider>,
    processing: IProcessingRightGranting::IProcessingRightGrantingInstance<HttpProvider>,
    trading: IProductTrading::IProductTradingInstance<HttpProvider>,
}

impl AlloyGateway {
    /// Binds the contracts at `addresses` to `provider`.
    pub fn new(provider: HttpProvider, addresses: ContractAddresses) -> Self {
        Self {
            ownership: IOwnershipRegistration::new(addresses.ownership, provider.clone()),
            processing: IProcessingRightGranting::new(addresses.processing, provider.clone()),
            trading: IProductTrading::new(addresses.trading, provider),
        }
    }

    /// Sends a prepared call as a transaction and waits for its receipt.
    async fn confirm<D: CallDecoder>(
        method: &'static str,
        call: CallBuilder<&HttpProvider, D>,
        sender: Address,
        gas_limit: u64,
        value: U256,
    ) -> GatewayResult<Receipt> {
        let pending = call
            .from(sender)
            .gas(gas_limit)
            .value(value)
            .send()
            .await
            .map_err(|e| submission_error(method, e))?;

        let receipt = pending.get_receipt().await.map_err(|e| {
            GatewayError::RemoteSubmission { method, reason: e.to_string(), reverted: false }
        })?;

        if !receipt.status() {
            return Err(GatewayError::RemoteSubmission {
                method,
                reason: format!("transaction {} reverted", receipt.transaction_hash()),
                reverted: true,
            });
        }

        Ok(Receipt::from(&receipt))
    }
}

#[async_trait]
impl ContractGateway for AlloyGateway {
    async fn invoke(&self, invocation: Invocation) -> GatewayResult<CallOutput> {
        let method = invocation.method();
        match invocation {
            Invocation::VerifyOwnership { data_id, account } => self
                .ownership
                .verifyOwnership(data_id, account)
                .call()
                .await
                .map(CallOutput::Bool)
                .map_err(|e| call_error(method, e)),
            Invocation::GetDataResource { data_id } => self
                .ownership
                .getDataResource(data_id)
                .call()
                .await
                .map(|r| CallOutput::DataResource(r.into()))
                .map_err(|e| call_error(method, e)),
            Invocation::VerifyAuthorization { data_id, grantee } => self
                .processing
                .verifyAuthorization(data_id, grantee)
                .call()
                .await
                .map(CallOutput::Bool)
                .map_err(|e| call_error(method, e)),
            Invocation::GetActiveAuthorizations { data_id } => self
                .processing
                .getActiveAuthorizations(data_id)
                .call()
                .await
                .map(|auths| CallOutput::Authorizations(auths.into_iter().map(Into::into).collect()))
                .map_err(|e| call_error(method, e)),
            Invocation::GetProductTransactionHistory { product_id } => self
                .trading
                .getProductTransactionHistory(product_id)
                .call()
                .await
                .map(|trades| CallOutput::Trades(trades.into_iter().map(Into::into).collect()))
                .map_err(|e| call_error(method, e)),
            Invocation::GetUserProducts { user } => self
                .trading
                .getUserProducts(user)
                .call()
                .await
                .map(|products| CallOutput::Products(products.into_iter().map(Into::into).collect()))
                .map_err(|e| call_error(method, e)),
        }
    }

    async fn submit(
        &self,
        submission: Submission,
        sender: Address,
        gas_limit: u64,
    ) -> GatewayResult<Receipt> {
        let method = submission.method();
        let value = submission.value();
        match submission {
            Submission::RegisterDataResource { data_hash, metadata, watermark_features } => {
                let call =
                    self.ownership.registerDataResource(data_hash, metadata, watermark_features);
                Self::confirm(method, call, sender, gas_limit, value).await
            }
            Submission::TransferOwnership { data_id, new_owner } => {
                let call = self.ownership.transferOwnership(data_id, new_owner);
                Self::confirm(method, call, sender, gas_limit, value).await
            }
            Submission::GrantProcessingRight {
                data_id,
                grantee,
                duration_secs,
                purpose,
                scope,
                constraints,
            } => {
                let call = self.processing.grantProcessingRight(
                    data_id,
                    grantee,
                    U256::from(duration_secs),
                    purpose,
                    scope,
                    constraints,
                );
                Self::confirm(method, call, sender, gas_limit, value).await
            }
            Submission::RevokeAuthorization { auth_id } => {
                let call = self.processing.revokeAuthorization(auth_id);
                Self::confirm(method, call, sender, gas_limit, value).await
            }
            Submission::CreateDataProduct { original_data_id, product_metadata, derivative_chain } => {
                let call = self.trading.createDataProduct(
                    original_data_id,
                    product_metadata,
                    derivative_chain,
                );
                Self::confirm(method, call, sender, gas_limit, value).await
            }
            Submission::ListProductForSale { product_id, price } => {
                let call = self.trading.listProductForSale(product_id, price);
                Self::confirm(method, call, sender, gas_limit, value).await
            }
            Submission::PurchaseProduct { product_id, .. } => {
                let call = self.trading.purchaseProduct(product_id);
                Self::confirm(method, call, sender, gas_limit, value).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_sol_types::SolCall;

    use super::*;

    #[test]
    fn test_selectors_match_abi_signatures() {
        assert_eq!(
            IOwnershipRegistration::registerDataResourceCall::SIGNATURE,
            "registerDataResource(bytes32,string,string)"
        );
        assert_eq!(
            IProcessingRightGranting::grantProcessingRightCall::SIGNATURE,
            "grantProcessingRight(bytes32,address,uint256,string,string,string)"
        );
        assert_eq!(
            IProductTrading::createDataProductCall::SIGNATURE,
            "createDataProduct(bytes32,string,bytes32[])"
        );
        assert_eq!(
            IProductTrading::getUserProductsCall::SIGNATURE,
            "getUserProducts(address)"
        );
    }

    #[test]
    fn test_data_resource_conversion() {
        let raw = IOwnershipRegistration::DataResource {
            dataHash: alloy_primitives::B256::repeat_byte(1),
            metadata: "m".into(),
            watermarkFeatures: "w".into(),
            owner: Address::repeat_byte(2),
            registrationTime: U256::from(10),
            dataId: alloy_primitives::B256::repeat_byte(3),
            isRegistered: true,
        };
        let view = DataResourceView::from(raw);
        assert!(view.is_registered);
        assert_eq!(view.owner, Address::repeat_byte(2));
        assert_eq!(view.data_id, alloy_primitives::B256::repeat_byte(3));
    }

    #[test]
    fn test_gateway_binds_addresses() {
        let provider = super::super::build_provider(
            url::Url::parse("http://localhost:8545").unwrap(),
            std::time::Duration::from_secs(1),
        )
        .unwrap();
        let addresses = ContractAddresses {
            ownership: Address::repeat_byte(1),
            processing: Address::repeat_byte(2),
            trading: Address::repeat_byte(3),
        };
        let gateway = AlloyGateway::new(provider, addresses);
        assert_eq!(*gateway.ownership.address(), addresses.ownership);
        assert_eq!(*gateway.processing.address(), addresses.processing);
        assert_eq!(*gateway.trading.address(), addresses.trading);
    }
}
