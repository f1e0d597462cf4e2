//! Request and response types exchanged with the contract modules.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{constants, operations::Module};

/// Block number and timestamp of a block.
///
/// The timestamp is the `block.timestamp` the contracts hash into every ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block number.
    pub number: u64,
    /// Block timestamp in seconds.
    pub timestamp: u64,
}

/// The parts of a transaction receipt the harness uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Block the transaction was included in, when the node reports it.
    pub block_number: Option<u64>,
    /// Gas consumed.
    pub gas_used: u64,
}

/// Deployed addresses of the three contract modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// `OwnershipRegistrationContract`.
    pub ownership: Address,
    /// `ProcessingRightGrantingContract`.
    pub processing: Address,
    /// `ProductTradingContract`.
    pub trading: Address,
}

impl ContractAddresses {
    /// Returns the address of the given module.
    pub const fn of(&self, module: Module) -> Address {
        match module {
            Module::Ownership => self.ownership,
            Module::Processing => self.processing,
            Module::Trading => self.trading,
        }
    }
}

/// A read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `verifyOwnership(bytes32,address)`.
    VerifyOwnership {
        /// Data resource ID.
        data_id: B256,
        /// Account checked for ownership.
        account: Address,
    },
    /// `getDataResource(bytes32)`.
    GetDataResource {
        /// Data resource ID.
        data_id: B256,
    },
    /// `verifyAuthorization(bytes32,address)`.
    VerifyAuthorization {
        /// Data resource ID.
        data_id: B256,
        /// Account checked for a valid grant.
        grantee: Address,
    },
    /// `getActiveAuthorizations(bytes32)`.
    GetActiveAuthorizations {
        /// Data resource ID.
        data_id: B256,
    },
    /// `getProductTransactionHistory(bytes32)`.
    GetProductTransactionHistory {
        /// Product ID.
        product_id: B256,
    },
    /// `getUserProducts(address)`.
    GetUserProducts {
        /// Product creator or owner.
        user: Address,
    },
}

impl Invocation {
    /// The module that serves this call.
    pub const fn module(&self) -> Module {
        match self {
            Self::VerifyOwnership { .. } | Self::GetDataResource { .. } => Module::Ownership,
            Self::VerifyAuthorization { .. } | Self::GetActiveAuthorizations { .. } => {
                Module::Processing
            }
            Self::GetProductTransactionHistory { .. } | Self::GetUserProducts { .. } => {
                Module::Trading
            }
        }
    }

    /// Contract method name.
    pub const fn method(&self) -> &'static str {
        match self {
            Self::VerifyOwnership { .. } => "verifyOwnership",
            Self::GetDataResource { .. } => "getDataResource",
            Self::VerifyAuthorization { .. } => "verifyAuthorization",
            Self::GetActiveAuthorizations { .. } => "getActiveAuthorizations",
            Self::GetProductTransactionHistory { .. } => "getProductTransactionHistory",
            Self::GetUserProducts { .. } => "getUserProducts",
        }
    }
}

/// A state-changing contract transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// `registerDataResource(bytes32,string,string)`.
    RegisterDataResource {
        /// Content hash of the data.
        data_hash: B256,
        /// Free-form metadata.
        metadata: String,
        /// Watermark feature string.
        watermark_features: String,
    },
    /// `transferOwnership(bytes32,address)`.
    TransferOwnership {
        /// Data resource ID.
        data_id: B256,
        /// New owner.
        new_owner: Address,
    },
    /// `grantProcessingRight(bytes32,address,uint256,string,string,string)`.
    GrantProcessingRight {
        /// Data resource ID.
        data_id: B256,
        /// Account receiving the right.
        grantee: Address,
        /// Validity in seconds.
        duration_secs: u64,
        /// Declared purpose.
        purpose: String,
        /// Declared scope.
        scope: String,
        /// Declared constraints.
        constraints: String,
    },
    /// `revokeAuthorization(bytes32)`.
    RevokeAuthorization {
        /// Authorization ID.
        auth_id: B256,
    },
    /// `createDataProduct(bytes32,string,bytes32[])`.
    CreateDataProduct {
        /// Source data resource ID.
        original_data_id: B256,
        /// Product metadata.
        product_metadata: String,
        /// Derivation chain of earlier products.
        derivative_chain: Vec<B256>,
    },
    /// `listProductForSale(bytes32,uint256)`.
    ListProductForSale {
        /// Product ID.
        product_id: B256,
        /// Asking price in wei.
        price: U256,
    },
    /// `purchaseProduct(bytes32)`, payable.
    PurchaseProduct {
        /// Product ID.
        product_id: B256,
        /// Wei sent with the transaction.
        value: U256,
    },
}

impl Submission {
    /// The module that executes this transaction.
    pub const fn module(&self) -> Module {
        match self {
            Self::RegisterDataResource { .. } | Self::TransferOwnership { .. } => {
                Module::Ownership
            }
            Self::GrantProcessingRight { .. } | Self::RevokeAuthorization { .. } => {
                Module::Processing
            }
            Self::CreateDataProduct { .. }
            | Self::ListProductForSale { .. }
            | Self::PurchaseProduct { .. } => Module::Trading,
        }
    }

    /// Contract method name.
    pub const fn method(&self) -> &'static str {
        match self {
            Self::RegisterDataResource { .. } => "registerDataResource",
            Self::TransferOwnership { .. } => "transferOwnership",
            Self::GrantProcessingRight { .. } => "grantProcessingRight",
            Self::RevokeAuthorization { .. } => "revokeAuthorization",
            Self::CreateDataProduct { .. } => "createDataProduct",
            Self::ListProductForSale { .. } => "listProductForSale",
            Self::PurchaseProduct { .. } => "purchaseProduct",
        }
    }

    /// Gas budget the harness sends this transaction with.
    pub const fn gas_budget(&self) -> u64 {
        match self {
            Self::RegisterDataResource { .. } => constants::REGISTER_GAS,
            Self::TransferOwnership { .. } => constants::TRANSFER_GAS,
            Self::GrantProcessingRight { .. } => constants::GRANT_GAS,
            Self::RevokeAuthorization { .. } => constants::REVOKE_GAS,
            Self::CreateDataProduct { .. } => constants::CREATE_PRODUCT_GAS,
            Self::ListProductForSale { .. } => constants::LIST_PRODUCT_GAS,
            Self::PurchaseProduct { .. } => constants::PURCHASE_GAS,
        }
    }

    /// Wei attached to the transaction.
    pub const fn value(&self) -> U256 {
        match self {
            Self::PurchaseProduct { value, .. } => *value,
            _ => U256::ZERO,
        }
    }
}

/// `DataResource` as returned by `getDataResource`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataResourceView {
    /// Content hash.
    pub data_hash: B256,
    /// Metadata.
    pub metadata: String,
    /// Watermark features.
    pub watermark_features: String,
    /// Current owner.
    pub owner: Address,
    /// Registration timestamp.
    pub registration_time: U256,
    /// Resource ID.
    pub data_id: B256,
    /// False for the zero-value struct of an unknown ID.
    pub is_registered: bool,
}

/// `Authorization` as returned by `getActiveAuthorizations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationView {
    /// Authorization ID.
    pub auth_id: B256,
    /// Data resource ID.
    pub data_id: B256,
    /// Granting owner.
    pub grantor: Address,
    /// Receiving account.
    pub grantee: Address,
    /// Grant timestamp.
    pub grant_time: U256,
    /// Expiry timestamp.
    pub expiration_time: U256,
    /// Declared purpose.
    pub purpose: String,
    /// Declared scope.
    pub scope: String,
    /// Declared constraints.
    pub constraints: String,
    /// False once revoked.
    pub is_valid: bool,
}

/// One entry of `getProductTransactionHistory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeView {
    /// Trade ID.
    pub tx_id: B256,
    /// Product ID.
    pub product_id: B256,
    /// Seller.
    pub seller: Address,
    /// Buyer.
    pub buyer: Address,
    /// Price paid in wei.
    pub price: U256,
    /// Trade timestamp.
    pub transaction_time: U256,
}

/// `DataProduct` as returned by `getUserProducts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductView {
    /// Product ID.
    pub product_id: B256,
    /// Source data resource ID.
    pub original_data_id: B256,
    /// Derivation chain.
    pub derivative_chain: Vec<B256>,
    /// Creator.
    pub creator: Address,
    /// Product metadata.
    pub product_metadata: String,
    /// Creation timestamp.
    pub creation_time: U256,
    /// Current owner.
    pub current_owner: Address,
    /// Listing price in wei.
    pub price: U256,
    /// Whether the product is for sale.
    pub is_listed: bool,
}

/// Decoded result of an [`Invocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutput {
    /// `verifyOwnership` / `verifyAuthorization`.
    Bool(bool),
    /// `getDataResource`.
    DataResource(DataResourceView),
    /// `getActiveAuthorizations`.
    Authorizations(Vec<AuthorizationView>),
    /// `getProductTransactionHistory`.
    Trades(Vec<TradeView>),
    /// `getUserProducts`.
    Products(Vec<ProductView>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_addresses_of() {
        let addresses = ContractAddresses {
            ownership: Address::repeat_byte(1),
            processing: Address::repeat_byte(2),
            trading: Address::repeat_byte(3),
        };
        assert_eq!(addresses.of(Module::Ownership), Address::repeat_byte(1));
        assert_eq!(addresses.of(Module::Processing), Address::repeat_byte(2));
        assert_eq!(addresses.of(Module::Trading), Address::repeat_byte(3));
    }

    #[test]
    fn test_submission_routing() {
        let purchase = Submission::PurchaseProduct { product_id: B256::ZERO, value: U256::from(5) };
        assert_eq!(purchase.module(), Module::Trading);
        assert_eq!(purchase.method(), "purchaseProduct");
        assert_eq!(purchase.value(), U256::from(5));
        assert_eq!(purchase.gas_budget(), constants::PURCHASE_GAS);

        let revoke = Submission::RevokeAuthorization { auth_id: B256::ZERO };
        assert_eq!(revoke.module(), Module::Processing);
        assert_eq!(revoke.value(), U256::ZERO);
    }

    #[test]
    fn test_invocation_routing() {
        let call = Invocation::GetUserProducts { user: Address::ZERO };
        assert_eq!(call.module(), Module::Trading);
        assert_eq!(call.method(), "getUserProducts");
        assert_eq!(
            Invocation::GetActiveAuthorizations { data_id: B256::ZERO }.module(),
            Module::Processing
        );
    }
}
