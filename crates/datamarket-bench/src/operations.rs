//! Modules and the operation kinds benchmarked against them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three contract modules under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Module {
    /// `OwnershipRegistrationContract`.
    Ownership,
    /// `ProcessingRightGrantingContract`.
    Processing,
    /// `ProductTradingContract`.
    Trading,
}

impl Module {
    /// All modules in dependency order.
    pub const ALL: [Self; 3] = [Self::Ownership, Self::Processing, Self::Trading];

    /// Short label used in result rows.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ownership => "Ownership",
            Self::Processing => "Processing",
            Self::Trading => "Trading",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Kind of entity an operation needs from the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A registered data resource.
    Data,
    /// A granted processing-right authorization.
    Authorization,
    /// A created data product.
    Product,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => f.write_str("data resource"),
            Self::Authorization => f.write_str("authorization"),
            Self::Product => f.write_str("product"),
        }
    }
}

/// A single benchmarked operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// `registerDataResource`.
    OwnershipRegister,
    /// `transferOwnership`.
    OwnershipTransfer,
    /// `verifyOwnership` (read-only).
    OwnershipVerify,
    /// `getDataResource` (read-only).
    OwnershipGetResource,
    /// `grantProcessingRight`.
    ProcessingGrantRight,
    /// `revokeAuthorization`.
    ProcessingRevoke,
    /// `verifyAuthorization` (read-only).
    ProcessingVerify,
    /// `getActiveAuthorizations` (read-only).
    ProcessingGetActive,
    /// `createDataProduct`.
    TradingCreateProduct,
    /// `listProductForSale`.
    TradingListProduct,
    /// `purchaseProduct`, preceded by an untimed listing pass.
    TradingPurchaseProduct,
    /// `getProductTransactionHistory` (read-only).
    TradingGetHistory,
}

impl OperationKind {
    /// Every operation kind, in the order the suite runs them.
    pub const ALL: [Self; 12] = [
        Self::OwnershipRegister,
        Self::OwnershipTransfer,
        Self::OwnershipVerify,
        Self::OwnershipGetResource,
        Self::ProcessingGrantRight,
        Self::ProcessingRevoke,
        Self::ProcessingVerify,
        Self::ProcessingGetActive,
        Self::TradingCreateProduct,
        Self::TradingListProduct,
        Self::TradingPurchaseProduct,
        Self::TradingGetHistory,
    ];

    /// The module this operation targets.
    pub const fn module(&self) -> Module {
        match self {
            Self::OwnershipRegister
            | Self::OwnershipTransfer
            | Self::OwnershipVerify
            | Self::OwnershipGetResource => Module::Ownership,
            Self::ProcessingGrantRight
            | Self::ProcessingRevoke
            | Self::ProcessingVerify
            | Self::ProcessingGetActive => Module::Processing,
            Self::TradingCreateProduct
            | Self::TradingListProduct
            | Self::TradingPurchaseProduct
            | Self::TradingGetHistory => Module::Trading,
        }
    }

    /// Operation label used in result rows.
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::OwnershipRegister => "Register",
            Self::OwnershipTransfer => "Transfer",
            Self::OwnershipVerify | Self::ProcessingVerify => "Verify",
            Self::OwnershipGetResource => "GetResource",
            Self::ProcessingGrantRight => "GrantRight",
            Self::ProcessingRevoke => "Revoke",
            Self::ProcessingGetActive => "GetActive",
            Self::TradingCreateProduct => "CreateProduct",
            Self::TradingListProduct => "ListProduct",
            Self::TradingPurchaseProduct => "PurchaseProduct",
            Self::TradingGetHistory => "GetHistory",
        }
    }

    /// The corpus entries this operation samples from, if any.
    pub const fn requirement(&self) -> Option<EntityKind> {
        match self {
            Self::OwnershipRegister => None,
            Self::OwnershipTransfer
            | Self::OwnershipVerify
            | Self::OwnershipGetResource
            | Self::ProcessingGrantRight
            | Self::ProcessingVerify
            | Self::ProcessingGetActive
            | Self::TradingCreateProduct => Some(EntityKind::Data),
            Self::ProcessingRevoke => Some(EntityKind::Authorization),
            Self::TradingListProduct | Self::TradingPurchaseProduct | Self::TradingGetHistory => {
                Some(EntityKind::Product)
            }
        }
    }

    /// Returns true if the operation is a read-only `eth_call`.
    pub const fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::OwnershipVerify
                | Self::OwnershipGetResource
                | Self::ProcessingVerify
                | Self::ProcessingGetActive
                | Self::TradingGetHistory
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.module(), self.operation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_listed_once() {
        let mut seen = std::collections::HashSet::new();
        for kind in OperationKind::ALL {
            assert!(seen.insert(kind), "{kind} listed twice");
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn test_four_operations_per_module() {
        for module in Module::ALL {
            let count = OperationKind::ALL.iter().filter(|k| k.module() == module).count();
            assert_eq!(count, 4, "{module}");
        }
    }

    #[test]
    fn test_display_matches_row_labels() {
        assert_eq!(OperationKind::OwnershipRegister.to_string(), "Ownership_Register");
        assert_eq!(OperationKind::ProcessingVerify.to_string(), "Processing_Verify");
        assert_eq!(OperationKind::TradingPurchaseProduct.to_string(), "Trading_PurchaseProduct");
    }

    #[test]
    fn test_requirements() {
        assert_eq!(OperationKind::OwnershipRegister.requirement(), None);
        assert_eq!(OperationKind::ProcessingRevoke.requirement(), Some(EntityKind::Authorization));
        assert_eq!(OperationKind::TradingGetHistory.requirement(), Some(EntityKind::Product));
        assert_eq!(OperationKind::TradingCreateProduct.requirement(), Some(EntityKind::Data));
    }

    #[test]
    fn test_read_only_kinds() {
        let reads: Vec<_> = OperationKind::ALL.into_iter().filter(|k| k.is_read_only()).collect();
        assert_eq!(reads.len(), 5);
        assert!(!OperationKind::TradingPurchaseProduct.is_read_only());
    }
}
