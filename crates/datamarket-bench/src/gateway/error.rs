//! Gateway error types.

use alloy_transport::TransportError;
use thiserror::Error;

/// Failure of a single gateway operation.
///
/// Every RPC, ABI and receipt failure is normalised into one of these
/// variants. `reverted` separates "the node answered and rejected the call"
/// from "the call never produced an answer", which is what canary reads use
/// to tell a benign miss from an unreachable module.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// A read-only call failed.
    #[error("call {method} failed: {reason}")]
    RemoteCall {
        /// Contract method name.
        method: &'static str,
        /// Failure description.
        reason: String,
        /// The node executed the call and reverted it.
        reverted: bool,
    },

    /// A state-changing submission failed to send, confirm, or succeed.
    #[error("submission {method} failed: {reason}")]
    RemoteSubmission {
        /// Contract method name.
        method: &'static str,
        /// Failure description.
        reason: String,
        /// The transaction was rejected or mined with a failed status.
        reverted: bool,
    },

    /// A node-level query (accounts, balances, blocks) failed.
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl GatewayError {
    /// Returns true if the remote side executed the operation and reverted it.
    pub const fn is_revert(&self) -> bool {
        match self {
            Self::RemoteCall { reverted, .. } | Self::RemoteSubmission { reverted, .. } => {
                *reverted
            }
            Self::Rpc(_) => false,
        }
    }

    /// Returns the contract method involved, if any.
    pub const fn method(&self) -> Option<&'static str> {
        match self {
            Self::RemoteCall { method, .. } | Self::RemoteSubmission { method, .. } => {
                Some(method)
            }
            Self::Rpc(_) => None,
        }
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        Self::Rpc(err.to_string())
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_classification() {
        let revert = GatewayError::RemoteCall {
            method: "getDataResource",
            reason: "execution reverted".into(),
            reverted: true,
        };
        assert!(revert.is_revert());
        assert_eq!(revert.method(), Some("getDataResource"));

        let transport = GatewayError::RemoteSubmission {
            method: "purchaseProduct",
            reason: "connection refused".into(),
            reverted: false,
        };
        assert!(!transport.is_revert());

        assert!(!GatewayError::Rpc("timeout".into()).is_revert());
        assert_eq!(GatewayError::Rpc("timeout".into()).method(), None);
    }

    #[test]
    fn test_display() {
        let err = GatewayError::RemoteSubmission {
            method: "registerDataResource",
            reason: "out of gas".into(),
            reverted: true,
        };
        assert_eq!(err.to_string(), "submission registerDataResource failed: out of gas");
    }
}
