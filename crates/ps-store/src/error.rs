use ps_api_types::{OperationKind, TxHash};
use ps_chain_client::{NoSignerAccount, TxReverted};
use thiserror::Error;

/// Outcome of a store operation that did not produce a receipt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OpError {
    #[error("{0} is already in flight")]
    Busy(OperationKind),
    #[error("no wallet provider available")]
    NoProvider,
    #[error("no wallet account connected")]
    NoAccount,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("chain query failed: {0}")]
    Query(String),
}

impl OpError {
    /// Maps an adapter failure from submit or confirmation.
    pub(crate) fn from_chain(err: anyhow::Error) -> Self {
        if let Some(reverted) = err.downcast_ref::<TxReverted>() {
            return OpError::Reverted(reverted.tx_hash.clone());
        }
        if err.downcast_ref::<NoSignerAccount>().is_some() {
            return OpError::NoAccount;
        }
        OpError::Rejected(format!("{err:#}"))
    }
}
