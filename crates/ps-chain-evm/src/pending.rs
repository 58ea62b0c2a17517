use anyhow::{Context, Result};
use async_trait::async_trait;
use ps_api_types::{TxHash, TxReceipt};
use ps_chain_client::{PendingTransaction, TxReverted};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::rpc::{ReceiptJson, RpcClient, parse_quantity};

/// A submitted transaction, confirmed by polling `eth_getTransactionReceipt`.
///
/// There is no deadline: a receipt that never appears keeps `wait` pending.
pub struct EvmPendingTransaction {
    rpc: Arc<RpcClient>,
    hash: TxHash,
    poll_interval: Duration,
}

impl EvmPendingTransaction {
    pub(crate) fn new(rpc: Arc<RpcClient>, hash: String, poll_interval: Duration) -> Self {
        Self {
            rpc,
            hash: TxHash(hash),
            poll_interval,
        }
    }
}

#[async_trait]
impl PendingTransaction for EvmPendingTransaction {
    fn hash(&self) -> &TxHash {
        &self.hash
    }

    async fn wait(&self) -> Result<TxReceipt> {
        loop {
            let receipt = self
                .rpc
                .transaction_receipt(&self.hash.0)
                .await
                .with_context(|| format!("receipt for {}", self.hash))?;

            match receipt {
                Some(receipt) => return settle(&self.hash, receipt),
                None => {
                    debug!(tx_hash = %self.hash, "receipt not yet available");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

fn settle(hash: &TxHash, receipt: ReceiptJson) -> Result<TxReceipt> {
    // Pre-byzantium receipts carry no status; treat inclusion as success.
    let succeeded = receipt
        .status
        .as_deref()
        .map(|status| parse_quantity(status).map(|code| code == 1))
        .transpose()?
        .unwrap_or(true);

    if !succeeded {
        warn!(tx_hash = %hash, "transaction reverted");
        return Err(TxReverted {
            tx_hash: hash.clone(),
        }
        .into());
    }

    let block_number = receipt
        .block_number
        .as_deref()
        .map(parse_quantity)
        .transpose()?
        .unwrap_or_default();
    let gas_used = receipt
        .gas_used
        .as_deref()
        .map(parse_quantity)
        .transpose()?
        .unwrap_or_default();

    info!(tx_hash = %hash, block_number, "transaction confirmed");
    Ok(TxReceipt {
        tx_hash: TxHash(receipt.transaction_hash),
        block_number,
        gas_used,
    })
}
