//! Ethereum JSON-RPC adapter for the sponsor and token contracts.
//!
//! The node (or an injected wallet bridged over HTTP) holds the keys and signs
//! `eth_sendTransaction`; this crate only encodes calls and polls receipts.

pub mod abi;
pub mod config;
mod contracts;
mod pending;
mod rpc;

use anyhow::Result;
use async_trait::async_trait;
use ps_api_types::Address;
use ps_chain_client::{
    AccountRequest, ContractFactory, DonationContract, TokenContract, WalletProvider,
};
use std::sync::Arc;
use std::time::Duration;

pub use config::EvmConfig;
pub use contracts::{EvmDonationContract, EvmTokenContract};
pub use pending::EvmPendingTransaction;
pub use rpc::RpcClient;

/// Wallet provider and contract factory backed by one JSON-RPC endpoint.
pub struct EvmWallet {
    rpc: Arc<RpcClient>,
    receipt_poll_interval: Duration,
}

impl EvmWallet {
    pub fn new(config: &EvmConfig) -> Self {
        Self {
            rpc: Arc::new(RpcClient::new(&config.rpc_url)),
            receipt_poll_interval: config.receipt_poll_interval,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.rpc.endpoint()
    }
}

#[async_trait]
impl WalletProvider for EvmWallet {
    async fn request_accounts(&self, request: AccountRequest) -> Result<Vec<Address>> {
        let accounts = match request {
            AccountRequest::Authorized => self.rpc.accounts().await?,
            AccountRequest::Interactive => self.rpc.request_accounts().await?,
        };
        Ok(accounts.into_iter().map(Address::new).collect())
    }
}

impl ContractFactory for EvmWallet {
    fn donation_contract(&self, address: &Address) -> Arc<dyn DonationContract> {
        Arc::new(EvmDonationContract::new(
            self.rpc.clone(),
            address,
            self.receipt_poll_interval,
        ))
    }

    fn token_contract(&self, address: &Address) -> Arc<dyn TokenContract> {
        Arc::new(EvmTokenContract::new(
            self.rpc.clone(),
            address,
            self.receipt_poll_interval,
        ))
    }
}
