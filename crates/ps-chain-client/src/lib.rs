//! Typed seams between the sponsor store and the chain: the wallet provider,
//! one client trait per deployed contract, and the factory binding them to a
//! signer.

pub mod units;

use anyhow::Result;
use async_trait::async_trait;
use ps_api_types::{Address, TxHash, TxReceipt};
use std::sync::Arc;

pub use alloy_primitives::U256;

/// Puppy record as the donation contract returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPuppy {
    pub puppy_id: U256,
    pub name: String,
    pub birthday: String,
    pub image_url: String,
    pub description: String,
}

/// Donation event as the donation contract returns it. `time` is epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDonateTransaction {
    pub donor: Address,
    pub receiver: Address,
    pub amount: U256,
    pub time: U256,
    pub puppy_id: U256,
    pub message: String,
    pub keyword: String,
}

/// The chain reported the transaction as included but failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("transaction {tx_hash} reverted")]
pub struct TxReverted {
    pub tx_hash: TxHash,
}

/// The provider has no account to sign a write with.
#[derive(Debug, Clone, thiserror::Error)]
#[error("provider exposes no signer account")]
pub struct NoSignerAccount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRequest {
    /// Accounts the user already authorized; never prompts.
    Authorized,
    /// May prompt the user to pick or unlock an account.
    Interactive,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self, request: AccountRequest) -> Result<Vec<Address>>;
}

/// A submitted state-changing call.
#[async_trait]
pub trait PendingTransaction: Send + Sync {
    fn hash(&self) -> &TxHash;

    /// Resolves once the transaction is confirmed. Fails with [`TxReverted`]
    /// when the chain rejected it.
    async fn wait(&self) -> Result<TxReceipt>;
}

#[async_trait]
pub trait DonationContract: Send + Sync {
    async fn get_all_puppies(&self) -> Result<Vec<RawPuppy>>;
    async fn get_all_donate_transactions(&self) -> Result<Vec<RawDonateTransaction>>;
    async fn owner(&self) -> Result<Address>;

    async fn donate_for_food(
        &self,
        message: &str,
        keyword: &str,
        value: U256,
    ) -> Result<Box<dyn PendingTransaction>>;

    async fn donate_for_puppy(
        &self,
        puppy_id: U256,
        message: &str,
        keyword: &str,
        value: U256,
    ) -> Result<Box<dyn PendingTransaction>>;

    async fn create_new_puppy(
        &self,
        name: &str,
        birthday: &str,
        image_url: &str,
        description: &str,
    ) -> Result<Box<dyn PendingTransaction>>;
}

#[async_trait]
pub trait TokenContract: Send + Sync {
    async fn balance_of(&self, account: &Address) -> Result<U256>;
    async fn symbol(&self) -> Result<String>;
    async fn owner(&self) -> Result<Address>;

    async fn transfer(&self, to: &Address, amount: U256) -> Result<Box<dyn PendingTransaction>>;
    async fn mint(&self, amount: U256) -> Result<Box<dyn PendingTransaction>>;
    async fn burn(&self, account: &Address, amount: U256) -> Result<Box<dyn PendingTransaction>>;
    async fn transfer_ownership(&self, new_owner: &Address) -> Result<Box<dyn PendingTransaction>>;
}

/// Builds contract handles bound to the provider's signer.
///
/// Construction must not touch the network.
pub trait ContractFactory: Send + Sync {
    fn donation_contract(&self, address: &Address) -> Arc<dyn DonationContract>;
    fn token_contract(&self, address: &Address) -> Arc<dyn TokenContract>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAddresses {
    pub donation: Address,
    pub token: Address,
}

/// Both contract handles for one provider session.
#[derive(Clone)]
pub struct SponsorClients {
    pub donation: Arc<dyn DonationContract>,
    pub token: Arc<dyn TokenContract>,
}

impl SponsorClients {
    /// `None` when no wallet provider is available; callers must check.
    pub fn create(
        factory: Option<&dyn ContractFactory>,
        addresses: &ContractAddresses,
    ) -> Option<Self> {
        let factory = factory?;
        Some(Self {
            donation: factory.donation_contract(&addresses.donation),
            token: factory.token_contract(&addresses.token),
        })
    }
}
