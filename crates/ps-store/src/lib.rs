//! Session store for the Puppy Sponsor client.
//!
//! `SponsorStore` is the single owner of session state: the connected account,
//! the donation form, and every chain-derived list. Readers get clones;
//! mutating operations go through the orchestrator methods, which guard per
//! operation kind, await confirmation, then refresh all chain data.

mod error;
mod fetch;
mod notice;
mod orchestrator;
mod pending;
mod state;
pub mod validate;
mod wallet;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use anyhow::Result;
use ps_api_types::{
    Address, DonationFormData, DonationTransaction, FormField, Notice, OperationKind,
    PendingOperation, Puppy, TokenState, TxPhase,
};
use ps_chain_client::units::parse_amount;
use ps_chain_client::{ContractAddresses, ContractFactory, SponsorClients, U256, WalletProvider};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

pub use error::OpError;
pub use fetch::{format_time, format_time_in};
pub use notice::{Notifier, TracingNotifier};
pub use pending::{PendingGuard, PendingSet};
pub use state::ChainSnapshot;

pub const DEFAULT_MIN_DONATION: &str = "0.0001";

#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Smallest accepted donation, in wei.
    pub min_donation: U256,
}

impl StoreSettings {
    pub fn with_min_donation(decimal: &str) -> Result<Self> {
        Ok(Self {
            min_donation: parse_amount(decimal)?,
        })
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            min_donation: U256::from(100_000_000_000_000_u128),
        }
    }
}

pub struct SponsorStore {
    provider: Option<Arc<dyn WalletProvider>>,
    clients: Option<SponsorClients>,
    notifier: Arc<dyn Notifier>,
    settings: StoreSettings,
    snapshot: RwLock<ChainSnapshot>,
    pending: PendingSet,
    /// Bumped on every disconnect.
    session: AtomicU64,
}

impl SponsorStore {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        clients: Option<SponsorClients>,
        notifier: Arc<dyn Notifier>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            provider,
            clients,
            notifier,
            settings,
            snapshot: RwLock::new(ChainSnapshot::default()),
            pending: PendingSet::default(),
            session: AtomicU64::new(0),
        }
    }

    /// Binds both contracts through `wallet`'s signer.
    pub fn with_wallet<W>(
        wallet: Arc<W>,
        addresses: &ContractAddresses,
        notifier: Arc<dyn Notifier>,
        settings: StoreSettings,
    ) -> Self
    where
        W: WalletProvider + ContractFactory + 'static,
    {
        let clients = SponsorClients::create(Some(wallet.as_ref() as &dyn ContractFactory), addresses);
        let provider: Arc<dyn WalletProvider> = wallet;
        Self::new(Some(provider), clients, notifier, settings)
    }

    /// A session in an environment with no wallet at all.
    pub fn without_wallet(notifier: Arc<dyn Notifier>, settings: StoreSettings) -> Self {
        Self::new(None, None, notifier, settings)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn snapshot(&self) -> ChainSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn account(&self) -> Address {
        self.snapshot.read().await.account.clone()
    }

    pub async fn form(&self) -> DonationFormData {
        self.snapshot.read().await.form.clone()
    }

    pub async fn puppies(&self) -> Vec<Puppy> {
        self.snapshot.read().await.puppies.clone()
    }

    /// Most recent first.
    pub async fn recent_transactions(&self) -> Vec<DonationTransaction> {
        self.snapshot.read().await.recent_transactions()
    }

    pub async fn token(&self) -> TokenState {
        self.snapshot.read().await.token.clone()
    }

    pub async fn is_token_owner(&self) -> bool {
        self.snapshot.read().await.is_token_owner
    }

    pub async fn handle_change(&self, field: FormField, value: impl Into<String>) {
        self.snapshot.write().await.form.set(field, value);
    }

    /// True while any mutating operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.any()
    }

    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.pending.is_pending(kind)
    }

    pub fn phase_of(&self, kind: OperationKind) -> Option<TxPhase> {
        self.pending.phase(kind)
    }

    pub fn pending_operations(&self) -> Vec<PendingOperation> {
        self.pending.operations()
    }

    fn session(&self) -> u64 {
        self.session.load(Ordering::Acquire)
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }
}
