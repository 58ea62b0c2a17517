use ps_api_types::{Notice, NoticeLevel};
use ps_chain_client::{AccountRequest, WalletProvider};
use std::sync::Arc;
use tracing::{info, warn};

use std::sync::atomic::Ordering;

use crate::{ChainSnapshot, SponsorStore};

const INSTALL_WALLET: &str = "Please install MetaMask!";

impl SponsorStore {
    /// The provider, or an install notice when there is none.
    fn provider_or_notify(&self) -> Option<Arc<dyn WalletProvider>> {
        if self.provider.is_none() {
            self.notify(Notice::new(NoticeLevel::Info, INSTALL_WALLET));
        }
        self.provider.clone()
    }

    /// Picks up an already-authorized account without prompting and, if
    /// there is one, loads all chain data. Failures are logged only.
    pub async fn check_if_wallet_connected(&self) {
        let Some(provider) = self.provider_or_notify() else {
            return;
        };

        match provider.request_accounts(AccountRequest::Authorized).await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    info!(%account, "found authorized account");
                    self.snapshot.write().await.account = account;
                    self.update_chain_contents().await;
                }
                None => info!("no authorized accounts found"),
            },
            Err(err) => warn!("eth_accounts failed: {err:#}"),
        }
    }

    /// Asks the wallet for an account, possibly prompting the user.
    pub async fn connect_wallet(&self) {
        let Some(provider) = self.provider_or_notify() else {
            return;
        };

        match provider.request_accounts(AccountRequest::Interactive).await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    info!(%account, "wallet connected");
                    self.snapshot.write().await.account = account;
                }
                None => warn!("wallet returned no accounts"),
            },
            Err(err) => warn!("eth_requestAccounts failed: {err:#}"),
        }
    }

    /// Forgets the account and everything loaded for it. The donation form
    /// is kept, and operations still confirming will not refresh afterwards.
    pub async fn disconnect_wallet(&self) {
        self.session.fetch_add(1, Ordering::AcqRel);
        let mut snapshot = self.snapshot.write().await;
        let form = std::mem::take(&mut snapshot.form);
        *snapshot = ChainSnapshot {
            form,
            ..ChainSnapshot::default()
        };
        info!("wallet disconnected");
    }
}
