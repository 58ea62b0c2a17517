use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use ps_api_types::{Address, DonationTransaction, Notice, NoticeLevel, Puppy};
use ps_chain_client::units::{to_display_amount, to_u64};
use ps_chain_client::{RawDonateTransaction, RawPuppy, SponsorClients};
use std::fmt::Display;
use tracing::{debug, info, warn};

use crate::{OpError, SponsorStore};

/// Epoch seconds as local wall-clock time, `YYYY/MM/DD HH:MM:SS`.
pub fn format_time(epoch_seconds: u64) -> String {
    format_time_in(epoch_seconds, &Local)
}

pub fn format_time_in<Tz>(epoch_seconds: u64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    i64::try_from(epoch_seconds)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(tz).format("%Y/%m/%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_seconds.to_string())
}

fn puppy_record(raw: RawPuppy) -> Result<Puppy> {
    Ok(Puppy {
        puppy_id: to_u64(raw.puppy_id)?,
        name: raw.name,
        birthday: raw.birthday,
        image_url: raw.image_url,
        description: raw.description,
    })
}

fn transaction_record(raw: RawDonateTransaction) -> Result<DonationTransaction> {
    Ok(DonationTransaction {
        address_from: raw.donor,
        address_to: raw.receiver,
        amount: to_display_amount(raw.amount),
        time: format_time(to_u64(raw.time)?),
        puppy_id: to_u64(raw.puppy_id)?,
        message: raw.message,
        keyword: raw.keyword,
    })
}

impl SponsorStore {
    fn clients_or_log(&self) -> Option<&SponsorClients> {
        if self.clients.is_none() {
            info!("ethereum provider is not present");
        }
        self.clients.as_ref()
    }

    pub async fn get_all_puppies(&self) {
        let Some(clients) = self.clients_or_log() else {
            return;
        };

        let puppies = match clients.donation.get_all_puppies().await {
            Ok(raw) => raw.into_iter().map(puppy_record).collect::<Result<Vec<_>>>(),
            Err(err) => Err(err),
        };

        match puppies {
            Ok(puppies) => {
                debug!(count = puppies.len(), "puppies loaded");
                self.snapshot.write().await.puppies = puppies;
            }
            Err(err) => warn!("getAllPuppies failed: {err:#}"),
        }
    }

    pub async fn get_all_transactions(&self) {
        let Some(clients) = self.clients_or_log() else {
            return;
        };

        let transactions = match clients.donation.get_all_donate_transactions().await {
            Ok(raw) => raw
                .into_iter()
                .map(transaction_record)
                .collect::<Result<Vec<_>>>(),
            Err(err) => Err(err),
        };

        match transactions {
            Ok(transactions) => {
                debug!(count = transactions.len(), "donation transactions loaded");
                self.snapshot.write().await.transactions = transactions;
            }
            Err(err) => warn!("getAllDonateTransactions failed: {err:#}"),
        }
    }

    pub async fn get_puppy_token_balance(&self) {
        let Some(clients) = self.clients_or_log() else {
            return;
        };
        let account = self.account().await;
        if account.is_empty() {
            debug!("no account; skipping token balance");
            return;
        }

        match clients.token.balance_of(&account).await {
            Ok(balance) => {
                self.snapshot.write().await.token.balance = to_display_amount(balance);
            }
            Err(err) => warn!("balanceOf failed: {err:#}"),
        }
    }

    pub async fn get_puppy_token_symbol(&self) {
        let Some(clients) = self.clients_or_log() else {
            return;
        };

        match clients.token.symbol().await {
            Ok(symbol) => self.snapshot.write().await.token.symbol = symbol,
            Err(err) => warn!("symbol failed: {err:#}"),
        }
    }

    pub async fn check_token_contract_owner(&self) {
        let Some(clients) = self.clients_or_log() else {
            return;
        };

        match clients.token.owner().await {
            Ok(owner) => {
                let mut snapshot = self.snapshot.write().await;
                snapshot.is_token_owner = !snapshot.account.is_empty() && owner == snapshot.account;
            }
            Err(err) => warn!("token owner failed: {err:#}"),
        }
    }

    /// Donation contract owner, lower-cased.
    pub async fn owner(&self) -> Result<Address, OpError> {
        let clients = self.clients.as_ref().ok_or(OpError::NoProvider)?;
        clients
            .donation
            .owner()
            .await
            .map_err(|err| OpError::Query(format!("{err:#}")))
    }

    /// Whether the connected account may add puppies; tells the user when not.
    /// A failed owner lookup is returned rather than read as "not the owner".
    pub async fn check_puppy_admin(&self) -> Result<bool, OpError> {
        let account = self.account().await;
        let owner = self.owner().await.inspect_err(|err| {
            warn!("owner lookup failed: {err}");
        })?;

        if !owner.is_empty() && owner == account {
            return Ok(true);
        }
        self.notify(
            Notice::new(NoticeLevel::Error, "You are not able to add any puppy").with_text(
                format!("Please login as the foundation owner ({owner}) and try again"),
            ),
        );
        Ok(false)
    }

    /// Re-reads every chain-derived field, in a fixed order.
    pub async fn update_chain_contents(&self) {
        self.get_all_puppies().await;
        self.get_all_transactions().await;
        self.get_puppy_token_balance().await;
        self.get_puppy_token_symbol().await;
        self.check_token_contract_owner().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChain, RecordingNotifier, store_with, store_without_wallet};
    use chrono::Utc;

    #[test]
    fn epoch_seconds_render_as_wall_clock() {
        assert_eq!(format_time_in(0, &Utc), "1970/01/01 00:00:00");
        assert_eq!(format_time_in(1_650_000_000, &Utc), "2022/04/15 05:20:00");
        assert_eq!(format_time_in(u64::MAX, &Utc), u64::MAX.to_string());
    }

    #[tokio::test]
    async fn transactions_are_shown_most_recent_first() {
        let chain = FakeChain::shared();
        let store = store_with(&chain, RecordingNotifier::shared());

        store.get_all_transactions().await;

        let snapshot = store.snapshot().await;
        let recent = store.recent_transactions().await;
        assert_eq!(snapshot.transactions.len(), 3);
        let stored: Vec<_> = snapshot.transactions.iter().rev().cloned().collect();
        assert_eq!(recent, stored);
        assert_eq!(recent[0].message, "third");
    }

    #[tokio::test]
    async fn transaction_amounts_are_whole_units() {
        let chain = FakeChain::shared();
        let store = store_with(&chain, RecordingNotifier::shared());

        store.get_all_transactions().await;

        let first = &store.snapshot().await.transactions[0];
        assert_eq!(first.amount, 1.0);
        assert_eq!(first.address_from, Address::new(FakeChain::ACCOUNT));
    }

    #[tokio::test]
    async fn failed_reads_leave_state_untouched() {
        let chain = FakeChain::shared();
        let store = store_with(&chain, RecordingNotifier::shared());
        store.get_all_puppies().await;

        chain.with_state(|s| s.fail_reads = true);
        store.get_all_puppies().await;

        assert_eq!(store.puppies().await.len(), 2);
    }

    #[tokio::test]
    async fn fetchers_without_provider_do_nothing() {
        let store = store_without_wallet(RecordingNotifier::shared());
        store.update_chain_contents().await;

        assert_eq!(store.snapshot().await, crate::ChainSnapshot::default());
        assert_eq!(store.owner().await, Err(OpError::NoProvider));
    }

    #[tokio::test]
    async fn token_ownership_follows_the_account() {
        let chain = FakeChain::shared();
        let store = store_with(&chain, RecordingNotifier::shared());

        store.check_token_contract_owner().await;
        assert!(!store.is_token_owner().await);

        store.check_if_wallet_connected().await;
        assert!(store.is_token_owner().await);
        assert_eq!(store.token().await.balance, 3.0);
    }

    #[tokio::test]
    async fn non_owner_is_told_they_cannot_add_puppies() {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.donation_owner = Address::new(FakeChain::OTHER));
        let notifier = RecordingNotifier::shared();
        let store = store_with(&chain, notifier.clone());
        store.connect_wallet().await;

        assert_eq!(store.check_puppy_admin().await, Ok(false));
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Error);

        chain.with_state(|s| s.donation_owner = Address::new(FakeChain::ACCOUNT));
        assert_eq!(store.check_puppy_admin().await, Ok(true));
    }

    #[tokio::test]
    async fn owner_lookup_failures_are_not_a_verdict() {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.fail_reads = true);
        let notifier = RecordingNotifier::shared();
        let store = store_with(&chain, notifier.clone());

        assert!(matches!(store.check_puppy_admin().await, Err(OpError::Query(_))));

        let without = store_without_wallet(notifier.clone());
        assert_eq!(without.check_puppy_admin().await, Err(OpError::NoProvider));
        assert!(notifier.notices().is_empty());
    }
}
