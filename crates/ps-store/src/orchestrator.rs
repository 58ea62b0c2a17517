use anyhow::Result as AnyResult;
use ps_api_types::{
    DonationFormData, NewPuppyInfo, Notice, NoticeLevel, OperationKind, TxPhase, TxReceipt,
};
use ps_chain_client::{PendingTransaction, SponsorClients, U256};
use tracing::{debug, info, warn};

use crate::validate;
use crate::{OpError, PendingGuard, SponsorStore};

/// A claimed operation kind plus the wallet session it was started in.
struct InFlight<'a> {
    guard: PendingGuard<'a>,
    session: u64,
}

impl SponsorStore {
    fn begin(&self, kind: OperationKind) -> Result<InFlight<'_>, OpError> {
        let guard = self.pending.try_begin(kind).ok_or_else(|| {
            debug!(%kind, "dropped; already in flight");
            OpError::Busy(kind)
        })?;
        Ok(InFlight {
            guard,
            session: self.session(),
        })
    }

    fn clients_or_fail(&self) -> Result<&SponsorClients, OpError> {
        self.clients.as_ref().ok_or_else(|| {
            warn!("no ethereum object");
            OpError::NoProvider
        })
    }

    fn reject_input(&self, err: OpError) -> OpError {
        self.notify(
            Notice::new(NoticeLevel::Warning, "Some info seems not correct!")
                .with_text("Please check your inputs and try again"),
        );
        err
    }

    fn fail(&self, guard: &PendingGuard<'_>, err: OpError) -> OpError {
        guard.advance(TxPhase::Failed);
        warn!(kind = %guard.kind(), "transaction failed: {err}");
        err
    }

    /// Awaits confirmation, then resets the form and refreshes chain data.
    /// The guard is released on every path out of here. No refresh happens
    /// if the wallet was disconnected in the meantime.
    async fn confirm(
        &self,
        op: InFlight<'_>,
        submitted: AnyResult<Box<dyn PendingTransaction>>,
    ) -> Result<TxReceipt, OpError> {
        let InFlight { guard, session } = op;
        let tx = submitted.map_err(|err| self.fail(&guard, OpError::from_chain(err)))?;

        guard.advance(TxPhase::AwaitingConfirmation);
        info!(kind = %guard.kind(), tx_hash = %tx.hash(), "loading");

        let receipt = tx
            .wait()
            .await
            .map_err(|err| self.fail(&guard, OpError::from_chain(err)))?;
        info!(kind = %guard.kind(), tx_hash = %tx.hash(), "done");

        guard.advance(TxPhase::Refreshing);
        self.snapshot.write().await.form = DonationFormData::default();
        if self.session() == session {
            self.update_chain_contents().await;
        } else {
            debug!(kind = %guard.kind(), "wallet disconnected while confirming; skipping refresh");
        }

        Ok(receipt)
    }

    async fn donation_value(&self) -> Result<(DonationFormData, U256), OpError> {
        let form = self.form().await;
        let value = validate::donation_value(&form, self.settings.min_donation)
            .map_err(|err| self.reject_input(err))?;
        Ok((form, value))
    }

    /// Donates the form amount to the general food fund.
    pub async fn donate_for_food(&self) -> Result<TxReceipt, OpError> {
        let op = self.begin(OperationKind::Donation)?;
        let (form, value) = self.donation_value().await?;
        let clients = self.clients_or_fail()?;

        let submitted = clients
            .donation
            .donate_for_food(&form.message, &form.keyword, value)
            .await;
        self.confirm(op, submitted).await
    }

    /// Donates the form amount to one puppy.
    pub async fn donate_for_puppy(&self, puppy_id: u64) -> Result<TxReceipt, OpError> {
        let op = self.begin(OperationKind::Donation)?;
        let (form, value) = self.donation_value().await?;
        let clients = self.clients_or_fail()?;

        let submitted = clients
            .donation
            .donate_for_puppy(U256::from(puppy_id), &form.message, &form.keyword, value)
            .await;
        self.confirm(op, submitted).await
    }

    pub async fn create_new_puppy(&self, info: &NewPuppyInfo) -> Result<TxReceipt, OpError> {
        let op = self.begin(OperationKind::CreatePuppy)?;
        validate::new_puppy(info).map_err(|err| self.reject_input(err))?;
        let clients = self.clients_or_fail()?;

        let submitted = clients
            .donation
            .create_new_puppy(&info.name, &info.birthday, &info.image_url, &info.description)
            .await;
        let receipt = self.confirm(op, submitted).await?;

        self.notify(Notice::new(NoticeLevel::Success, "Nice!").with_text("Puppy has been created."));
        Ok(receipt)
    }

    pub async fn transfer_puppy_token(&self, to: &str, amount: &str) -> Result<TxReceipt, OpError> {
        let op = self.begin(OperationKind::TokenTransfer)?;
        let to = validate::address(to).map_err(|err| self.reject_input(err))?;
        let amount = validate::token_amount(amount).map_err(|err| self.reject_input(err))?;
        let clients = self.clients_or_fail()?;

        let submitted = clients.token.transfer(&to, amount).await;
        self.confirm(op, submitted).await
    }

    pub async fn mint_puppy_token(&self, amount: &str) -> Result<TxReceipt, OpError> {
        let op = self.begin(OperationKind::TokenMint)?;
        let amount = validate::token_amount(amount).map_err(|err| self.reject_input(err))?;
        let clients = self.clients_or_fail()?;

        let submitted = clients.token.mint(amount).await;
        self.confirm(op, submitted).await
    }

    pub async fn burn_puppy_token(&self, account: &str, amount: &str) -> Result<TxReceipt, OpError> {
        let op = self.begin(OperationKind::TokenBurn)?;
        let account = validate::address(account).map_err(|err| self.reject_input(err))?;
        let amount = validate::token_amount(amount).map_err(|err| self.reject_input(err))?;
        let clients = self.clients_or_fail()?;

        let submitted = clients.token.burn(&account, amount).await;
        self.confirm(op, submitted).await
    }

    /// Hands the token contract to `new_owner`. Every failure past the guard
    /// and input checks is also reported to the user.
    pub async fn transfer_owner(&self, new_owner: &str) -> Result<TxReceipt, OpError> {
        let result = self.submit_ownership_transfer(new_owner).await;

        if let Err(err) = &result {
            if !matches!(err, OpError::Busy(_) | OpError::Validation(_)) {
                self.notify(
                    Notice::new(NoticeLevel::Error, "Transfer ownership failed")
                        .with_text(err.to_string()),
                );
            }
        }
        result
    }

    async fn submit_ownership_transfer(&self, new_owner: &str) -> Result<TxReceipt, OpError> {
        let op = self.begin(OperationKind::OwnershipTransfer)?;
        let new_owner = validate::address(new_owner).map_err(|err| self.reject_input(err))?;
        let clients = self.clients_or_fail()?;

        let submitted = clients.token.transfer_ownership(&new_owner).await;
        self.confirm(op, submitted).await
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{FakeChain, RecordingNotifier, store_with, store_without_wallet};
    use crate::OpError;
    use ps_api_types::{
        DonationFormData, FormField, NewPuppyInfo, NoticeLevel, OperationKind, TxPhase,
    };
    use std::sync::Arc;

    const RECIPIENT: &str = "0x00000000000000000000000000000000000000c3";

    async fn fill_form(store: &crate::SponsorStore, amount: &str, keyword: &str, message: &str) {
        store.handle_change(FormField::Amount, amount).await;
        store.handle_change(FormField::Keyword, keyword).await;
        store.handle_change(FormField::Message, message).await;
    }

    async fn until_phase(store: &crate::SponsorStore, kind: OperationKind, phase: TxPhase) {
        while !store
            .pending_operations()
            .iter()
            .any(|op| op.kind == kind && op.phase == phase)
        {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn donation_for_puppy_submits_value_resets_form_and_refreshes_once() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        let store = store_with(&chain, RecordingNotifier::shared());
        store.connect_wallet().await;
        fill_form(&store, "0.01", "x", "hi").await;

        let receipt = store.donate_for_puppy(42).await?;

        assert!(receipt.tx_hash.0.starts_with("0xfake"));
        assert!(
            chain
                .calls()
                .contains(&"donate_for_puppy(42,hi,x,10000000000000000)".to_owned())
        );
        assert_eq!(store.form().await, DonationFormData::default());
        assert_eq!(chain.count("get_all_puppies"), 1);
        assert_eq!(chain.count("get_all_donate_transactions"), 1);
        assert_eq!(chain.count("symbol"), 1);
        assert!(!store.is_loading());
        Ok(())
    }

    #[tokio::test]
    async fn second_call_of_same_kind_is_dropped_while_first_confirms() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.hold_confirmations = true);
        let store = Arc::new(store_with(&chain, RecordingNotifier::shared()));

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.transfer_puppy_token(RECIPIENT, "5").await }
        });
        until_phase(&store, OperationKind::TokenTransfer, TxPhase::AwaitingConfirmation).await;

        let second = store.transfer_puppy_token(RECIPIENT, "5").await;
        assert_eq!(second, Err(OpError::Busy(OperationKind::TokenTransfer)));
        assert_eq!(chain.count("transfer"), 1);
        assert!(store.is_loading());

        chain.release_one();
        first.await??;
        assert!(!store.is_loading());
        Ok(())
    }

    #[tokio::test]
    async fn unrelated_kinds_do_not_block_each_other() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.hold_confirmations = true);
        let store = Arc::new(store_with(&chain, RecordingNotifier::shared()));
        fill_form(&store, "0.5", "food", "for kibble").await;

        let donation = tokio::spawn({
            let store = store.clone();
            async move { store.donate_for_food().await }
        });
        until_phase(&store, OperationKind::Donation, TxPhase::AwaitingConfirmation).await;

        chain.with_state(|s| s.hold_confirmations = false);
        store.mint_puppy_token("10").await?;
        assert!(store.is_pending(OperationKind::Donation));

        chain.release_one();
        donation.await??;
        assert_eq!(chain.count("mint"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn reverted_transaction_clears_pending_and_keeps_form() {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.revert_writes = true);
        let store = store_with(&chain, RecordingNotifier::shared());
        fill_form(&store, "0.01", "x", "hi").await;

        let result = store.donate_for_food().await;

        assert!(matches!(result, Err(OpError::Reverted(_))));
        assert!(!store.is_loading());
        assert_eq!(store.form().await.amount, "0.01");
        assert_eq!(chain.count("get_all_puppies"), 0);
    }

    #[tokio::test]
    async fn wallet_rejection_is_reported_as_rejected() {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.reject_writes = true);
        let store = store_with(&chain, RecordingNotifier::shared());

        let result = store.mint_puppy_token("1").await;

        assert!(matches!(result, Err(OpError::Rejected(_))));
        assert!(!store.is_pending(OperationKind::TokenMint));
    }

    #[tokio::test]
    async fn invalid_donation_warns_without_calling_the_contract() {
        let chain = FakeChain::shared();
        let notifier = RecordingNotifier::shared();
        let store = store_with(&chain, notifier.clone());
        fill_form(&store, "0.01", "", "hi").await;

        let result = store.donate_for_puppy(1).await;

        assert!(matches!(result, Err(OpError::Validation(_))));
        assert_eq!(chain.count("donate_for_puppy"), 0);
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Warning);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn missing_provider_fails_fast() {
        let store = store_without_wallet(RecordingNotifier::shared());
        fill_form(&store, "0.01", "x", "hi").await;

        assert_eq!(store.donate_for_food().await, Err(OpError::NoProvider));
        assert_eq!(
            store.transfer_puppy_token(RECIPIENT, "1").await,
            Err(OpError::NoProvider)
        );
    }

    #[tokio::test]
    async fn token_calls_carry_scaled_amounts() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        let store = store_with(&chain, RecordingNotifier::shared());

        store.burn_puppy_token(RECIPIENT, "2").await?;
        store.transfer_owner(RECIPIENT).await?;

        let calls = chain.calls();
        assert!(calls.contains(&format!("burn({RECIPIENT},2000000000000000000)")));
        assert!(calls.contains(&format!("transfer_ownership({RECIPIENT})")));
        Ok(())
    }

    #[tokio::test]
    async fn failed_ownership_transfer_tells_the_user() {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.revert_writes = true);
        let notifier = RecordingNotifier::shared();
        let store = store_with(&chain, notifier.clone());

        let result = store.transfer_owner(RECIPIENT).await;

        assert!(matches!(result, Err(OpError::Reverted(_))));
        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn ownership_transfer_without_a_signer_tells_the_user() {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.no_signer = true);
        let notifier = RecordingNotifier::shared();
        let store = store_with(&chain, notifier.clone());

        let result = store.transfer_owner(RECIPIENT).await;

        assert_eq!(result, Err(OpError::NoAccount));
        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(!store.is_pending(OperationKind::OwnershipTransfer));
    }

    #[tokio::test]
    async fn busy_ownership_transfer_raises_no_error_notice() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.hold_confirmations = true);
        let notifier = RecordingNotifier::shared();
        let store = Arc::new(store_with(&chain, notifier.clone()));

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.transfer_owner(RECIPIENT).await }
        });
        until_phase(&store, OperationKind::OwnershipTransfer, TxPhase::AwaitingConfirmation).await;

        assert_eq!(
            store.transfer_owner(RECIPIENT).await,
            Err(OpError::Busy(OperationKind::OwnershipTransfer))
        );
        assert!(notifier.notices().is_empty());

        chain.release_one();
        first.await??;
        Ok(())
    }

    #[tokio::test]
    async fn other_failed_token_calls_stay_silent() {
        let chain = FakeChain::shared();
        chain.with_state(|s| s.revert_writes = true);
        let notifier = RecordingNotifier::shared();
        let store = store_with(&chain, notifier.clone());

        let _ = store.mint_puppy_token("1").await;

        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn new_puppy_is_validated_then_created() -> anyhow::Result<()> {
        let chain = FakeChain::shared();
        let notifier = RecordingNotifier::shared();
        let store = store_with(&chain, notifier.clone());

        let bad = NewPuppyInfo {
            name: "Mochi".to_owned(),
            birthday: "2021-02-30".to_owned(),
            image_url: "https://example.com/mochi.png".to_owned(),
            description: String::new(),
        };
        assert!(matches!(
            store.create_new_puppy(&bad).await,
            Err(OpError::Validation(_))
        ));
        assert_eq!(chain.count("create_new_puppy"), 0);

        let good = NewPuppyInfo {
            birthday: "2021/02/28".to_owned(),
            ..bad
        };
        store.create_new_puppy(&good).await?;

        assert_eq!(chain.count("create_new_puppy"), 1);
        let last = notifier.notices().pop().expect("success notice");
        assert_eq!(last.level, NoticeLevel::Success);
        Ok(())
    }
}
