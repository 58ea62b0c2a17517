//! In-memory chain double for exercising the store without a node.

use anyhow::{Result, bail};
use async_trait::async_trait;
use ps_api_types::{Address, Notice, TxHash, TxReceipt};
use ps_chain_client::{
    AccountRequest, ContractAddresses, ContractFactory, DonationContract, NoSignerAccount,
    PendingTransaction, RawDonateTransaction, RawPuppy, TokenContract, TxReverted, U256,
    WalletProvider,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use crate::{Notifier, SponsorStore, StoreSettings};

const ETHER: u128 = 1_000_000_000_000_000_000;

pub struct FakeState {
    pub accounts: Vec<Address>,
    pub puppies: Vec<RawPuppy>,
    pub transactions: Vec<RawDonateTransaction>,
    pub donation_owner: Address,
    pub token_owner: Address,
    pub symbol: String,
    pub balance: U256,
    pub fail_account_requests: bool,
    pub fail_reads: bool,
    /// Writes fail at submission, as if the user declined in the wallet.
    pub reject_writes: bool,
    /// Writes are mined but fail.
    pub revert_writes: bool,
    /// The wallet has no account to sign writes with.
    pub no_signer: bool,
    /// Confirmations wait for [`FakeChain::release_one`].
    pub hold_confirmations: bool,
    calls: Vec<String>,
    submitted: u64,
}

impl Default for FakeState {
    fn default() -> Self {
        let puppy = |id: u64, name: &str| RawPuppy {
            puppy_id: U256::from(id),
            name: name.to_owned(),
            birthday: "2020/05/01".to_owned(),
            image_url: format!("https://example.com/{id}.png"),
            description: String::new(),
        };
        let donation = |amount: u128, time: u64, message: &str| RawDonateTransaction {
            donor: Address::new(FakeChain::ACCOUNT),
            receiver: Address::new(FakeChain::OTHER),
            amount: U256::from(amount),
            time: U256::from(time),
            puppy_id: U256::from(1),
            message: message.to_owned(),
            keyword: "kibble".to_owned(),
        };

        Self {
            accounts: vec![Address::new(FakeChain::ACCOUNT)],
            puppies: vec![puppy(1, "Biscuit"), puppy(2, "Pepper")],
            transactions: vec![
                donation(ETHER, 1_650_000_000, "first"),
                donation(2 * ETHER, 1_650_000_100, "second"),
                donation(ETHER / 2, 1_650_000_200, "third"),
            ],
            donation_owner: Address::new(FakeChain::ACCOUNT),
            token_owner: Address::new(FakeChain::ACCOUNT),
            symbol: "PUP".to_owned(),
            balance: U256::from(3 * ETHER),
            fail_account_requests: false,
            fail_reads: false,
            reject_writes: false,
            revert_writes: false,
            no_signer: false,
            hold_confirmations: false,
            calls: Vec::new(),
            submitted: 0,
        }
    }
}

/// Shared chain state behind the fake wallet and both fake contracts.
/// Every contract call is recorded as `name(arg,..)`.
#[derive(Default)]
pub struct FakeChain {
    state: Mutex<FakeState>,
    release: Notify,
}

impl FakeChain {
    pub const ACCOUNT: &'static str = "0x00000000000000000000000000000000000000a1";
    pub const OTHER: &'static str = "0x00000000000000000000000000000000000000b2";

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls to `method`.
    pub fn count(&self, method: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.split('(').next() == Some(method))
            .count()
    }

    /// Lets one held confirmation through.
    pub fn release_one(&self) {
        self.release.notify_one();
    }

    fn read<T>(&self, call: &str, f: impl FnOnce(&FakeState) -> T) -> Result<T> {
        let mut state = self.lock();
        state.calls.push(call.to_owned());
        if state.fail_reads {
            bail!("{call}: node unavailable");
        }
        Ok(f(&state))
    }

    fn submit(self: &Arc<Self>, call: String) -> Result<Box<dyn PendingTransaction>> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.no_signer {
            return Err(NoSignerAccount.into());
        }
        if state.reject_writes {
            bail!("user rejected transaction");
        }
        state.submitted += 1;

        Ok(Box::new(FakePendingTransaction {
            chain: self.clone(),
            hash: TxHash(format!("0xfake{:04}", state.submitted)),
            block_number: state.submitted,
            revert: state.revert_writes,
            hold: state.hold_confirmations,
        }))
    }
}

struct FakePendingTransaction {
    chain: Arc<FakeChain>,
    hash: TxHash,
    block_number: u64,
    revert: bool,
    hold: bool,
}

#[async_trait]
impl PendingTransaction for FakePendingTransaction {
    fn hash(&self) -> &TxHash {
        &self.hash
    }

    async fn wait(&self) -> Result<TxReceipt> {
        if self.hold {
            self.chain.release.notified().await;
        }
        if self.revert {
            return Err(TxReverted {
                tx_hash: self.hash.clone(),
            }
            .into());
        }
        Ok(TxReceipt {
            tx_hash: self.hash.clone(),
            block_number: self.block_number,
            gas_used: 21_000,
        })
    }
}

pub struct FakeWallet {
    chain: Arc<FakeChain>,
}

impl FakeWallet {
    pub fn new(chain: &Arc<FakeChain>) -> Self {
        Self {
            chain: chain.clone(),
        }
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self, _request: AccountRequest) -> Result<Vec<Address>> {
        let state = self.chain.lock();
        if state.fail_account_requests {
            bail!("wallet locked");
        }
        Ok(state.accounts.iter().map(|a| Address::new(a.as_str())).collect())
    }
}

impl ContractFactory for FakeWallet {
    fn donation_contract(&self, _address: &Address) -> Arc<dyn DonationContract> {
        Arc::new(FakeDonation(self.chain.clone()))
    }

    fn token_contract(&self, _address: &Address) -> Arc<dyn TokenContract> {
        Arc::new(FakeToken(self.chain.clone()))
    }
}

struct FakeDonation(Arc<FakeChain>);

#[async_trait]
impl DonationContract for FakeDonation {
    async fn get_all_puppies(&self) -> Result<Vec<RawPuppy>> {
        self.0.read("get_all_puppies", |s| s.puppies.clone())
    }

    async fn get_all_donate_transactions(&self) -> Result<Vec<RawDonateTransaction>> {
        self.0
            .read("get_all_donate_transactions", |s| s.transactions.clone())
    }

    async fn owner(&self) -> Result<Address> {
        self.0.read("owner", |s| s.donation_owner.clone())
    }

    async fn donate_for_food(
        &self,
        message: &str,
        keyword: &str,
        value: U256,
    ) -> Result<Box<dyn PendingTransaction>> {
        self.0
            .submit(format!("donate_for_food({message},{keyword},{value})"))
    }

    async fn donate_for_puppy(
        &self,
        puppy_id: U256,
        message: &str,
        keyword: &str,
        value: U256,
    ) -> Result<Box<dyn PendingTransaction>> {
        self.0.submit(format!(
            "donate_for_puppy({puppy_id},{message},{keyword},{value})"
        ))
    }

    async fn create_new_puppy(
        &self,
        name: &str,
        birthday: &str,
        image_url: &str,
        description: &str,
    ) -> Result<Box<dyn PendingTransaction>> {
        self.0.submit(format!(
            "create_new_puppy({name},{birthday},{image_url},{description})"
        ))
    }
}

struct FakeToken(Arc<FakeChain>);

#[async_trait]
impl TokenContract for FakeToken {
    async fn balance_of(&self, account: &Address) -> Result<U256> {
        self.0.read(&format!("balance_of({account})"), |s| s.balance)
    }

    async fn symbol(&self) -> Result<String> {
        self.0.read("symbol", |s| s.symbol.clone())
    }

    async fn owner(&self) -> Result<Address> {
        self.0.read("token_owner", |s| s.token_owner.clone())
    }

    async fn transfer(&self, to: &Address, amount: U256) -> Result<Box<dyn PendingTransaction>> {
        self.0.submit(format!("transfer({to},{amount})"))
    }

    async fn mint(&self, amount: U256) -> Result<Box<dyn PendingTransaction>> {
        self.0.submit(format!("mint({amount})"))
    }

    async fn burn(&self, account: &Address, amount: U256) -> Result<Box<dyn PendingTransaction>> {
        self.0.submit(format!("burn({account},{amount})"))
    }

    async fn transfer_ownership(&self, new_owner: &Address) -> Result<Box<dyn PendingTransaction>> {
        self.0.submit(format!("transfer_ownership({new_owner})"))
    }
}

/// Keeps every notice for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

pub fn store_with(chain: &Arc<FakeChain>, notifier: Arc<dyn Notifier>) -> SponsorStore {
    let addresses = ContractAddresses {
        donation: Address::new("0x00000000000000000000000000000000000000d0"),
        token: Address::new("0x00000000000000000000000000000000000000e0"),
    };
    SponsorStore::with_wallet(
        Arc::new(FakeWallet::new(chain)),
        &addresses,
        notifier,
        StoreSettings::default(),
    )
}

pub fn store_without_wallet(notifier: Arc<dyn Notifier>) -> SponsorStore {
    SponsorStore::without_wallet(notifier, StoreSettings::default())
}
