use ps_api_types::{Address, DonationFormData, DonationTransaction, Puppy, TokenState};

/// Everything the store knows about the session. Chain-derived fields are
/// only ever replaced wholesale by the fetchers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainSnapshot {
    pub account: Address,
    pub form: DonationFormData,
    pub puppies: Vec<Puppy>,
    /// Chain-return order, oldest first.
    pub transactions: Vec<DonationTransaction>,
    pub token: TokenState,
    pub is_token_owner: bool,
}

impl ChainSnapshot {
    pub fn recent_transactions(&self) -> Vec<DonationTransaction> {
        self.transactions.iter().rev().cloned().collect()
    }
}
