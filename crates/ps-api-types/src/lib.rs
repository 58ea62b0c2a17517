use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex account address, always held lower-cased.
///
/// The empty address stands for "no wallet connected".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0x` followed by exactly 40 hex digits.
    pub fn is_well_formed(&self) -> bool {
        self.0
            .strip_prefix("0x")
            .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
}

// ── Display records ──

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Puppy {
    pub puppy_id: u64,
    pub name: String,
    pub birthday: String,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DonationTransaction {
    pub address_from: Address,
    pub address_to: Address,
    pub amount: f64,
    pub time: String,
    pub puppy_id: u64,
    pub message: String,
    pub keyword: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenState {
    pub symbol: String,
    pub balance: f64,
}

// ── Forms ──

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DonationFormData {
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Amount,
    Keyword,
    Message,
}

impl DonationFormData {
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Amount => &mut self.amount,
            FormField::Keyword => &mut self.keyword,
            FormField::Message => &mut self.message,
        };
        *slot = value.into();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPuppyInfo {
    pub name: String,
    pub birthday: String,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
}

// ── Orchestration ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Both donation paths; they consume the same form.
    Donation,
    CreatePuppy,
    TokenTransfer,
    TokenMint,
    TokenBurn,
    OwnershipTransfer,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Donation => "donation",
            OperationKind::CreatePuppy => "create_puppy",
            OperationKind::TokenTransfer => "token_transfer",
            OperationKind::TokenMint => "token_mint",
            OperationKind::TokenBurn => "token_burn",
            OperationKind::OwnershipTransfer => "ownership_transfer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxPhase {
    Submitting,
    AwaitingConfirmation,
    Refreshing,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A blocking, user-facing message (install a wallet, not authorized, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

// ── HTTP bodies ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormUpdateRequest {
    pub field: FormField,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTransferRequest {
    pub to: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMintRequest {
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBurnRequest {
    pub address: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipTransferRequest {
    pub new_owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub phase: TxPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub account: Address,
    pub is_loading: bool,
    pub pending: Vec<PendingOperation>,
    pub token: TokenState,
    pub is_token_owner: bool,
    pub form: DonationFormData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerResponse {
    pub owner: Address,
    pub is_current_account: bool,
}
