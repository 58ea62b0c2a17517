use anyhow::{Context, Result, anyhow};
use ps_api_types::Address;
use ps_chain_client::ContractAddresses;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;

/// Deployment artifact as emitted by the contract build: `{ "CA": "0x..", "abi": [..] }`.
#[derive(Debug, Deserialize)]
struct Deployment {
    #[serde(rename = "CA")]
    contract_address: String,
}

#[derive(Debug, Clone)]
pub struct EvmConfig {
    pub rpc_url: String,
    pub contracts: ContractAddresses,
    pub receipt_poll_interval: Duration,
}

impl EvmConfig {
    /// Reads `PUPPY_RPC_URL`, `PUPPY_SPONSOR_CONTRACT` (or `PUPPY_SPONSOR_DEPLOYMENT`),
    /// `PUPPY_TOKEN_CONTRACT` (or `PUPPY_TOKEN_DEPLOYMENT`) and `PUPPY_RECEIPT_POLL_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rpc_url = lookup("PUPPY_RPC_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_owned());

        let donation = contract_address(&lookup, "PUPPY_SPONSOR_CONTRACT", "PUPPY_SPONSOR_DEPLOYMENT")?;
        let token = contract_address(&lookup, "PUPPY_TOKEN_CONTRACT", "PUPPY_TOKEN_DEPLOYMENT")?;

        let poll_ms = match lookup("PUPPY_RECEIPT_POLL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("PUPPY_RECEIPT_POLL_MS must be an integer, got '{raw}'"))?,
            None => DEFAULT_RECEIPT_POLL_MS,
        };
        if poll_ms == 0 {
            return Err(anyhow!("PUPPY_RECEIPT_POLL_MS must be greater than zero"));
        }

        Ok(Self {
            rpc_url,
            contracts: ContractAddresses { donation, token },
            receipt_poll_interval: Duration::from_millis(poll_ms),
        })
    }
}

fn contract_address(
    lookup: &impl Fn(&str) -> Option<String>,
    address_key: &str,
    deployment_key: &str,
) -> Result<Address> {
    let address = match (lookup(address_key), lookup(deployment_key)) {
        (Some(raw), _) => Address::new(raw),
        (None, Some(path)) => load_deployment(Path::new(&path))?,
        (None, None) => {
            return Err(anyhow!("set {address_key} or {deployment_key}"));
        }
    };

    if !address.is_well_formed() {
        return Err(anyhow!("{address_key}: malformed contract address '{address}'"));
    }
    Ok(address)
}

pub fn load_deployment(path: &Path) -> Result<Address> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read deployment {}", path.display()))?;
    let deployment: Deployment = serde_json::from_str(&raw)
        .with_context(|| format!("parse deployment {}", path.display()))?;
    Ok(Address::new(deployment.contract_address))
}
