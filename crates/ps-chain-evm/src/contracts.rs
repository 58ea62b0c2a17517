use alloy_primitives::{Address as EvmAddress, U256, hex};
use alloy_sol_types::SolCall;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ps_api_types::Address;
use ps_chain_client::{
    DonationContract, NoSignerAccount, PendingTransaction, RawDonateTransaction, RawPuppy,
    TokenContract,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::abi::{self, IPuppySponsor, IPuppyToken};
use crate::pending::EvmPendingTransaction;
use crate::rpc::{RpcClient, TransactionRequest, quantity};

/// Address plus transport shared by both typed clients.
struct ContractHandle {
    rpc: Arc<RpcClient>,
    address: String,
    poll_interval: Duration,
}

impl ContractHandle {
    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let data = self
            .rpc
            .call(&self.address, call.abi_encode())
            .await
            .with_context(|| format!("{} read", C::SIGNATURE))?;
        C::abi_decode_returns(&data, true).with_context(|| format!("{} decode", C::SIGNATURE))
    }

    /// Sends from the provider's first account, the way a browser signer does.
    async fn write<C: SolCall>(
        &self,
        call: C,
        value: Option<U256>,
    ) -> Result<Box<dyn PendingTransaction>> {
        let data = hex::encode_prefixed(call.abi_encode());
        let from = self
            .rpc
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(NoSignerAccount)?;

        let tx_hash = self
            .rpc
            .send_transaction(TransactionRequest {
                from,
                to: self.address.clone(),
                data,
                value: value.map(quantity),
            })
            .await
            .with_context(|| format!("{} submit", C::SIGNATURE))?;

        info!(%tx_hash, method = C::SIGNATURE, "transaction submitted");
        Ok(Box::new(EvmPendingTransaction::new(
            self.rpc.clone(),
            tx_hash,
            self.poll_interval,
        )))
    }
}

fn to_evm(address: &Address) -> Result<EvmAddress> {
    address
        .as_str()
        .parse()
        .with_context(|| format!("invalid address '{address}'"))
}

fn from_evm(address: EvmAddress) -> Address {
    Address::new(address.to_string())
}

pub struct EvmDonationContract {
    handle: ContractHandle,
}

impl EvmDonationContract {
    pub(crate) fn new(rpc: Arc<RpcClient>, address: &Address, poll_interval: Duration) -> Self {
        Self {
            handle: ContractHandle {
                rpc,
                address: address.to_string(),
                poll_interval,
            },
        }
    }
}

impl From<abi::Puppy> for RawPuppy {
    fn from(puppy: abi::Puppy) -> Self {
        Self {
            puppy_id: puppy.puppyId,
            name: puppy.name,
            birthday: puppy.birthday,
            image_url: puppy.imageUrl,
            description: puppy.description,
        }
    }
}

impl From<abi::DonateTransaction> for RawDonateTransaction {
    fn from(tx: abi::DonateTransaction) -> Self {
        Self {
            donor: from_evm(tx.donor),
            receiver: from_evm(tx.receiver),
            amount: tx.amount,
            time: tx.time,
            puppy_id: tx.puppyId,
            message: tx.message,
            keyword: tx.keyword,
        }
    }
}

#[async_trait]
impl DonationContract for EvmDonationContract {
    async fn get_all_puppies(&self) -> Result<Vec<RawPuppy>> {
        let puppies = self.handle.read(IPuppySponsor::getAllPuppiesCall {}).await?;
        Ok(puppies._0.into_iter().map(RawPuppy::from).collect())
    }

    async fn get_all_donate_transactions(&self) -> Result<Vec<RawDonateTransaction>> {
        let txs = self
            .handle
            .read(IPuppySponsor::getAllDonateTransactionsCall {})
            .await?;
        Ok(txs._0.into_iter().map(RawDonateTransaction::from).collect())
    }

    async fn owner(&self) -> Result<Address> {
        let owner = self.handle.read(IPuppySponsor::ownerCall {}).await?;
        Ok(from_evm(owner._0))
    }

    async fn donate_for_food(
        &self,
        message: &str,
        keyword: &str,
        value: U256,
    ) -> Result<Box<dyn PendingTransaction>> {
        let call = IPuppySponsor::donateForFoodCall {
            message: message.to_owned(),
            keyword: keyword.to_owned(),
        };
        self.handle.write(call, Some(value)).await
    }

    async fn donate_for_puppy(
        &self,
        puppy_id: U256,
        message: &str,
        keyword: &str,
        value: U256,
    ) -> Result<Box<dyn PendingTransaction>> {
        let call = IPuppySponsor::donateForPuppyCall {
            puppyId: puppy_id,
            message: message.to_owned(),
            keyword: keyword.to_owned(),
        };
        self.handle.write(call, Some(value)).await
    }

    async fn create_new_puppy(
        &self,
        name: &str,
        birthday: &str,
        image_url: &str,
        description: &str,
    ) -> Result<Box<dyn PendingTransaction>> {
        let call = IPuppySponsor::createNewPuppyCall {
            name: name.to_owned(),
            birthday: birthday.to_owned(),
            imageUrl: image_url.to_owned(),
            description: description.to_owned(),
        };
        self.handle.write(call, None).await
    }
}

pub struct EvmTokenContract {
    handle: ContractHandle,
}

impl EvmTokenContract {
    pub(crate) fn new(rpc: Arc<RpcClient>, address: &Address, poll_interval: Duration) -> Self {
        Self {
            handle: ContractHandle {
                rpc,
                address: address.to_string(),
                poll_interval,
            },
        }
    }
}

#[async_trait]
impl TokenContract for EvmTokenContract {
    async fn balance_of(&self, account: &Address) -> Result<U256> {
        let call = IPuppyToken::balanceOfCall {
            account: to_evm(account)?,
        };
        Ok(self.handle.read(call).await?._0)
    }

    async fn symbol(&self) -> Result<String> {
        Ok(self.handle.read(IPuppyToken::symbolCall {}).await?._0)
    }

    async fn owner(&self) -> Result<Address> {
        let owner = self.handle.read(IPuppyToken::ownerCall {}).await?;
        Ok(from_evm(owner._0))
    }

    async fn transfer(&self, to: &Address, amount: U256) -> Result<Box<dyn PendingTransaction>> {
        let call = IPuppyToken::transferCall {
            to: to_evm(to)?,
            amount,
        };
        self.handle.write(call, None).await
    }

    async fn mint(&self, amount: U256) -> Result<Box<dyn PendingTransaction>> {
        self.handle.write(IPuppyToken::mintCall { amount }, None).await
    }

    async fn burn(&self, account: &Address, amount: U256) -> Result<Box<dyn PendingTransaction>> {
        let call = IPuppyToken::burnCall {
            account: to_evm(account)?,
            amount,
        };
        self.handle.write(call, None).await
    }

    async fn transfer_ownership(&self, new_owner: &Address) -> Result<Box<dyn PendingTransaction>> {
        let call = IPuppyToken::transferOwnershipCall {
            newOwner: to_evm(new_owner)?,
        };
        self.handle.write(call, None).await
    }
}
