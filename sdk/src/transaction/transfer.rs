//! Crypto transfers: move hbar and fungible tokens between accounts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::builder::{Transaction, TransactionData};
use super::types::Hbar;
use crate::config::DEFAULT_TRANSFER_MAX_FEE;
use crate::entity::{AccountId, EntityIdError, NetworkName, TokenId, ValidateChecksums};
use crate::error::{Error, Result};
use crate::network::wire::TransactionBodyData;

/// Transfers hbar and tokens. Debits are negative amounts; every list must
/// net to zero for the network to accept it.
pub type TransferTransaction = Transaction<TransferTransactionData>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferTransactionData {
    hbar_transfers: Vec<HbarTransfer>,
    token_transfers: Vec<TokenTransferList>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HbarTransfer {
    pub account_id: AccountId,
    pub amount: Hbar,
}

/// All movements of one token, in first-insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransferList {
    pub token_id: TokenId,
    pub transfers: Vec<TokenTransfer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub account_id: AccountId,
    /// In the token's smallest unit.
    pub amount: i64,
}

impl TransferTransactionData {
    pub fn hbar_transfers(&self) -> &[HbarTransfer] {
        &self.hbar_transfers
    }

    pub fn token_transfers(&self) -> &[TokenTransferList] {
        &self.token_transfers
    }
}

impl TransactionData for TransferTransactionData {
    fn default_max_transaction_fee(&self) -> Hbar {
        Hbar::from_tinybars(DEFAULT_TRANSFER_MAX_FEE)
    }

    fn to_body_data(&self) -> TransactionBodyData {
        TransactionBodyData::CryptoTransfer(self.clone())
    }
}

impl ValidateChecksums for TransferTransactionData {
    fn validate_checksums(&self, network: NetworkName) -> std::result::Result<(), EntityIdError> {
        for transfer in &self.hbar_transfers {
            transfer.account_id.validate_checksum(network)?;
        }
        for list in &self.token_transfers {
            list.token_id.validate_checksum(network)?;
            for transfer in &list.transfers {
                transfer.account_id.validate_checksum(network)?;
            }
        }
        Ok(())
    }
}

impl Transaction<TransferTransactionData> {
    /// Adds `amount` to `account_id`'s hbar movement. Repeated calls for one
    /// account accumulate.
    pub fn hbar_transfer(&mut self, account_id: AccountId, amount: Hbar) -> Result<&mut Self> {
        let data = self.data_mut()?;
        match data
            .hbar_transfers
            .iter_mut()
            .find(|t| t.account_id == account_id)
        {
            Some(existing) => {
                existing.amount = existing
                    .amount
                    .checked_add(amount)
                    .ok_or_else(|| Error::AmountOverflow(account_id.clone()))?;
            }
            None => data.hbar_transfers.push(HbarTransfer { account_id, amount }),
        }
        Ok(self)
    }

    /// Adds `amount` of `token_id` to `account_id`'s movement. Transfers are
    /// grouped per token, tokens kept in the order first seen.
    pub fn token_transfer(
        &mut self,
        token_id: TokenId,
        account_id: AccountId,
        amount: i64,
    ) -> Result<&mut Self> {
        let data = self.data_mut()?;
        let index = match data.token_transfers.iter().position(|l| l.token_id == token_id) {
            Some(index) => index,
            None => {
                data.token_transfers.push(TokenTransferList {
                    token_id,
                    transfers: Vec::new(),
                });
                data.token_transfers.len() - 1
            }
        };

        let transfers = &mut data.token_transfers[index].transfers;
        match transfers.iter_mut().find(|t| t.account_id == account_id) {
            Some(existing) => {
                existing.amount = existing
                    .amount
                    .checked_add(amount)
                    .ok_or_else(|| Error::AmountOverflow(account_id.clone()))?;
            }
            None => transfers.push(TokenTransfer { account_id, amount }),
        }
        Ok(self)
    }

    pub fn get_hbar_transfers(&self) -> HashMap<AccountId, Hbar> {
        self.data()
            .hbar_transfers
            .iter()
            .map(|t| (t.account_id.clone(), t.amount))
            .collect()
    }

    pub fn get_token_transfers(&self) -> HashMap<TokenId, HashMap<AccountId, i64>> {
        self.data()
            .token_transfers
            .iter()
            .map(|list| {
                let transfers = list
                    .transfers
                    .iter()
                    .map(|t| (t.account_id.clone(), t.amount))
                    .collect();
                (list.token_id.clone(), transfers)
            })
            .collect()
    }
}
