//! The transaction lifecycle shared by every operation type.
//!
//! [`Transaction<D>`] carries the fields every transaction has (ID, node
//! list, fee, memo, validity window) plus an operation payload `D`. It moves
//! through three states:
//!
//! ```text
//! Mutable ──freeze──► Frozen ──execute (success)──► Executed
//!    │                  ▲ │
//!    └──sign (auto)─────┘ └──sign── (appends signatures, stays Frozen)
//! ```
//!
//! Freezing fixes the body and serializes one copy per candidate node. From
//! then on only signatures can be added. A failed freeze or sign leaves the
//! transaction exactly as it was.

use std::collections::HashMap;
use std::time::Duration;

use super::response::TransactionResponse;
use super::types::{Hbar, TransactionId};
use crate::config::{DEFAULT_TRANSACTION_VALID_DURATION, MAX_MEMO_BYTES};
use crate::crypto::{sha384, PrivateKey, PublicKey};
use crate::entity::{AccountId, EntityIdError, NetworkName, ValidateChecksums};
use crate::error::{Error, Result};
use crate::network::execute::{self, Execute, ExecuteOptions, Outcome};
use crate::network::wire::{
    self, SignedTransaction, Status, TransactionBody, TransactionBodyData, TransactionList,
    WireRequest, WireResponse,
};
use crate::network::Client;
use crate::transaction::signing::SignatureMap;

// ---------------------------------------------------------------------------
// TransactionData
// ---------------------------------------------------------------------------

/// The operation-specific half of a transaction.
pub trait TransactionData: Clone + ValidateChecksums {
    /// Max fee used when neither the transaction nor the client sets one.
    fn default_max_transaction_fee(&self) -> Hbar;

    /// The payload as it appears in the wire body.
    fn to_body_data(&self) -> TransactionBodyData;
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Mutable,
    Frozen,
    Executed,
}

/// One candidate node's copy of a frozen transaction.
#[derive(Debug, Clone)]
pub struct NodeTransaction {
    pub node_account_id: AccountId,
    pub body_bytes: Vec<u8>,
    pub sig_map: SignatureMap,
}

impl NodeTransaction {
    fn to_signed(&self) -> SignedTransaction {
        SignedTransaction {
            body_bytes: self.body_bytes.clone(),
            sig_map: self.sig_map.clone(),
        }
    }
}

/// A transaction with operation payload `D`.
///
/// Setters return `Result<&mut Self>` so they chain with `?`, and fail with
/// [`Error::TransactionIsFrozen`] once the transaction is frozen.
#[derive(Debug, Clone)]
pub struct Transaction<D> {
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    max_transaction_fee: Option<Hbar>,
    memo: String,
    valid_duration: Duration,
    data: D,
    state: State,
    /// Index-aligned with `node_account_ids` once frozen; empty before.
    nodes: Vec<NodeTransaction>,
}

impl<D: TransactionData + Default> Default for Transaction<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: TransactionData + Default> Transaction<D> {
    pub fn new() -> Self {
        Self::with_data(D::default())
    }
}

impl<D: TransactionData> Transaction<D> {
    pub fn with_data(data: D) -> Self {
        Self {
            transaction_id: None,
            node_account_ids: None,
            max_transaction_fee: None,
            memo: String::new(),
            valid_duration: DEFAULT_TRANSACTION_VALID_DURATION,
            data,
            state: State::Mutable,
            nodes: Vec::new(),
        }
    }

    fn require_mutable(&self) -> Result<()> {
        match self.state {
            State::Mutable => Ok(()),
            State::Frozen | State::Executed => Err(Error::TransactionIsFrozen),
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> Result<&mut D> {
        self.require_mutable()?;
        Ok(&mut self.data)
    }

    // -- Setters -----------------------------------------------------------

    /// Pins the transaction ID instead of generating one at freeze time.
    pub fn transaction_id(&mut self, id: TransactionId) -> Result<&mut Self> {
        self.require_mutable()?;
        self.transaction_id = Some(id);
        Ok(self)
    }

    /// Pins the candidate nodes. An empty list unpins.
    pub fn node_account_ids(
        &mut self,
        ids: impl IntoIterator<Item = AccountId>,
    ) -> Result<&mut Self> {
        self.require_mutable()?;
        let ids: Vec<_> = ids.into_iter().collect();
        self.node_account_ids = (!ids.is_empty()).then_some(ids);
        Ok(self)
    }

    pub fn max_transaction_fee(&mut self, fee: Hbar) -> Result<&mut Self> {
        self.require_mutable()?;
        self.max_transaction_fee = Some(fee);
        Ok(self)
    }

    /// Sets the memo. At most [`MAX_MEMO_BYTES`] bytes of UTF-8.
    pub fn transaction_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.require_mutable()?;
        let memo = memo.into();
        if memo.len() > MAX_MEMO_BYTES {
            return Err(Error::MemoTooLong {
                len: memo.len(),
                max: MAX_MEMO_BYTES,
            });
        }
        self.memo = memo;
        Ok(self)
    }

    pub fn transaction_valid_duration(&mut self, duration: Duration) -> Result<&mut Self> {
        self.require_mutable()?;
        self.valid_duration = duration;
        Ok(self)
    }

    // -- Getters -----------------------------------------------------------

    pub fn get_transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    pub fn get_node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    pub fn get_max_transaction_fee(&self) -> Option<Hbar> {
        self.max_transaction_fee
    }

    pub fn get_transaction_memo(&self) -> &str {
        &self.memo
    }

    pub fn get_transaction_valid_duration(&self) -> Duration {
        self.valid_duration
    }

    /// True once frozen, including after execution.
    pub fn is_frozen(&self) -> bool {
        self.state != State::Mutable
    }

    /// The per-node copies. Empty until frozen.
    pub fn node_transactions(&self) -> &[NodeTransaction] {
        &self.nodes
    }

    // -- Freeze ------------------------------------------------------------

    /// Freezes using only what is set on the transaction. Fails unless both
    /// the transaction ID and the node list are pinned.
    pub fn freeze(&mut self) -> Result<&mut Self> {
        self.freeze_inner(None)
    }

    /// Freezes, filling unset fields from `client`: the payer comes from the
    /// operator, nodes are sampled from the network, and the fee falls back
    /// to the client's override.
    ///
    /// Calling this on a frozen transaction does nothing.
    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self> {
        self.freeze_inner(Some(client))
    }

    fn freeze_inner(&mut self, client: Option<&Client>) -> Result<&mut Self> {
        match self.state {
            State::Frozen => return Ok(self),
            State::Executed => return Err(Error::TransactionAlreadyExecuted),
            State::Mutable => {}
        }

        // Resolve everything first, commit at the end.
        let transaction_id = match (&self.transaction_id, client) {
            (Some(id), _) => id.clone(),
            (None, Some(client)) => client
                .operator_account_id()
                .map(TransactionId::generate)
                .ok_or(Error::NoPayerAccountOrTransactionId)?,
            (None, None) => return Err(Error::NoPayerAccountOrTransactionId),
        };

        let node_account_ids = match (&self.node_account_ids, client) {
            (Some(ids), _) => ids.clone(),
            (None, Some(client)) => {
                let sampled: Vec<_> = client
                    .sample_nodes(client.max_nodes_per_transaction())
                    .iter()
                    .map(|node| node.account_id().clone())
                    .collect();
                if sampled.is_empty() {
                    return Err(Error::NoNodes);
                }
                sampled
            }
            (None, None) => return Err(Error::FreezeUnsetNodeAccountIds),
        };

        let max_transaction_fee = self
            .max_transaction_fee
            .or_else(|| client.and_then(Client::default_max_transaction_fee))
            .unwrap_or_else(|| self.data.default_max_transaction_fee());

        let body_data = self.data.to_body_data();
        let nodes = node_account_ids
            .iter()
            .map(|node_account_id| {
                let body = TransactionBody {
                    transaction_id: transaction_id.clone(),
                    node_account_id: node_account_id.clone(),
                    transaction_fee: max_transaction_fee.to_tinybars(),
                    transaction_valid_duration: self.valid_duration.as_secs(),
                    memo: self.memo.clone(),
                    data: body_data.clone(),
                };
                Ok(NodeTransaction {
                    node_account_id: node_account_id.clone(),
                    body_bytes: wire::encode(&body)?,
                    sig_map: SignatureMap::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.transaction_id = Some(transaction_id);
        self.node_account_ids = Some(node_account_ids);
        self.max_transaction_fee = Some(max_transaction_fee);
        self.nodes = nodes;
        self.state = State::Frozen;
        Ok(self)
    }

    // -- Sign --------------------------------------------------------------

    /// Signs every node copy with `key`, freezing first if needed.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<&mut Self> {
        self.sign_with(key.public_key(), |bytes| key.sign(bytes))
    }

    /// Signs with an external signer: a function from body bytes to
    /// signature bytes, for keys that live in an HSM or another process.
    ///
    /// A key that has already signed is skipped.
    pub fn sign_with<F>(&mut self, public_key: PublicKey, signer: F) -> Result<&mut Self>
    where
        F: Fn(&[u8]) -> Vec<u8>,
    {
        match self.state {
            State::Executed => return Err(Error::TransactionAlreadyExecuted),
            State::Mutable => {
                self.freeze()?;
            }
            State::Frozen => {}
        }

        for node in &mut self.nodes {
            if !node.sig_map.contains(&public_key) {
                let signature = signer(&node.body_bytes);
                node.sig_map.push(&public_key, signature);
            }
        }
        Ok(self)
    }

    /// Signs with the client's operator key, freezing against the client
    /// first if needed.
    pub fn sign_with_operator(&mut self, client: &Client) -> Result<&mut Self> {
        let operator = client
            .operator()
            .ok_or_else(|| Error::Config("client has no operator".into()))?;
        if self.state == State::Mutable {
            self.freeze_with(client)?;
        }
        self.sign(&operator.signer)
    }

    /// Every signature, per node, per signer.
    pub fn signatures(&self) -> HashMap<AccountId, HashMap<PublicKey, Vec<u8>>> {
        self.nodes
            .iter()
            .map(|node| {
                let signers = node
                    .sig_map
                    .iter()
                    .filter_map(|pair| Some((pair.signer()?, pair.signature.as_bytes().to_vec())))
                    .collect();
                (node.node_account_id.clone(), signers)
            })
            .collect()
    }

    /// The transaction as a list of per-node signed copies, for handing to
    /// another party to co-sign or submit.
    ///
    /// A mutable transaction is frozen on a copy first, so it needs a pinned
    /// ID and node list.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let frozen;
        let nodes = if self.state == State::Mutable {
            let mut copy = self.clone();
            copy.freeze()?;
            frozen = copy;
            &frozen.nodes
        } else {
            &self.nodes
        };

        wire::encode(&TransactionList {
            transactions: nodes.iter().map(NodeTransaction::to_signed).collect(),
        })
    }

    // -- Execute -----------------------------------------------------------

    /// Submits the transaction. See [`execute_with`](Self::execute_with).
    pub fn execute(&mut self, client: &Client) -> Result<TransactionResponse> {
        self.execute_with(client, &ExecuteOptions::default())
    }

    /// Freezes against `client` if needed, adds the operator's signature
    /// when the operator is the payer, and submits.
    ///
    /// On success the transaction becomes terminal: any further freeze,
    /// sign or execute fails. On failure it stays frozen, signatures
    /// intact, and can be executed again.
    pub fn execute_with(
        &mut self,
        client: &Client,
        options: &ExecuteOptions,
    ) -> Result<TransactionResponse> {
        if self.state == State::Executed {
            return Err(Error::TransactionAlreadyExecuted);
        }
        self.freeze_with(client)?;

        if let Some(operator) = client.operator() {
            let payer = self.transaction_id.as_ref().map(|id| &id.account_id);
            if payer == Some(&operator.account_id) {
                self.sign(&operator.signer)?;
            }
        }

        let response = execute::execute(client, &*self, options)?;
        self.state = State::Executed;
        Ok(response)
    }
}

impl<D: TransactionData> ValidateChecksums for Transaction<D> {
    fn validate_checksums(&self, network: NetworkName) -> std::result::Result<(), EntityIdError> {
        self.transaction_id.validate_checksums(network)?;
        if let Some(ids) = &self.node_account_ids {
            ids.validate_checksums(network)?;
        }
        self.data.validate_checksums(network)
    }
}

impl<D: TransactionData> Execute for Transaction<D> {
    /// SHA-384 of the signed transaction sent to the node.
    type Context = Vec<u8>;
    type Response = TransactionResponse;

    fn pinned_node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    fn request_transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    fn make_request(&self, node_account_id: &AccountId) -> Result<(WireRequest, Vec<u8>)> {
        let node = self
            .nodes
            .iter()
            .find(|node| &node.node_account_id == node_account_id)
            .ok_or_else(|| {
                Error::Config(format!("transaction was not frozen for node {node_account_id}"))
            })?;

        let signed = node.to_signed();
        let hash = sha384(&wire::encode(&signed)?).to_vec();
        Ok((WireRequest::SubmitTransaction(signed), hash))
    }

    fn classify(&self, response: &WireResponse) -> Outcome {
        match response.status {
            Status::Ok => Outcome::Success,
            Status::Busy | Status::PlatformTransactionNotCreated | Status::PlatformNotActive => {
                Outcome::Retry(response.status)
            }
            other => Outcome::Permanent(other),
        }
    }

    fn map_response(
        &self,
        _response: WireResponse,
        node_account_id: &AccountId,
        transaction_hash: Vec<u8>,
    ) -> Result<TransactionResponse> {
        Ok(TransactionResponse {
            transaction_id: self
                .transaction_id
                .clone()
                .ok_or(Error::NoPayerAccountOrTransactionId)?,
            node_id: node_account_id.clone(),
            transaction_hash,
        })
    }
}

impl PrivateKey {
    /// Adds this key's signature to `transaction`.
    pub fn sign_transaction<D: TransactionData>(&self, transaction: &mut Transaction<D>) -> Result<()> {
        transaction.sign(self)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
