//! # Queries
//!
//! Read-only requests. They go through the same execution engine as
//! transactions (checksum validation, node failover, backoff) but have no
//! freeze step and nothing to sign.
//!
//! A query type is a [`QueryData`] implementation wrapped in [`Query<D>`],
//! which adds the node pinning every query shares.

pub mod receipt;

use crate::entity::{AccountId, EntityIdError, NetworkName, ValidateChecksums};
use crate::error::Result;
use crate::network::execute::{self, Execute, ExecuteOptions, Outcome};
use crate::network::wire::{WireRequest, WireResponse};
use crate::network::Client;
use crate::transaction::TransactionId;

pub use receipt::{TransactionReceipt, TransactionReceiptQuery, TransactionReceiptQueryData};

/// The query-specific half of a query.
pub trait QueryData: ValidateChecksums {
    type Response;

    fn to_request(&self) -> Result<WireRequest>;

    /// The transaction the query is about, if any. Used for error context.
    fn transaction_id(&self) -> Option<&TransactionId> {
        None
    }

    /// Decides whether a node's answer is final.
    fn classify(&self, response: &WireResponse) -> Outcome;

    fn map_response(&self, response: WireResponse) -> Result<Self::Response>;
}

/// A query with payload `D`.
#[derive(Debug, Clone, Default)]
pub struct Query<D> {
    node_account_ids: Option<Vec<AccountId>>,
    data: D,
}

impl<D: QueryData + Default> Query<D> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: QueryData> Query<D> {
    pub fn with_data(data: D) -> Self {
        Self {
            node_account_ids: None,
            data,
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    /// Restricts the query to these nodes. An empty list unpins.
    pub fn node_account_ids(&mut self, ids: impl IntoIterator<Item = AccountId>) -> &mut Self {
        let ids: Vec<_> = ids.into_iter().collect();
        self.node_account_ids = (!ids.is_empty()).then_some(ids);
        self
    }

    pub fn get_node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    pub fn execute(&self, client: &Client) -> Result<D::Response> {
        self.execute_with(client, &ExecuteOptions::default())
    }

    pub fn execute_with(&self, client: &Client, options: &ExecuteOptions) -> Result<D::Response> {
        execute::execute(client, self, options)
    }
}

impl<D: QueryData> ValidateChecksums for Query<D> {
    fn validate_checksums(&self, network: NetworkName) -> std::result::Result<(), EntityIdError> {
        if let Some(ids) = &self.node_account_ids {
            ids.validate_checksums(network)?;
        }
        self.data.validate_checksums(network)
    }
}

impl<D: QueryData> Execute for Query<D> {
    type Context = ();
    type Response = D::Response;

    fn pinned_node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    fn request_transaction_id(&self) -> Option<&TransactionId> {
        self.data.transaction_id()
    }

    fn make_request(&self, _node_account_id: &AccountId) -> Result<(WireRequest, ())> {
        Ok((self.data.to_request()?, ()))
    }

    fn classify(&self, response: &WireResponse) -> Outcome {
        self.data.classify(response)
    }

    fn map_response(&self, response: WireResponse, _: &AccountId, _: ()) -> Result<D::Response> {
        self.data.map_response(response)
    }
}
