//! # Client
//!
//! The [`Client`] is the context every freeze and execute call runs
//! against. It holds:
//!
//! - the node list and a lazily filled [`ChannelPool`] to reach them
//! - the [`NetworkName`] entity checksums are validated against
//! - the operator: the default payer account and the key that signs for it
//! - retry and timeout settings for the execution engine
//!
//! Nothing here is global. Two clients pointed at two networks coexist in
//! one process without interfering.
//!
//! ## Configuration
//!
//! A client can be assembled in code, or loaded from JSON:
//!
//! ```json
//! {
//!   "network": { "127.0.0.1:50211": "0.0.3", "127.0.0.1:50212": "0.0.4" },
//!   "network_name": "testnet",
//!   "operator": { "account_id": "0.0.1001", "private_key": "302e0201..." },
//!   "max_attempts": 5,
//!   "request_timeout_ms": 30000
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::channel::{ChannelPool, Connector, TcpConnector};
use super::node::Node;
use crate::config::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF,
    DEFAULT_MAX_NODES_PER_TRANSACTION, DEFAULT_MIN_BACKOFF, DEFAULT_REQUEST_TIMEOUT,
};
use crate::crypto::{PrivateKey, PublicKey};
use crate::entity::{AccountId, NetworkName};
use crate::error::{Error, Result};
use crate::transaction::Hbar;

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// The account a client pays with by default, and its signing key.
#[derive(Debug, Clone)]
pub struct Operator {
    pub account_id: AccountId,
    pub signer: PrivateKey,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Engine knobs. Snapshotted at the start of every request so a concurrent
/// setter never changes the rules halfway through a retry loop.
#[derive(Debug, Clone)]
pub(crate) struct ClientSettings {
    pub max_attempts: usize,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub request_timeout: Duration,
    pub attempt_timeout: Duration,
    pub max_nodes_per_transaction: usize,
    pub default_max_transaction_fee: Option<Hbar>,
    pub auto_validate_checksums: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_nodes_per_transaction: DEFAULT_MAX_NODES_PER_TRANSACTION,
            default_max_transaction_fee: None,
            auto_validate_checksums: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// JSON shape accepted by [`Client::from_config`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Node address → node account ID.
    pub network: HashMap<String, AccountId>,
    #[serde(default)]
    pub network_name: Option<NetworkName>,
    #[serde(default)]
    pub operator: Option<OperatorConfig>,
    #[serde(default)]
    pub max_attempts: Option<usize>,
    #[serde(default)]
    pub min_backoff_ms: Option<u64>,
    #[serde(default)]
    pub max_backoff_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub attempt_timeout_ms: Option<u64>,
    #[serde(default)]
    pub auto_validate_checksums: Option<bool>,
}

/// Operator entry of a [`ClientConfig`]. The key is any string
/// [`PrivateKey::from_str`](std::str::FromStr) accepts.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorConfig {
    pub account_id: AccountId,
    pub private_key: String,
}

impl std::fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("account_id", &self.account_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Connection context for transactions and queries.
///
/// Cheap to share by reference across threads; every setter takes `&self`.
pub struct Client {
    network: RwLock<Vec<Arc<Node>>>,
    pool: ChannelPool,
    network_name: RwLock<Option<NetworkName>>,
    operator: RwLock<Option<Arc<Operator>>>,
    settings: RwLock<ClientSettings>,
}

impl Client {
    /// A client over plain TCP for the given `address → node account` map.
    pub fn for_network(network: HashMap<String, AccountId>) -> Self {
        Self::with_connector(network, Arc::new(TcpConnector))
    }

    /// A client that opens node channels through `connector`.
    pub fn with_connector(network: HashMap<String, AccountId>, connector: Arc<dyn Connector>) -> Self {
        let mut nodes: Vec<_> = network
            .into_iter()
            .map(|(address, account_id)| Arc::new(Node::new(account_id, address)))
            .collect();
        // Stable order so round-robin is reproducible.
        nodes.sort_by(|a, b| {
            (a.account_id(), a.address()).cmp(&(b.account_id(), b.address()))
        });

        Self {
            network: RwLock::new(nodes),
            pool: ChannelPool::new(connector, DEFAULT_CONNECT_TIMEOUT),
            network_name: RwLock::new(None),
            operator: RwLock::new(None),
            settings: RwLock::new(ClientSettings::default()),
        }
    }

    /// Loads a client from a JSON [`ClientConfig`].
    pub fn from_config(json: &str) -> Result<Self> {
        let config: ClientConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        Self::with_config(config, Arc::new(TcpConnector))
    }

    /// Reads and loads a JSON config file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_config(&json)
    }

    /// Builds a client from an already parsed config.
    pub fn with_config(config: ClientConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        if config.network.is_empty() {
            return Err(Error::Config("network must list at least one node".into()));
        }

        let operator = config
            .operator
            .map(|op| -> Result<_> { Ok((op.account_id, op.private_key.parse::<PrivateKey>()?)) })
            .transpose()?;

        let client = Self::with_connector(config.network, connector);
        if let Some(name) = config.network_name {
            client.set_network_name(name);
        }
        if let Some((account_id, key)) = operator {
            client.set_operator(account_id, key);
        }

        {
            let mut settings = client.settings.write();
            if let Some(n) = config.max_attempts {
                settings.max_attempts = n.max(1);
            }
            if let Some(ms) = config.min_backoff_ms {
                settings.min_backoff = Duration::from_millis(ms);
            }
            if let Some(ms) = config.max_backoff_ms {
                settings.max_backoff = Duration::from_millis(ms);
            }
            if let Some(ms) = config.request_timeout_ms {
                settings.request_timeout = Duration::from_millis(ms);
            }
            if let Some(ms) = config.attempt_timeout_ms {
                settings.attempt_timeout = Duration::from_millis(ms);
            }
            if let Some(validate) = config.auto_validate_checksums {
                settings.auto_validate_checksums = validate;
            }
            if settings.min_backoff > settings.max_backoff {
                return Err(Error::Config("min_backoff_ms exceeds max_backoff_ms".into()));
            }
        }

        info!(
            nodes = client.network.read().len(),
            network = ?client.network_name(),
            "client configured"
        );
        Ok(client)
    }

    // -- Operator ----------------------------------------------------------

    /// Sets the default payer and the key that signs for it.
    pub fn set_operator(&self, account_id: AccountId, signer: PrivateKey) {
        *self.operator.write() = Some(Arc::new(Operator { account_id, signer }));
    }

    pub fn operator_account_id(&self) -> Option<AccountId> {
        self.operator.read().as_ref().map(|op| op.account_id.clone())
    }

    pub fn operator_public_key(&self) -> Option<PublicKey> {
        self.operator.read().as_ref().map(|op| op.signer.public_key())
    }

    pub(crate) fn operator(&self) -> Option<Arc<Operator>> {
        self.operator.read().clone()
    }

    // -- Network -----------------------------------------------------------

    /// The network entity checksums are validated against. `None` skips
    /// validation.
    pub fn network_name(&self) -> Option<NetworkName> {
        *self.network_name.read()
    }

    pub fn set_network_name(&self, name: NetworkName) {
        *self.network_name.write() = Some(name);
    }

    /// Node account IDs known to this client, in selection order.
    pub fn node_account_ids(&self) -> Vec<AccountId> {
        self.network
            .read()
            .iter()
            .map(|node| node.account_id().clone())
            .collect()
    }

    /// Up to `count` nodes, healthy ones first in random order, topped up
    /// with benched ones if there aren't enough healthy nodes.
    pub(crate) fn sample_nodes(&self, count: usize) -> Vec<Arc<Node>> {
        let network = self.network.read();
        let (mut healthy, mut benched): (Vec<_>, Vec<_>) =
            network.iter().cloned().partition(|node| node.is_healthy());

        let mut rng = rand::thread_rng();
        healthy.shuffle(&mut rng);
        benched.shuffle(&mut rng);

        healthy.into_iter().chain(benched).take(count).collect()
    }

    /// Resolves explicit node account IDs against the network.
    pub(crate) fn nodes_for(&self, ids: &[AccountId]) -> Result<Vec<Arc<Node>>> {
        let network = self.network.read();
        ids.iter()
            .map(|id| {
                network
                    .iter()
                    .find(|node| node.account_id() == id)
                    .cloned()
                    .ok_or_else(|| Error::Config(format!("node {id} is not in the client network")))
            })
            .collect()
    }

    pub(crate) fn pool(&self) -> &ChannelPool {
        &self.pool
    }

    // -- Settings ----------------------------------------------------------

    pub(crate) fn settings(&self) -> ClientSettings {
        self.settings.read().clone()
    }

    /// Attempts per request before `MaxAttemptsExceeded`. At least 1.
    pub fn set_max_attempts(&self, attempts: usize) {
        self.settings.write().max_attempts = attempts.max(1);
    }

    pub fn max_attempts(&self) -> usize {
        self.settings.read().max_attempts
    }

    /// Backoff bounds. `min` is clamped to `max`.
    pub fn set_backoff(&self, min: Duration, max: Duration) {
        let mut settings = self.settings.write();
        settings.min_backoff = min.min(max);
        settings.max_backoff = max;
    }

    pub fn min_backoff(&self) -> Duration {
        self.settings.read().min_backoff
    }

    pub fn max_backoff(&self) -> Duration {
        self.settings.read().max_backoff
    }

    /// Wall-clock budget for one request, retries included.
    pub fn set_request_timeout(&self, timeout: Duration) {
        self.settings.write().request_timeout = timeout;
    }

    pub fn request_timeout(&self) -> Duration {
        self.settings.read().request_timeout
    }

    /// Budget for one round trip to one node.
    pub fn set_attempt_timeout(&self, timeout: Duration) {
        self.settings.write().attempt_timeout = timeout;
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.settings.read().attempt_timeout
    }

    /// How many nodes a transaction frozen against this client is prepared
    /// for.
    pub fn set_max_nodes_per_transaction(&self, count: usize) {
        self.settings.write().max_nodes_per_transaction = count.max(1);
    }

    pub fn max_nodes_per_transaction(&self) -> usize {
        self.settings.read().max_nodes_per_transaction
    }

    /// Overrides every transaction type's default max fee.
    pub fn set_default_max_transaction_fee(&self, fee: Hbar) {
        self.settings.write().default_max_transaction_fee = Some(fee);
    }

    pub fn default_max_transaction_fee(&self) -> Option<Hbar> {
        self.settings.read().default_max_transaction_fee
    }

    /// Whether entity checksums are checked before dispatch. On by default.
    pub fn set_auto_validate_checksums(&self, validate: bool) {
        self.settings.write().auto_validate_checksums = validate;
    }

    pub fn auto_validate_checksums(&self) -> bool {
        self.settings.read().auto_validate_checksums
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("nodes", &self.node_account_ids())
            .field("network_name", &self.network_name())
            .field("operator", &self.operator_account_id())
            .field("settings", &*self.settings.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn three_nodes() -> HashMap<String, AccountId> {
        (3..6)
            .map(|n| (format!("127.0.0.1:{}", 50208 + n), AccountId::from_num(n)))
            .collect()
    }

    #[test]
    fn nodes_are_ordered_by_account() {
        let client = Client::for_network(three_nodes());
        assert_eq!(
            client.node_account_ids(),
            [3, 4, 5].map(AccountId::from_num).to_vec()
        );
    }

    #[test]
    fn sampling_prefers_healthy_nodes() {
        let client = Client::for_network(three_nodes());
        for node in client.network.read().iter() {
            if node.account_id().num != 4 {
                node.mark_unhealthy();
            }
        }

        for _ in 0..10 {
            let sample = client.sample_nodes(1);
            assert_eq!(sample[0].account_id(), &AccountId::from_num(4));
        }
        assert_eq!(client.sample_nodes(10).len(), 3);
    }

    #[test]
    fn unknown_explicit_node_is_rejected() {
        let client = Client::for_network(three_nodes());
        assert!(client.nodes_for(&[AccountId::from_num(3)]).is_ok());
        assert!(matches!(
            client.nodes_for(&[AccountId::from_num(99)]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn config_json_sets_everything() {
        let key = PrivateKey::generate_ed25519();
        let json = format!(
            r#"{{
                "network": {{ "127.0.0.1:50211": "0.0.3" }},
                "network_name": "testnet",
                "operator": {{ "account_id": "0.0.1001", "private_key": "{key}" }},
                "max_attempts": 4,
                "min_backoff_ms": 10,
                "max_backoff_ms": 100
            }}"#
        );
        let client = Client::from_config(&json).unwrap();

        assert_eq!(client.network_name(), Some(NetworkName::Testnet));
        assert_eq!(client.operator_account_id(), Some(AccountId::from_num(1001)));
        assert_eq!(client.operator_public_key(), Some(key.public_key()));
        assert_eq!(client.max_attempts(), 4);
        assert_eq!(client.min_backoff(), Duration::from_millis(10));
        assert_eq!(client.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn config_rejects_bad_input() {
        assert!(matches!(Client::from_config("{}"), Err(Error::Config(_))));
        assert!(matches!(
            Client::from_config(r#"{"network": {}}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Client::from_config(r#"{"network": {"a:1": "0.0.3"}, "surprise": 1}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Client::from_config(
                r#"{"network": {"a:1": "0.0.3"}, "operator": {"account_id": "0.0.2", "private_key": "zz"}}"#
            ),
            Err(Error::Key(_))
        ));
    }

    #[test]
    fn config_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"network": {{"127.0.0.1:50211": "0.0.3"}}}}"#).unwrap();
        let client = Client::from_config_file(file.path()).unwrap();
        assert_eq!(client.node_account_ids(), [AccountId::from_num(3)]);
        assert!(client.operator_account_id().is_none());
    }

    #[test]
    fn settings_are_clamped() {
        let client = Client::for_network(three_nodes());
        client.set_max_attempts(0);
        assert_eq!(client.max_attempts(), 1);
        client.set_backoff(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(client.min_backoff(), Duration::from_secs(1));
    }
}
