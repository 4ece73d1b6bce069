//! End-to-end tests for the ledger SDK.
//!
//! These drive the public API the way an application would: build a client,
//! set an operator, build a transfer, execute it, fetch the receipt. The
//! nodes on the other end are stubs that decode every request off the wire,
//! check every signature, and answer from a script, so each test can stage
//! exactly the failures it wants to see survived (or not).
//!
//! One test goes over real TCP to a listener on localhost, to prove the
//! framing and the pool work outside the stub.
//!
//! Each test builds its own client and its own stub network. Nothing is
//! shared between tests.

use std::collections::{HashMap, VecDeque};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use ledger_sdk::crypto::sha384;
use ledger_sdk::network::channel::{read_frame, write_frame};
use ledger_sdk::network::wire::{
    self, ResponseBody, SignedTransaction, TransactionBody, WireRequest, WireResponse,
};
use ledger_sdk::network::{Channel, Connector, TransportError};
use ledger_sdk::{
    AccountId, CancellationToken, Client, EntityIdError, Error, ErrorKind, ExecuteOptions, Hbar,
    KeystoreError, KeystoreParams, Mnemonic, NetworkName, PrivateKey, Status, TransactionId,
    TransactionReceipt, TransferTransaction,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// What a stub node does with the next request of a given kind.
#[derive(Debug, Clone)]
enum Reply {
    /// Answer with this response.
    Respond(WireResponse),
    /// Drop the connection.
    Hangup,
}

impl Reply {
    fn status(status: Status) -> Self {
        Self::Respond(WireResponse::status(status))
    }

    fn receipt(status: Status) -> Self {
        Self::Respond(WireResponse {
            status: Status::Ok,
            body: ResponseBody::Receipt(TransactionReceipt::new(status)),
        })
    }
}

/// A submission as the node saw it.
#[derive(Debug, Clone)]
struct Submission {
    body: TransactionBody,
    signed: SignedTransaction,
    signatures_valid: bool,
}

/// Shared state behind every stub channel in one test.
///
/// Submissions default to `OK` and receipt lookups to `SUCCESS` once their
/// scripts run dry.
#[derive(Default)]
struct StubNetwork {
    submit_script: Mutex<VecDeque<Reply>>,
    receipt_script: Mutex<VecDeque<Reply>>,
    submissions: Mutex<Vec<Submission>>,
    calls: AtomicUsize,
    connects: AtomicUsize,
}

impl StubNetwork {
    fn script_submits(&self, replies: impl IntoIterator<Item = Reply>) {
        self.submit_script.lock().extend(replies);
    }

    fn script_receipts(&self, replies: impl IntoIterator<Item = Reply>) {
        self.receipt_script.lock().extend(replies);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    fn handle(&self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let request: WireRequest = wire::decode(request).expect("client sent garbage");
        let reply = match request {
            WireRequest::SubmitTransaction(signed) => {
                let body: TransactionBody =
                    wire::decode(&signed.body_bytes).expect("body is not a TransactionBody");
                let signatures_valid = signed.sig_map.verify_all(&signed.body_bytes);
                self.submissions.lock().push(Submission {
                    body,
                    signed,
                    signatures_valid,
                });
                self.submit_script
                    .lock()
                    .pop_front()
                    .unwrap_or_else(|| Reply::status(Status::Ok))
            }
            WireRequest::GetTransactionReceipt { .. } => self
                .receipt_script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Reply::receipt(Status::Success)),
        };

        match reply {
            Reply::Respond(response) => Ok(wire::encode(&response).expect("encodable")),
            Reply::Hangup => Err(TransportError::Closed),
        }
    }
}

struct StubChannel(Arc<StubNetwork>);

impl Channel for StubChannel {
    fn send(&self, request: &[u8], _timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.0.handle(request)
    }
}

struct StubConnector(Arc<StubNetwork>);

impl Connector for StubConnector {
    fn connect(&self, _address: &str, _timeout: Duration) -> Result<Arc<dyn Channel>, TransportError> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubChannel(Arc::clone(&self.0))))
    }
}

fn node_ids() -> Vec<AccountId> {
    vec![AccountId::from_num(3), AccountId::from_num(4), AccountId::from_num(5)]
}

/// A three-node client on testnet with an Ed25519 operator paying from
/// 0.0.1001, and backoff short enough that retries don't slow the suite.
fn setup() -> (Client, Arc<StubNetwork>, PrivateKey) {
    let stub = Arc::new(StubNetwork::default());
    let network: HashMap<String, AccountId> = node_ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (format!("stub-{i}:50211"), id))
        .collect();

    let client = Client::with_connector(network, Arc::new(StubConnector(Arc::clone(&stub))));
    client.set_network_name(NetworkName::Testnet);
    client.set_backoff(Duration::from_millis(1), Duration::from_millis(4));

    let operator_key = PrivateKey::generate_ed25519();
    client.set_operator(operator(), operator_key.clone());
    (client, stub, operator_key)
}

fn operator() -> AccountId {
    AccountId::from_num(1001)
}

fn transfer(to: AccountId, tinybars: i64) -> TransferTransaction {
    let mut tx = TransferTransaction::new();
    tx.hbar_transfer(operator(), Hbar::from_tinybars(-tinybars))
        .unwrap()
        .hbar_transfer(to, Hbar::from_tinybars(tinybars))
        .unwrap();
    tx
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[test]
fn transfer_and_receipt_happy_path() {
    let (client, stub, operator_key) = setup();

    let mut tx = transfer(AccountId::from_num(2002), 500);
    let response = tx.execute(&client).unwrap();

    assert_eq!(response.transaction_id.account_id, operator());
    assert!(node_ids().contains(&response.node_id));

    let submissions = stub.submissions();
    assert_eq!(submissions.len(), 1);
    let sent = &submissions[0];
    assert!(sent.signatures_valid);
    assert!(sent.signed.sig_map.contains(&operator_key.public_key()));
    assert_eq!(sent.body.node_account_id, response.node_id);
    assert_eq!(sent.body.transaction_id, response.transaction_id);
    assert_eq!(
        response.transaction_hash,
        sha384(&wire::encode(&sent.signed).unwrap()).to_vec()
    );

    let receipt = response.get_receipt(&client).unwrap();
    assert_eq!(receipt.status, Status::Success);
    assert_eq!(stub.calls(), 2);
}

#[test]
fn transient_failures_are_retried_until_success() {
    let (client, stub, _) = setup();
    stub.script_submits([
        Reply::Hangup,
        Reply::status(Status::Busy),
        Reply::status(Status::PlatformTransactionNotCreated),
    ]);

    let mut tx = transfer(AccountId::from_num(2002), 10);
    let response = tx.execute(&client).unwrap();

    assert_eq!(stub.calls(), 4);
    assert!(stub.submissions().iter().all(|s| s.signatures_valid));
    // Every retry carries the same transaction ID.
    assert!(stub
        .submissions()
        .iter()
        .all(|s| s.body.transaction_id == response.transaction_id));
}

#[test]
fn permanent_rejection_fails_after_one_attempt() {
    let (client, stub, _) = setup();
    stub.script_submits([Reply::status(Status::InsufficientPayerBalance)]);

    let mut tx = transfer(AccountId::from_num(2002), 10);
    let err = tx.execute(&client).unwrap_err();

    assert_eq!(stub.calls(), 1);
    assert_eq!(err.kind(), ErrorKind::Protocol);
    match err {
        Error::Protocol {
            status,
            transaction_id,
            ..
        } => {
            assert_eq!(status, Status::InsufficientPayerBalance);
            assert_eq!(transaction_id.as_ref(), tx.get_transaction_id());
        }
        other => panic!("expected a protocol error, got {other:?}"),
    }

    // Still frozen and signed; a second try goes out unchanged.
    assert!(tx.is_frozen());
    let before = tx.signatures();
    tx.execute(&client).unwrap();
    assert_eq!(tx.signatures(), before);
    assert_eq!(stub.calls(), 2);
}

#[test]
fn attempt_budget_is_honored() {
    let (client, stub, _) = setup();
    client.set_max_attempts(3);
    stub.script_submits(std::iter::repeat(Reply::status(Status::Busy)).take(10));

    let mut tx = transfer(AccountId::from_num(2002), 10);
    let err = tx.execute(&client).unwrap_err();

    assert_eq!(stub.calls(), 3);
    assert_eq!(err.kind(), ErrorKind::Exhaustion);
    match err {
        Error::MaxAttemptsExceeded { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, Error::Protocol { status: Status::Busy, .. }));
        }
        other => panic!("expected MaxAttemptsExceeded, got {other:?}"),
    }
}

#[test]
fn pinned_node_is_the_only_one_contacted() {
    let (client, stub, _) = setup();

    let mut tx = transfer(AccountId::from_num(2002), 10);
    tx.node_account_ids([AccountId::from_num(4)]).unwrap();
    let response = tx.execute(&client).unwrap();

    assert_eq!(response.node_id, AccountId::from_num(4));
    assert_eq!(stub.submissions()[0].body.node_account_id, AccountId::from_num(4));
}

#[test]
fn unknown_pinned_node_is_a_config_error() {
    let (client, stub, _) = setup();

    let mut tx = transfer(AccountId::from_num(2002), 10);
    tx.node_account_ids([AccountId::from_num(99)]).unwrap();
    let err = tx.execute(&client).unwrap_err();

    assert!(matches!(err, Error::Config(_)), "{err:?}");
    assert_eq!(stub.calls(), 0);
}

// ---------------------------------------------------------------------------
// Checksums
// ---------------------------------------------------------------------------

#[test]
fn correct_checksum_goes_through() {
    let (client, stub, _) = setup();

    let mut tx = transfer("0.0.123-rmkyk".parse().unwrap(), 10);
    tx.execute(&client).unwrap();
    assert_eq!(stub.calls(), 1);
}

#[test]
fn checksum_for_another_network_never_reaches_a_node() {
    let (client, stub, _) = setup();

    // `ntjly` is 0.0.123 on previewnet; the client is on testnet.
    let mut tx = transfer("0.0.123-ntjly".parse().unwrap(), 10);
    let err = tx.execute(&client).unwrap_err();

    assert_eq!(stub.calls(), 0);
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(matches!(
        err,
        Error::EntityId(EntityIdError::ChecksumMismatch { .. })
    ));
    assert_eq!(
        err.to_string(),
        "network mismatch or wrong checksum given, given checksum: ntjly, \
         correct checksum rmkyk, network: testnet"
    );
}

#[test]
fn checksum_validation_can_be_switched_off() {
    let (client, stub, _) = setup();
    client.set_auto_validate_checksums(false);

    let mut tx = transfer("0.0.123-ntjly".parse().unwrap(), 10);
    tx.execute(&client).unwrap();
    assert_eq!(stub.calls(), 1);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn freeze_and_sign_are_idempotent() {
    let (client, _, _) = setup();
    let extra = PrivateKey::generate_ecdsa();

    let mut tx = transfer(AccountId::from_num(2002), 10);
    tx.freeze_with(&client).unwrap();
    let frozen_bytes = tx.to_bytes().unwrap();

    tx.freeze_with(&client).unwrap();
    assert_eq!(tx.to_bytes().unwrap(), frozen_bytes);

    tx.sign(&extra).unwrap();
    let once = tx.signatures();
    tx.sign(&extra).unwrap();
    assert_eq!(tx.signatures(), once);

    for per_node in once.values() {
        assert_eq!(per_node.len(), 1);
        assert!(per_node.contains_key(&extra.public_key()));
    }
}

#[test]
fn setters_fail_once_frozen() {
    let (client, _, _) = setup();

    let mut tx = transfer(AccountId::from_num(2002), 10);
    tx.freeze_with(&client).unwrap();

    assert!(matches!(
        tx.transaction_memo("late"),
        Err(Error::TransactionIsFrozen)
    ));
    assert!(matches!(
        tx.hbar_transfer(AccountId::from_num(7), Hbar::new(1)),
        Err(Error::TransactionIsFrozen)
    ));
    assert_eq!(tx.get_transaction_memo(), "");
}

#[test]
fn executed_transaction_is_terminal() {
    let (client, stub, _) = setup();

    let mut tx = transfer(AccountId::from_num(2002), 10);
    tx.execute(&client).unwrap();

    assert!(matches!(
        tx.execute(&client),
        Err(Error::TransactionAlreadyExecuted)
    ));
    assert!(matches!(
        tx.sign(&PrivateKey::generate_ed25519()),
        Err(Error::TransactionAlreadyExecuted)
    ));
    assert!(matches!(
        tx.freeze_with(&client),
        Err(Error::TransactionAlreadyExecuted)
    ));
    assert_eq!(stub.calls(), 1);
}

#[test]
fn operator_only_signs_when_paying() {
    let (client, stub, operator_key) = setup();
    let payer = AccountId::from_num(5005);
    let payer_key = PrivateKey::generate_ecdsa();

    let mut tx = TransferTransaction::new();
    tx.transaction_id(TransactionId::generate(payer.clone()))
        .unwrap()
        .hbar_transfer(payer, Hbar::new(-1))
        .unwrap()
        .hbar_transfer(AccountId::from_num(2002), Hbar::new(1))
        .unwrap();
    tx.freeze_with(&client).unwrap().sign(&payer_key).unwrap();
    tx.execute(&client).unwrap();

    let sent = &stub.submissions()[0];
    assert!(sent.signatures_valid);
    assert!(sent.signed.sig_map.contains(&payer_key.public_key()));
    assert!(!sent.signed.sig_map.contains(&operator_key.public_key()));
}

#[test]
fn transaction_without_payer_fails_to_freeze() {
    let stub = Arc::new(StubNetwork::default());
    let network = HashMap::from([("stub:50211".to_string(), AccountId::from_num(3))]);
    let client = Client::with_connector(network, Arc::new(StubConnector(Arc::clone(&stub))));

    let mut tx = transfer(AccountId::from_num(2002), 10);
    assert!(matches!(
        tx.execute(&client),
        Err(Error::NoPayerAccountOrTransactionId)
    ));
    assert!(!tx.is_frozen());
    assert_eq!(stub.calls(), 0);
}

// ---------------------------------------------------------------------------
// Cancellation and deadlines
// ---------------------------------------------------------------------------

#[test]
fn cancellation_interrupts_backoff() {
    let (client, stub, _) = setup();
    client.set_backoff(Duration::from_secs(5), Duration::from_secs(5));
    stub.script_submits(std::iter::repeat(Reply::Hangup).take(10));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        trigger.cancel();
    });

    let started = Instant::now();
    let mut tx = transfer(AccountId::from_num(2002), 10);
    let err = tx
        .execute_with(&client, &ExecuteOptions::default().with_cancel(cancel))
        .unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, Error::Cancelled), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(stub.calls(), 1);
}

#[test]
fn deadline_cuts_retries_short() {
    let (client, stub, _) = setup();
    client.set_backoff(Duration::from_secs(5), Duration::from_secs(5));
    stub.script_submits(std::iter::repeat(Reply::status(Status::Busy)).take(10));

    let started = Instant::now();
    let mut tx = transfer(AccountId::from_num(2002), 10);
    let err = tx
        .execute_with(
            &client,
            &ExecuteOptions::default().with_timeout(Duration::from_millis(100)),
        )
        .unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

#[test]
fn receipt_polling_waits_out_pending_answers() {
    let (client, stub, _) = setup();
    stub.script_receipts([
        Reply::status(Status::ReceiptNotFound),
        Reply::receipt(Status::Unknown),
        Reply::status(Status::Busy),
    ]);

    let response = transfer(AccountId::from_num(2002), 10).execute(&client).unwrap();
    let receipt = response.get_receipt(&client).unwrap();

    assert_eq!(receipt.status, Status::Success);
    assert_eq!(stub.calls(), 5);
}

#[test]
fn failed_consensus_surfaces_as_receipt_status() {
    let (client, stub, _) = setup();
    stub.script_receipts([Reply::receipt(Status::InvalidAccountAmounts)]);

    let response = transfer(AccountId::from_num(2002), 10).execute(&client).unwrap();
    let err = response.get_receipt(&client).unwrap_err();

    match err {
        Error::ReceiptStatus {
            status,
            transaction_id,
        } => {
            assert_eq!(status, Status::InvalidAccountAmounts);
            assert_eq!(transaction_id, response.transaction_id);
        }
        other => panic!("expected ReceiptStatus, got {other:?}"),
    }
    assert_eq!(stub.calls(), 2);
}

// ---------------------------------------------------------------------------
// Keys at rest
// ---------------------------------------------------------------------------

#[test]
fn mnemonic_key_survives_keystore_and_signs() {
    let mnemonic = Mnemonic::generate_24();
    let key = mnemonic.to_private_key("").unwrap();

    let params = KeystoreParams { rounds: 16 };
    let keystore = key.to_keystore_with("correct horse", &params).unwrap();
    let restored = PrivateKey::from_keystore(&keystore, "correct horse").unwrap();
    assert_eq!(restored.public_key(), key.public_key());

    let wrong = PrivateKey::from_keystore(&keystore, "battery staple").unwrap_err();
    assert!(matches!(
        wrong,
        KeystoreError::InvalidPassphraseOrCorruptKeystore
    ));

    // Same words, same key, and the restored key is good enough to pay with.
    let again = Mnemonic::from_words(mnemonic.words())
        .unwrap()
        .to_private_key("")
        .unwrap();
    assert_eq!(again.public_key(), key.public_key());

    let (client, stub, _) = setup();
    client.set_operator(operator(), restored);
    transfer(AccountId::from_num(2002), 10).execute(&client).unwrap();

    let sent = &stub.submissions()[0];
    assert!(sent.signatures_valid);
    assert!(sent.signed.sig_map.contains(&key.public_key()));
}

#[test]
fn encrypted_pem_round_trips_an_ecdsa_key() {
    let key = PrivateKey::generate_ecdsa();
    let pem = key.to_encrypted_pem("hunter2").unwrap();

    let restored = PrivateKey::from_pem(&pem, Some("hunter2")).unwrap();
    assert_eq!(restored.public_key(), key.public_key());
    assert!(PrivateKey::from_pem(&pem, None).is_err());
}

// ---------------------------------------------------------------------------
// Configuration and transport
// ---------------------------------------------------------------------------

#[test]
fn client_from_json_config_executes() {
    let operator_key = PrivateKey::generate_ed25519();
    let json = format!(
        r#"{{
            "network": {{ "stub:50211": "0.0.3" }},
            "network_name": "testnet",
            "operator": {{ "account_id": "0.0.1001", "private_key": "{}" }},
            "max_attempts": 4,
            "min_backoff_ms": 1,
            "max_backoff_ms": 2
        }}"#,
        operator_key.to_string_der()
    );

    let stub = Arc::new(StubNetwork::default());
    let config = serde_json::from_str(&json).unwrap();
    let client =
        Client::with_config(config, Arc::new(StubConnector(Arc::clone(&stub)))).unwrap();
    assert_eq!(client.max_attempts(), 4);
    assert_eq!(client.operator_public_key(), Some(operator_key.public_key()));

    stub.script_submits([Reply::Hangup]);
    transfer(AccountId::from_num(2002), 10).execute(&client).unwrap();
    assert_eq!(stub.calls(), 2);
    // The dropped connection was evicted and reopened.
    assert_eq!(stub.connects.load(Ordering::SeqCst), 2);
}

#[test]
fn tcp_transport_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let frame = read_frame(&mut stream).unwrap();
        let request: WireRequest = wire::decode(&frame).unwrap();
        let valid = match &request {
            WireRequest::SubmitTransaction(signed) => signed.sig_map.verify_all(&signed.body_bytes),
            WireRequest::GetTransactionReceipt { .. } => false,
        };
        let reply = wire::encode(&WireResponse::status(Status::Ok)).unwrap();
        write_frame(&mut stream, &reply).unwrap();
        valid
    });

    let client = Client::for_network(HashMap::from([(address, AccountId::from_num(3))]));
    client.set_operator(operator(), PrivateKey::generate_ed25519());

    let response = transfer(AccountId::from_num(2002), 10).execute(&client).unwrap();
    assert_eq!(response.node_id, AccountId::from_num(3));
    assert!(server.join().unwrap(), "server saw an invalid signature");
}
