use alloy_primitives::{Address, Bytes, TxHash, keccak256};
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use depositor_wallet::{Eip1193Provider, EthereumRequest, ProviderHost, ProviderRpcError};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Notify;

/// How the scripted wallet answers a prompt.
#[derive(Clone, Debug, Default)]
enum Answer {
    #[default]
    Approve,
    Reject(ProviderRpcError),
}

#[derive(Debug, Default)]
struct MockState {
    installed: bool,
    /// Returned by `eth_accounts`.
    authorized: Vec<Address>,
    /// Granted by `eth_requestAccounts` when approved.
    grantable: Vec<Address>,
    authorization: Answer,
    transactions: Answer,
    revert: bool,
    hold_authorization: bool,
    transport_failure: Option<ProviderRpcError>,
    /// Receipt polls answered with `null` before the receipt shows up.
    pending_polls: usize,
    owner: Address,
    storage_contract: Address,
    detections: usize,
    requests: Vec<&'static str>,
    sent: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, Value>,
}

/// A scripted wallet provider and host.
///
/// Clones share state, so a test keeps one handle to script and inspect the wallet while the
/// gateway owns another.
#[derive(Clone, Debug)]
pub struct MockWallet {
    state: Arc<Mutex<MockState>>,
    authorization_gate: Arc<Notify>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    /// An installed wallet with no authorized accounts.
    pub fn new() -> Self {
        let state = MockState { installed: true, ..Default::default() };
        Self { state: Arc::new(Mutex::new(state)), authorization_gate: Arc::new(Notify::new()) }
    }

    /// A host without any wallet extension.
    pub fn absent() -> Self {
        let wallet = Self::new();
        wallet.set_installed(false);
        wallet
    }

    /// Adds an account that is already authorized.
    pub fn with_authorized(self, account: Address) -> Self {
        self.state.lock().authorized.push(account);
        self
    }

    /// Adds an account the user grants when asked.
    pub fn with_grantable(self, account: Address) -> Self {
        self.state.lock().grantable.push(account);
        self
    }

    /// Sets the addresses returned by `owner()` and `storageContract()`.
    pub fn with_contract_state(self, owner: Address, storage_contract: Address) -> Self {
        {
            let mut state = self.state.lock();
            state.owner = owner;
            state.storage_contract = storage_contract;
        }
        self
    }

    /// Installs or uninstalls the wallet.
    pub fn set_installed(&self, installed: bool) {
        self.state.lock().installed = installed;
    }

    /// The user rejects the next authorization prompts.
    pub fn reject_authorization(&self) {
        self.state.lock().authorization =
            Answer::Reject(ProviderRpcError::user_rejected("User rejected the request."));
    }

    /// The user declines to sign transactions.
    pub fn reject_transactions(&self) {
        self.state.lock().transactions =
            Answer::Reject(ProviderRpcError::user_rejected("User denied transaction signature."));
    }

    /// Sent transactions are mined but revert.
    pub fn revert_transactions(&self) {
        self.state.lock().revert = true;
    }

    /// Every request fails with `err`.
    pub fn fail_requests(&self, err: ProviderRpcError) {
        self.state.lock().transport_failure = Some(err);
    }

    /// Answers `polls` receipt requests with `null` before returning the receipt.
    pub fn delay_receipts(&self, polls: usize) {
        self.state.lock().pending_polls = polls;
    }

    /// Authorization prompts stay open until [`release_authorization`](Self::release_authorization).
    pub fn hold_authorization(&self) {
        self.state.lock().hold_authorization = true;
    }

    /// Lets one held authorization prompt be answered.
    pub fn release_authorization(&self) {
        self.authorization_gate.notify_one();
    }

    /// The methods requested so far, in order.
    pub fn requests(&self) -> Vec<&'static str> {
        self.state.lock().requests.clone()
    }

    /// How many times the host was asked for a provider.
    pub fn detections(&self) -> usize {
        self.state.lock().detections
    }

    /// The transactions sent so far.
    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().sent.clone()
    }

    /// This wallet as a shared host.
    pub fn host(&self) -> Arc<dyn ProviderHost> {
        Arc::new(self.clone())
    }

    fn accounts(&self) -> Value {
        json!(self.state.lock().authorized)
    }

    async fn request_accounts(&self) -> Result<Value, ProviderRpcError> {
        let hold = self.state.lock().hold_authorization;
        if hold {
            self.authorization_gate.notified().await;
        }
        let mut state = self.state.lock();
        if let Answer::Reject(err) = &state.authorization {
            return Err(err.clone());
        }
        if state.authorized.is_empty() {
            state.authorized = state.grantable.clone();
        }
        Ok(json!(state.authorized))
    }

    fn send_transaction(&self, tx: TransactionRequest) -> Result<Value, ProviderRpcError> {
        let mut state = self.state.lock();
        if let Answer::Reject(err) = &state.transactions {
            return Err(err.clone());
        }
        let hash = keccak256((state.sent.len() as u64).to_be_bytes());
        let receipt = json!({
            "transactionHash": hash,
            "blockNumber": format!("{:#x}", state.sent.len() + 1),
            "status": if state.revert { "0x0" } else { "0x1" },
            "from": tx.from.unwrap_or_default(),
            "to": tx.to.and_then(|to| to.to().copied()),
            "gasUsed": "0x5208",
        });
        state.receipts.insert(hash, receipt);
        state.sent.push(tx);
        Ok(json!(hash))
    }

    fn receipt(&self, hash: TxHash) -> Value {
        let mut state = self.state.lock();
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Value::Null;
        }
        state.receipts.get(&hash).cloned().unwrap_or(Value::Null)
    }

    fn call(&self, tx: &TransactionRequest) -> Result<Value, ProviderRpcError> {
        let state = self.state.lock();
        let selector = tx.input.input().and_then(|input| input.get(..4)).unwrap_or_default();
        let word = |address: Address| Bytes::copy_from_slice(address.into_word().as_slice());
        if selector == &keccak256("owner()")[..4] {
            Ok(json!(word(state.owner)))
        } else if selector == &keccak256("storageContract()")[..4] {
            Ok(json!(word(state.storage_contract)))
        } else {
            Err(ProviderRpcError::new(3i64, "execution reverted"))
        }
    }
}

#[async_trait]
impl ProviderHost for MockWallet {
    async fn detect(&self) -> Option<Arc<dyn Eip1193Provider>> {
        let mut state = self.state.lock();
        state.detections += 1;
        state.installed.then(|| Arc::new(self.clone()) as Arc<dyn Eip1193Provider>)
    }
}

#[async_trait]
impl Eip1193Provider for MockWallet {
    async fn request(&self, request: EthereumRequest) -> Result<Value, ProviderRpcError> {
        {
            let mut state = self.state.lock();
            state.requests.push(request.method());
            if let Some(err) = &state.transport_failure {
                return Err(err.clone());
            }
        }
        match request {
            EthereumRequest::Accounts => Ok(self.accounts()),
            EthereumRequest::RequestAccounts => self.request_accounts().await,
            EthereumRequest::ChainId => Ok(json!("0x7a69")),
            EthereumRequest::SendTransaction(tx) => self.send_transaction(tx),
            EthereumRequest::Call(tx) => self.call(&tx),
            EthereumRequest::GetTransactionReceipt(hash) => Ok(self.receipt(hash)),
        }
    }
}
