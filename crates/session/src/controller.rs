use crate::{ConnectionState, ContractInfo, Intent, SessionError, SessionSnapshot};
use depositor_wallet::{
    ContractBinding, DepositReceipt, GatewayError, WalletConnection, WalletGateway,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Mutable session state. Only ever touched under the controller's lock.
#[derive(Debug, Default)]
struct Inner {
    /// Whether the session has left [`ConnectionState::Uninitialized`].
    resolved: bool,
    connection: Option<WalletConnection>,
    last_error: Option<SessionError>,
    input: String,
    pending: Option<Intent>,
    provider_available: Option<bool>,
    last_receipt: Option<DepositReceipt>,
    contract_info: Option<ContractInfo>,
    /// Bumped on every update, orders snapshot publication.
    version: u64,
}

impl Inner {
    fn state(&self) -> ConnectionState {
        match (&self.connection, self.resolved) {
            (Some(_), _) => ConnectionState::Connected,
            (None, true) => ConnectionState::Disconnected,
            (None, false) => ConnectionState::Uninitialized,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            account: self.connection.as_ref().map(|connection| connection.account),
            last_error: self.last_error.clone(),
            input: self.input.clone(),
            pending: self.pending,
            provider_available: self.provider_available,
            last_receipt: self.last_receipt.clone(),
            contract_info: self.contract_info,
        }
    }

    /// Claims the in-flight slot for `intent`, recording [`SessionError::Busy`] if it is taken.
    fn begin(&mut self, intent: Intent) -> bool {
        if let Some(pending) = self.pending {
            debug!(target: "depositor::session", %intent, %pending, "rejecting overlapping intent");
            self.last_error = Some(SessionError::Busy(pending));
            return false;
        }
        trace!(target: "depositor::session", %intent, "intent started");
        self.pending = Some(intent);
        true
    }

    /// The bound contract, or records [`SessionError::NotConnected`].
    fn require_connection(&mut self) -> Option<WalletConnection> {
        if self.connection.is_none() {
            self.last_error = Some(SessionError::NotConnected);
        }
        self.connection.clone()
    }

    fn record_gateway_error(&mut self, err: GatewayError) {
        self.provider_available = Some(err != GatewayError::ProviderUnavailable);
        self.last_error = Some(err.into());
    }
}

/// The connection and deposit lifecycle state machine.
///
/// All intents take `&self`, so the controller can be shared behind an `Arc` and driven from
/// several tasks. At most one intent is in flight at a time. Errors never escape an intent: they
/// are recorded in [`SessionSnapshot::last_error`].
#[derive(Debug)]
pub struct SessionController {
    gateway: WalletGateway,
    inner: Mutex<Inner>,
    snapshot: watch::Sender<SessionSnapshot>,
    /// Version of the last published snapshot.
    published: AtomicU64,
}

impl SessionController {
    pub fn new(gateway: WalletGateway) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        Self { gateway, inner: Mutex::new(Inner::default()), snapshot, published: AtomicU64::new(0) }
    }

    /// The current observable state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    /// Subscribes to snapshots. The receiver is notified after every transition that changes the
    /// observable state.
    ///
    /// Snapshots are published after the session lock is released, so calling back into the
    /// controller while holding a [`watch::Ref`] can't deadlock against a concurrent transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Looks for an already authorized account, without prompting.
    ///
    /// Only the first call probes; later calls, and calls after a successful
    /// [`connect`](Self::connect), do nothing.
    pub async fn initialize(&self) {
        let started = self.update(|inner| {
            if inner.resolved || inner.connection.is_some() {
                return false;
            }
            inner.begin(Intent::Probe)
        });
        if !started {
            return;
        }
        let guard = PendingGuard::new(self);
        let result = self.gateway.probe().await;
        guard.finish(|inner| {
            inner.resolved = true;
            match result {
                Ok(connection) => {
                    inner.provider_available = Some(true);
                    if let Some(connection) = connection {
                        debug!(target: "depositor::session", account = %connection.account, "restored connection");
                        inner.connection = Some(connection);
                    }
                }
                // absence is reported through the notice only
                Err(GatewayError::ProviderUnavailable) => inner.provider_available = Some(false),
                Err(err) => {
                    warn!(target: "depositor::session", %err, "initial probe failed");
                    inner.record_gateway_error(err);
                }
            }
        });
    }

    /// Asks the wallet to authorize an account. Does nothing when already connected.
    pub async fn connect(&self) {
        let started = self.update(|inner| {
            if inner.connection.is_some() {
                trace!(target: "depositor::session", "already connected");
                return false;
            }
            inner.begin(Intent::Connect)
        });
        if !started {
            return;
        }
        let guard = PendingGuard::new(self);
        let result = self.gateway.request_authorization().await;
        guard.finish(|inner| {
            inner.resolved = true;
            match result {
                Ok(connection) => {
                    debug!(target: "depositor::session", account = %connection.account, "connected");
                    inner.provider_available = Some(true);
                    inner.last_error = None;
                    inner.connection = Some(connection);
                }
                Err(err) => {
                    debug!(target: "depositor::session", %err, "connect failed");
                    inner.record_gateway_error(err);
                }
            }
        });
    }

    /// Deposits `amount` display units from the connected account.
    ///
    /// Without a connection this records [`SessionError::NotConnected`] and never reaches the
    /// provider.
    pub async fn submit_deposit(&self, amount: &str) {
        let connection = self.update(|inner| {
            let connection = inner.require_connection()?;
            inner.begin(Intent::Deposit).then_some(connection)
        });
        let Some(connection) = connection else { return };
        let guard = PendingGuard::new(self);
        let result = self.gateway.submit_deposit(&connection, amount).await;
        guard.finish(|inner| match result {
            Ok(receipt) => {
                debug!(target: "depositor::session", hash = %receipt.transaction_hash, "deposit confirmed");
                // keep anything typed while the deposit was pending
                if inner.input == amount {
                    inner.input.clear();
                }
                inner.last_error = None;
                inner.last_receipt = Some(receipt);
            }
            Err(err) => {
                debug!(target: "depositor::session", %err, "deposit failed");
                inner.last_error = Some(err.into());
            }
        });
    }

    /// Deposits the amount currently in the input field.
    pub async fn submit_input(&self) {
        let input = self.inner.lock().input.clone();
        self.submit_deposit(&input).await;
    }

    /// Replaces the deposit amount input.
    pub fn set_input(&self, input: impl Into<String>) {
        let input = input.into();
        self.update(|inner| inner.input = input);
    }

    /// Dismisses the last error.
    pub fn clear_error(&self) {
        self.update(|inner| inner.last_error = None);
    }

    /// Reads the contract's `owner` and `storageContract` into the snapshot.
    pub async fn refresh_contract_info(&self) {
        let connection = self.update(|inner| {
            let connection = inner.require_connection()?;
            inner.begin(Intent::ContractInfo).then_some(connection)
        });
        let Some(connection) = connection else { return };
        let guard = PendingGuard::new(self);
        let result = read_contract_info(&connection.contract).await;
        guard.finish(|inner| match result {
            Ok(info) => inner.contract_info = Some(info),
            Err(err) => inner.last_error = Some(err.into()),
        });
    }

    /// Applies `f` under the lock, then publishes the resulting snapshot if it changed.
    fn update<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let (out, next, version) = {
            let mut inner = self.inner.lock();
            let out = f(&mut inner);
            inner.version += 1;
            (out, inner.snapshot(), inner.version)
        };
        debug_assert_eq!(next.is_connected(), next.account.is_some());
        self.publish(next, version);
        out
    }

    /// Publishes the snapshot taken at `version` unless a later one already went out.
    fn publish(&self, next: SessionSnapshot, version: u64) {
        self.snapshot.send_if_modified(|current| {
            // serialized by the channel write lock
            if self.published.load(Ordering::Relaxed) >= version {
                return false;
            }
            self.published.store(version, Ordering::Relaxed);
            if *current == next {
                return false;
            }
            if current.state != next.state {
                debug!(target: "depositor::session", from = %current.state, to = %next.state, "state changed");
            }
            *current = next;
            true
        });
    }
}

async fn read_contract_info(contract: &ContractBinding) -> Result<ContractInfo, GatewayError> {
    let owner = contract.owner().await?;
    let storage_contract = contract.storage_contract().await?;
    Ok(ContractInfo { owner, storage_contract })
}

/// Holds the in-flight slot of a started intent.
///
/// Dropping the guard without [`finish`](Self::finish), e.g. because the intent's future was
/// dropped, releases the slot and leaves the rest of the state untouched.
struct PendingGuard<'a> {
    controller: &'a SessionController,
    finished: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(controller: &'a SessionController) -> Self {
        Self { controller, finished: false }
    }

    /// Releases the slot and applies the intent's outcome in a single transition.
    fn finish(mut self, f: impl FnOnce(&mut Inner)) {
        self.finished = true;
        self.controller.update(|inner| {
            inner.pending = None;
            f(inner);
        });
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            trace!(target: "depositor::session", "intent cancelled");
            self.controller.update(|inner| inner.pending = None);
        }
    }
}
