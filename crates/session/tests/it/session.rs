use alloy_primitives::U256;
use depositor_session::{
    ConnectionState, ContractInfo, Intent, SessionController, SessionError, SessionSnapshot,
};
use depositor_test_utils::{ALICE, BOB, MockWallet, OWNER, STORAGE, gateway, init_tracing};
use depositor_wallet::{GatewayError, ProviderRpcError};
use std::{sync::Arc, time::Duration};

fn session(wallet: &MockWallet) -> SessionController {
    init_tracing();
    SessionController::new(gateway(wallet))
}

/// Connected if and only if an account is bound.
#[track_caller]
fn assert_consistent(snapshot: &SessionSnapshot) {
    assert_eq!(snapshot.is_connected(), snapshot.account.is_some(), "{snapshot:?}");
    assert_eq!(snapshot.pending, None, "{snapshot:?}");
}

async fn connected(wallet: &MockWallet) -> SessionController {
    let session = session(wallet);
    session.initialize().await;
    assert_eq!(session.snapshot().account, Some(ALICE));
    session
}

#[tokio::test]
async fn starts_uninitialized() {
    let session = session(&MockWallet::new());
    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, ConnectionState::Uninitialized);
    assert_eq!(snapshot.account, None);
    assert_eq!(snapshot.provider_available, None);
}

#[tokio::test]
async fn startup_without_accounts() {
    let wallet = MockWallet::new().with_grantable(ALICE);
    let session = session(&wallet);
    session.initialize().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert_eq!(snapshot.last_error, None);
    assert_eq!(snapshot.provider_available, Some(true));
    assert_eq!(wallet.requests(), ["eth_accounts"]);
}

#[tokio::test]
async fn startup_restores_authorized_account() {
    let wallet = MockWallet::new().with_authorized(ALICE);
    let session = session(&wallet);
    session.initialize().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.account, Some(ALICE));
}

#[tokio::test]
async fn startup_without_provider() {
    let wallet = MockWallet::absent();
    let session = session(&wallet);
    session.initialize().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert_eq!(snapshot.last_error, None);
    assert_eq!(snapshot.provider_available, Some(false));
    assert!(snapshot.notice().is_some());
}

#[tokio::test]
async fn startup_probe_failure_is_recorded() {
    let wallet = MockWallet::new();
    wallet.fail_requests(ProviderRpcError::internal("boom"));
    let session = session(&wallet);
    session.initialize().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert!(matches!(snapshot.last_error, Some(SessionError::Gateway(GatewayError::Transport { .. }))));
}

#[tokio::test]
async fn probes_once() {
    let wallet = MockWallet::new();
    let session = session(&wallet);
    session.initialize().await;
    session.initialize().await;
    assert_eq!(wallet.detections(), 1);
    assert_eq!(wallet.requests(), ["eth_accounts"]);
}

#[tokio::test]
async fn connect_success() {
    let wallet = MockWallet::new().with_grantable(BOB);
    let session = session(&wallet);
    session.initialize().await;
    session.connect().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.account, Some(BOB));
    assert_eq!(snapshot.last_error, None);
}

#[tokio::test]
async fn connect_before_initialize() {
    let wallet = MockWallet::new().with_grantable(BOB);
    let session = session(&wallet);
    session.connect().await;
    assert_eq!(session.snapshot().account, Some(BOB));

    // the session is already resolved, so there is nothing left to probe
    session.initialize().await;
    assert_eq!(wallet.requests(), ["eth_requestAccounts"]);
}

#[tokio::test]
async fn connect_rejected() {
    let wallet = MockWallet::new().with_grantable(ALICE);
    wallet.reject_authorization();
    let session = session(&wallet);
    session.initialize().await;
    session.connect().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert!(matches!(
        snapshot.last_error,
        Some(SessionError::Gateway(GatewayError::AuthorizationDenied { .. }))
    ));
}

#[tokio::test]
async fn connect_recovers_after_provider_appears() {
    let wallet = MockWallet::absent().with_grantable(ALICE);
    let session = session(&wallet);
    session.initialize().await;
    session.connect().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert!(snapshot.last_error.as_ref().is_some_and(SessionError::is_provider_unavailable));
    assert!(snapshot.notice().is_some());

    wallet.set_installed(true);
    session.connect().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.account, Some(ALICE));
    assert_eq!(snapshot.last_error, None);
    assert_eq!(snapshot.notice(), None);
}

#[tokio::test]
async fn connect_while_connected_is_noop() {
    let wallet = MockWallet::new().with_authorized(ALICE);
    let session = connected(&wallet).await;
    let before = wallet.requests();
    session.connect().await;
    assert_eq!(wallet.requests(), before);
    assert_eq!(session.snapshot().account, Some(ALICE));
}

#[tokio::test]
async fn deposit_success() {
    let wallet = MockWallet::new().with_authorized(ALICE);
    let session = connected(&wallet).await;
    session.set_input("1.5");
    session.submit_input().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.input, "");
    assert_eq!(snapshot.last_error, None);
    let receipt = snapshot.last_receipt.unwrap();
    assert!(receipt.succeeded());
    assert_eq!(receipt.from, ALICE);

    let sent = wallet.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].value, Some(U256::from(1_500_000_000_000_000_000u128)));
}

#[tokio::test]
async fn deposit_keeps_input_edited_while_pending() {
    let wallet = MockWallet::new().with_authorized(ALICE);
    let session = Arc::new(connected(&wallet).await);
    wallet.delay_receipts(5);
    session.set_input("1");

    let mut updates = session.subscribe();
    let deposit = tokio::spawn({
        let session = session.clone();
        async move { session.submit_input().await }
    });
    updates.wait_for(|snapshot| snapshot.pending == Some(Intent::Deposit)).await.unwrap();
    session.set_input("2");
    deposit.await.unwrap();

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert!(snapshot.last_receipt.is_some());
    assert_eq!(snapshot.input, "2");
    assert_eq!(wallet.sent_transactions()[0].value, Some(U256::from(10u64).pow(U256::from(18))));
}

#[tokio::test]
async fn deposit_invalid_amount() {
    let wallet = MockWallet::new().with_authorized(ALICE);
    let session = connected(&wallet).await;
    let before = wallet.requests();
    session.set_input("abc");
    session.submit_input().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.input, "abc");
    assert!(matches!(
        snapshot.last_error,
        Some(SessionError::Gateway(GatewayError::InvalidAmount { .. }))
    ));
    assert_eq!(wallet.requests(), before);
}

#[tokio::test]
async fn deposit_while_disconnected() {
    let wallet = MockWallet::new();
    let session = session(&wallet);
    session.initialize().await;
    let before = wallet.requests();
    session.submit_deposit("1").await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    assert_eq!(snapshot.last_error, Some(SessionError::NotConnected));
    assert_eq!(wallet.requests(), before);
    assert_eq!(wallet.detections(), 1);
}

#[tokio::test]
async fn deposit_before_initialize() {
    let wallet = MockWallet::new().with_authorized(ALICE);
    let session = session(&wallet);
    session.submit_deposit("1").await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, ConnectionState::Uninitialized);
    assert_eq!(snapshot.last_error, Some(SessionError::NotConnected));
    assert!(wallet.requests().is_empty());
    assert_eq!(wallet.detections(), 0);
}

#[tokio::test]
async fn deposit_rejected_stays_connected() {
    let wallet = MockWallet::new().with_authorized(ALICE);
    let session = connected(&wallet).await;
    wallet.reject_transactions();
    session.set_input("2");
    session.submit_input().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.input, "2");
    assert_eq!(snapshot.last_receipt, None);
    assert!(matches!(
        snapshot.last_error,
        Some(SessionError::Gateway(GatewayError::SubmissionRejected { .. }))
    ));
}

#[tokio::test]
async fn reverted_deposit() {
    let wallet = MockWallet::new().with_authorized(ALICE);
    let session = connected(&wallet).await;
    wallet.revert_transactions();
    session.submit_deposit("1").await;

    assert!(matches!(
        session.snapshot().last_error,
        Some(SessionError::Gateway(GatewayError::SubmissionRejected { .. }))
    ));
}

#[tokio::test]
async fn clear_error() {
    let session = session(&MockWallet::new());
    session.submit_deposit("1").await;
    assert_eq!(session.snapshot().last_error, Some(SessionError::NotConnected));
    session.clear_error();
    assert_eq!(session.snapshot().last_error, None);
}

#[tokio::test]
async fn overlapping_intents_are_busy() {
    let wallet = MockWallet::new().with_grantable(BOB);
    wallet.hold_authorization();
    let session = Arc::new(session(&wallet));
    session.initialize().await;

    let mut updates = session.subscribe();
    let connect = tokio::spawn({
        let session = session.clone();
        async move { session.connect().await }
    });
    updates.wait_for(|snapshot| snapshot.pending == Some(Intent::Connect)).await.unwrap();

    session.connect().await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.last_error, Some(SessionError::Busy(Intent::Connect)));
    assert_eq!(snapshot.state, ConnectionState::Disconnected);
    let prompts =
        wallet.requests().iter().filter(|method| **method == "eth_requestAccounts").count();
    assert_eq!(prompts, 1);

    wallet.release_authorization();
    connect.await.unwrap();
    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.account, Some(BOB));
    assert_eq!(snapshot.last_error, None);
}

#[tokio::test]
async fn cancelled_intent_releases_slot() {
    let wallet = MockWallet::new().with_grantable(BOB);
    wallet.hold_authorization();
    let session = session(&wallet);
    session.initialize().await;

    let timed_out = tokio::time::timeout(Duration::from_millis(20), session.connect()).await;
    assert!(timed_out.is_err());
    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.state, ConnectionState::Disconnected);

    wallet.release_authorization();
    session.connect().await;
    assert_eq!(session.snapshot().account, Some(BOB));
}

#[tokio::test]
async fn subscribers_see_transitions() {
    let wallet = MockWallet::new().with_grantable(ALICE);
    let session = session(&wallet);
    let mut updates = session.subscribe();
    assert!(!updates.has_changed().unwrap());

    session.initialize().await;
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().state, ConnectionState::Disconnected);

    // nothing observable changes
    session.initialize().await;
    assert!(!updates.has_changed().unwrap());

    session.connect().await;
    assert_eq!(updates.borrow_and_update().account, Some(ALICE));
}

#[tokio::test]
async fn refreshes_contract_info() {
    let wallet = MockWallet::new().with_authorized(ALICE).with_contract_state(OWNER, STORAGE);
    let session = connected(&wallet).await;
    session.refresh_contract_info().await;

    let snapshot = session.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.contract_info, Some(ContractInfo { owner: OWNER, storage_contract: STORAGE }));
    assert_eq!(snapshot.last_error, None);
}

#[tokio::test]
async fn contract_info_requires_connection() {
    let wallet = MockWallet::new();
    let session = session(&wallet);
    session.initialize().await;
    session.refresh_contract_info().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.contract_info, None);
    assert_eq!(snapshot.last_error, Some(SessionError::NotConnected));
    assert!(!wallet.requests().contains(&"eth_call"));
}

#[test]
fn snapshot_while_holding_subscription() {
    let session = Arc::new(session(&MockWallet::new()));
    let updates = session.subscribe();
    let held = updates.borrow();

    let writer = std::thread::spawn({
        let session = session.clone();
        move || session.set_input("7")
    });
    // give the writer time to block on publishing
    std::thread::sleep(Duration::from_millis(50));
    let _ = session.snapshot();
    assert_eq!(held.input, "");
    drop(held);

    writer.join().unwrap();
    assert_eq!(updates.borrow().input, "7");
    assert_eq!(session.snapshot().input, "7");
}
