//! Shared helpers for depositor tests.

#![warn(unused_crate_dependencies, unreachable_pub)]

use alloy_primitives::{Address, address};
use depositor_config::{Config, ContractInterface};
use depositor_wallet::WalletGateway;
use std::time::Duration;

mod mock;
pub use mock::MockWallet;

/// First test account.
pub const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
/// Second test account.
pub const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");
/// Owner reported by the mocked contract.
pub const OWNER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
/// Storage contract reported by the mocked contract.
pub const STORAGE: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

/// Receipt poll interval used by [`gateway`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// A gateway over `wallet` for the default contract, polling receipts quickly.
pub fn gateway(wallet: &MockWallet) -> WalletGateway {
    let interface = ContractInterface::embedded().expect("embedded ABI is valid");
    WalletGateway::new(wallet.host(), Config::DEFAULT_CONTRACT, interface)
        .with_receipt_poll_interval(POLL_INTERVAL)
}
