//! # depositor-wallet
//!
//! Wallet provider gateway following
//! [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193): the Ethereum Provider JavaScript API.
//!
//! ## Architecture
//!
//! - [`ProviderHost`] is the host environment. It may or may not expose a wallet provider at
//!   any given moment.
//! - [`Eip1193Provider`] is the provider handle itself: a generic `request` dispatch.
//! - [`WalletGateway`] checks for the provider on every probe and authorization request, binds a
//!   fresh [`ContractBinding`] to the provider it found, and submits deposits through it.
//! - [`RpcHost`] is a host backed by a JSON-RPC node.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

mod contract;
mod error;
mod gateway;
pub mod provider;
mod receipt;
pub mod rpc;
pub mod units;

pub use contract::ContractBinding;
pub use error::{GatewayError, ProviderErrorCode, ProviderRpcError};
pub use gateway::{WalletConnection, WalletGateway};
pub use provider::{Eip1193Provider, EthereumRequest, ProviderHost};
pub use receipt::DepositReceipt;
pub use rpc::{RpcHost, RpcProvider};
pub use units::{AmountError, format_amount, parse_amount};
