//! # depositor-session
//!
//! The connection and deposit lifecycle of a single wallet session.
//!
//! [`SessionController`] consumes a [`WalletGateway`](depositor_wallet::WalletGateway), accepts
//! intents from the presentation layer and publishes a [`SessionSnapshot`] after every
//! transition.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

mod controller;
pub use controller::SessionController;

mod error;
pub use error::SessionError;

mod state;
pub use state::{ConnectionState, ContractInfo, Intent, SessionSnapshot};
