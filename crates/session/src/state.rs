use crate::SessionError;
use alloy_primitives::Address;
use depositor_wallet::DepositReceipt;
use std::fmt;

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// The initial probe has not completed yet.
    #[default]
    Uninitialized,
    /// No account is authorized, or no provider is available.
    Disconnected,
    /// Exactly one account is bound.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
        })
    }
}

/// An operation the session can have in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    Probe,
    Connect,
    Deposit,
    ContractInfo,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Probe => "probe",
            Self::Connect => "connect",
            Self::Deposit => "deposit",
            Self::ContractInfo => "contract info refresh",
        })
    }
}

/// Addresses read from the deposit contract's view operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractInfo {
    pub owner: Address,
    pub storage_contract: Address,
}

/// An immutable copy of everything the presentation layer renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    /// Set if and only if `state` is [`ConnectionState::Connected`].
    pub account: Option<Address>,
    pub last_error: Option<SessionError>,
    /// The deposit amount as typed by the user.
    pub input: String,
    pub pending: Option<Intent>,
    /// `None` until a provider lookup has completed.
    pub provider_available: Option<bool>,
    pub last_receipt: Option<DepositReceipt>,
    pub contract_info: Option<ContractInfo>,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// A passive message to show when no wallet provider was found.
    pub fn notice(&self) -> Option<&'static str> {
        (self.provider_available == Some(false))
            .then_some("No wallet provider found. Install a browser wallet extension to continue.")
    }
}
