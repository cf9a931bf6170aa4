use crate::Intent;
use depositor_wallet::GatewayError;

/// Errors recorded in [`SessionSnapshot::last_error`](crate::SessionSnapshot::last_error).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("no wallet account is connected")]
    NotConnected,
    /// Another intent is still in flight.
    #[error("cannot start a new operation while {0} is in progress")]
    Busy(Intent),
}

impl SessionError {
    /// Whether the error is the wallet provider being absent.
    pub fn is_provider_unavailable(&self) -> bool {
        matches!(self, Self::Gateway(GatewayError::ProviderUnavailable))
    }
}
