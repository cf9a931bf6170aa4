use crate::units::AmountError;
use std::fmt;

/// Error codes reported by wallet providers.
///
/// See <https://eips.ethereum.org/EIPS/eip-1193#provider-errors> and
/// <https://github.com/MetaMask/eth-rpc-errors/blob/main/src/error-constants.ts>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorCode {
    /// The user rejected the request.
    UserRejectedRequest,
    /// The requested method and/or account has not been authorized by the user.
    Unauthorized,
    /// The provider does not support the requested method.
    UnsupportedMethod,
    /// The provider is disconnected from all chains.
    Disconnected,
    /// The provider is not connected to the requested chain.
    ChainDisconnected,
    /// A request of the same type is already pending in the wallet.
    ResourceUnavailable,
    /// The transaction was rejected by the node.
    TransactionRejected,
    /// Internal JSON-RPC error.
    InternalError,
    /// Any other code.
    Other(i64),
}

impl ProviderErrorCode {
    /// Returns the error code as `i64`
    pub const fn code(&self) -> i64 {
        match *self {
            Self::UserRejectedRequest => 4001,
            Self::Unauthorized => 4100,
            Self::UnsupportedMethod => 4200,
            Self::Disconnected => 4900,
            Self::ChainDisconnected => 4901,
            Self::ResourceUnavailable => -32002,
            Self::TransactionRejected => -32003,
            Self::InternalError => -32603,
            Self::Other(c) => c,
        }
    }

    /// Returns the message associated with the error
    pub const fn message(&self) -> &'static str {
        match *self {
            Self::UserRejectedRequest => "User rejected the request",
            Self::Unauthorized => "Unauthorized",
            Self::UnsupportedMethod => "Unsupported method",
            Self::Disconnected => "Disconnected",
            Self::ChainDisconnected => "Chain disconnected",
            Self::ResourceUnavailable => "Resource unavailable",
            Self::TransactionRejected => "Transaction rejected",
            Self::InternalError => "Internal error",
            Self::Other(_) => "Provider error",
        }
    }

    /// Whether the user (or the wallet on the user's behalf) declined the request.
    pub const fn is_refusal(&self) -> bool {
        matches!(self, Self::UserRejectedRequest | Self::Unauthorized)
    }
}

impl From<i64> for ProviderErrorCode {
    fn from(code: i64) -> Self {
        match code {
            4001 => Self::UserRejectedRequest,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            -32002 => Self::ResourceUnavailable,
            -32003 => Self::TransactionRejected,
            -32603 => Self::InternalError,
            c => Self::Other(c),
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

/// An error returned by a wallet provider request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderRpcError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderRpcError {
    /// Creates a new error from a raw provider error code.
    pub fn new(code: impl Into<ProviderErrorCode>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }

    /// The user rejected the request.
    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::UserRejectedRequest, message)
    }

    /// The provider could not be reached.
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Disconnected, message)
    }

    /// The provider answered with something that could not be decoded.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }
}

impl From<alloy_transport::TransportError> for ProviderRpcError {
    fn from(err: alloy_transport::TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::new(payload.code, payload.message.to_string()),
            None => Self::disconnected(err.to_string()),
        }
    }
}

/// Errors surfaced by [`WalletGateway`](crate::WalletGateway) operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("no wallet provider is available")]
    ProviderUnavailable,
    #[error("wallet authorization denied: {reason}")]
    AuthorizationDenied { reason: String },
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: AmountError },
    #[error("transaction rejected: {reason}")]
    SubmissionRejected { reason: String },
    #[error("wallet provider error: {message}")]
    Transport { message: String },
}

impl GatewayError {
    /// Classifies a failed authorization request.
    pub fn authorization(err: ProviderRpcError) -> Self {
        match err.code {
            code if code.is_refusal() => Self::AuthorizationDenied { reason: err.message },
            ProviderErrorCode::ResourceUnavailable => {
                Self::AuthorizationDenied { reason: err.message }
            }
            _ => Self::transport(err),
        }
    }

    /// Classifies a failed transaction submission.
    pub fn submission(err: ProviderRpcError) -> Self {
        match err.code {
            code if code.is_refusal() => Self::SubmissionRejected { reason: err.message },
            ProviderErrorCode::TransactionRejected => {
                Self::SubmissionRejected { reason: err.message }
            }
            _ => Self::transport(err),
        }
    }

    /// Wraps any other provider failure.
    pub fn transport(err: ProviderRpcError) -> Self {
        Self::Transport { message: err.to_string() }
    }
}
