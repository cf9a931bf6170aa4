//! The seam between the gateway and the host's wallet provider.

use crate::ProviderRpcError;
use alloy_primitives::TxHash;
use alloy_rpc_types::TransactionRequest;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::{fmt, sync::Arc};

/// Standard EIP-1193 provider requests issued by this client.
///
/// Reference: <https://eips.ethereum.org/EIPS/eip-1193>
#[derive(Clone, Debug, PartialEq)]
pub enum EthereumRequest {
    /// `eth_accounts`: accounts already authorized, never prompts.
    Accounts,
    /// `eth_requestAccounts`: asks the user to authorize accounts.
    RequestAccounts,
    /// `eth_chainId`
    ChainId,
    /// `eth_sendTransaction`: signs and sends in one step.
    SendTransaction(TransactionRequest),
    /// `eth_call` against the latest block.
    Call(TransactionRequest),
    /// `eth_getTransactionReceipt`
    GetTransactionReceipt(TxHash),
}

impl EthereumRequest {
    /// The JSON-RPC method name.
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Accounts => "eth_accounts",
            Self::RequestAccounts => "eth_requestAccounts",
            Self::ChainId => "eth_chainId",
            Self::SendTransaction(_) => "eth_sendTransaction",
            Self::Call(_) => "eth_call",
            Self::GetTransactionReceipt(_) => "eth_getTransactionReceipt",
        }
    }

    /// The positional JSON-RPC params.
    pub fn params(&self) -> Value {
        match self {
            Self::Accounts | Self::RequestAccounts | Self::ChainId => json!([]),
            Self::SendTransaction(tx) => json!([tx]),
            Self::Call(tx) => json!([tx, "latest"]),
            Self::GetTransactionReceipt(hash) => json!([hash]),
        }
    }
}

/// A wallet provider handle, as injected by the host environment.
///
/// Requests may suspend indefinitely while the wallet waits for the user.
#[async_trait]
pub trait Eip1193Provider: fmt::Debug + Send + Sync {
    /// Dispatches a single request and returns the raw JSON result.
    async fn request(&self, request: EthereumRequest) -> Result<Value, ProviderRpcError>;
}

/// The host environment, which may or may not expose a wallet provider.
#[async_trait]
pub trait ProviderHost: fmt::Debug + Send + Sync {
    /// Returns the provider if one is currently available.
    ///
    /// Called once per gateway operation; availability can change between calls.
    async fn detect(&self) -> Option<Arc<dyn Eip1193Provider>>;
}

/// Dispatches `request` and decodes the result into `T`.
pub async fn request_as<T: DeserializeOwned>(
    provider: &dyn Eip1193Provider,
    request: EthereumRequest,
) -> Result<T, ProviderRpcError> {
    let method = request.method();
    trace!(target: "depositor::wallet", method, "provider request");
    let value = provider.request(request).await.inspect_err(|err| {
        debug!(target: "depositor::wallet", method, %err, "provider request failed");
    })?;
    serde_json::from_value(value).map_err(|err| {
        ProviderRpcError::internal(format!("invalid `{method}` response: {err}"))
    })
}
