//! A provider host backed by a JSON-RPC node.
//!
//! Useful against a development node with unlocked accounts, where `eth_requestAccounts` and
//! `eth_sendTransaction` are answered by the node itself.

use crate::{
    EthereumRequest, ProviderRpcError,
    provider::{Eip1193Provider, ProviderHost},
};
use alloy_rpc_client::RpcClient;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Detects a provider by reaching a JSON-RPC endpoint over HTTP.
#[derive(Clone, Debug)]
pub struct RpcHost {
    url: Url,
}

impl RpcHost {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parses `url` into a host.
    pub fn from_url(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(url.parse()?))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ProviderHost for RpcHost {
    /// Builds a fresh client and pings `eth_chainId`; an unreachable endpoint counts as absent.
    async fn detect(&self) -> Option<Arc<dyn Eip1193Provider>> {
        let provider = RpcProvider { client: RpcClient::new_http(self.url.clone()) };
        match provider.request(EthereumRequest::ChainId).await {
            Ok(chain_id) => {
                trace!(target: "depositor::wallet", url = %self.url, %chain_id, "rpc provider detected");
                Some(Arc::new(provider))
            }
            Err(err) => {
                debug!(target: "depositor::wallet", url = %self.url, %err, "rpc provider unreachable");
                None
            }
        }
    }
}

/// An [`Eip1193Provider`] forwarding requests to a JSON-RPC client.
#[derive(Clone, Debug)]
pub struct RpcProvider {
    client: RpcClient,
}

#[async_trait]
impl Eip1193Provider for RpcProvider {
    async fn request(&self, request: EthereumRequest) -> Result<Value, ProviderRpcError> {
        self.client
            .request::<_, Value>(request.method(), request.params())
            .await
            .map_err(ProviderRpcError::from)
    }
}
