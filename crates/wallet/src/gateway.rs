use crate::{
    ContractBinding, DepositReceipt, EthereumRequest, GatewayError, ProviderErrorCode,
    provider::{Eip1193Provider, ProviderHost, request_as},
    units::parse_amount,
};
use alloy_primitives::{Address, TxHash};
use depositor_config::{Config, ContractInterface, InterfaceError};
use std::{sync::Arc, time::Duration};

/// An authorized account together with the contract bound to the provider that authorized it.
///
/// The two only ever exist together, so a connection can't refer to a stale provider.
#[derive(Clone, Debug)]
pub struct WalletConnection {
    pub account: Address,
    pub contract: ContractBinding,
}

/// Isolates all provider interaction behind three operations: [`probe`](Self::probe),
/// [`request_authorization`](Self::request_authorization) and
/// [`submit_deposit`](Self::submit_deposit).
#[derive(Clone, Debug)]
pub struct WalletGateway {
    host: Arc<dyn ProviderHost>,
    contract: Address,
    interface: Arc<ContractInterface>,
    receipt_poll_interval: Duration,
}

impl WalletGateway {
    /// Default interval between receipt polls.
    pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(host: Arc<dyn ProviderHost>, contract: Address, interface: ContractInterface) -> Self {
        Self {
            host,
            contract,
            interface: Arc::new(interface),
            receipt_poll_interval: Self::DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }

    /// Creates a gateway for the configured contract, validating its interface.
    pub fn from_config(config: &Config, host: Arc<dyn ProviderHost>) -> Result<Self, InterfaceError> {
        let interface = config.contract_interface()?;
        Ok(Self::new(host, config.contract, interface)
            .with_receipt_poll_interval(config.receipt_poll_interval()))
    }

    /// Sets the interval between receipt polls.
    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    /// Looks for an already authorized account without prompting the user.
    ///
    /// Returns `Ok(None)` when a provider is present but no account is authorized.
    pub async fn probe(&self) -> Result<Option<WalletConnection>, GatewayError> {
        let provider = self.detect().await?;
        let accounts: Vec<Address> =
            match request_as(&*provider, EthereumRequest::Accounts).await {
                Ok(accounts) => accounts,
                // locked wallets may refuse to enumerate instead of returning nothing
                Err(err) if err.code == ProviderErrorCode::Unauthorized => Vec::new(),
                Err(err) => return Err(GatewayError::transport(err)),
            };
        let Some(&account) = accounts.first() else {
            debug!(target: "depositor::wallet", "no authorized accounts");
            return Ok(None);
        };
        debug!(target: "depositor::wallet", %account, "found authorized account");
        Ok(Some(self.connect(account, provider)))
    }

    /// Asks the wallet to authorize an account.
    ///
    /// This suspends until the user answers the wallet's prompt.
    pub async fn request_authorization(&self) -> Result<WalletConnection, GatewayError> {
        let provider = self.detect().await?;
        let accounts: Vec<Address> = request_as(&*provider, EthereumRequest::RequestAccounts)
            .await
            .map_err(GatewayError::authorization)?;
        let Some(&account) = accounts.first() else {
            return Err(GatewayError::AuthorizationDenied {
                reason: "the wallet did not authorize any account".to_string(),
            });
        };
        debug!(target: "depositor::wallet", %account, "account authorized");
        Ok(self.connect(account, provider))
    }

    /// Deposits `amount` display units from the connected account and waits for the receipt.
    ///
    /// The amount is validated before any provider call is made.
    pub async fn submit_deposit(
        &self,
        connection: &WalletConnection,
        amount: &str,
    ) -> Result<DepositReceipt, GatewayError> {
        let value = parse_amount(amount).map_err(|reason| GatewayError::InvalidAmount {
            input: amount.to_string(),
            reason,
        })?;
        let hash = connection.contract.send_deposit(connection.account, value).await?;
        debug!(target: "depositor::wallet", %hash, "deposit sent, waiting for receipt");
        self.wait_for_receipt(&**connection.contract.provider(), hash).await
    }

    async fn detect(&self) -> Result<Arc<dyn Eip1193Provider>, GatewayError> {
        self.host.detect().await.ok_or_else(|| {
            debug!(target: "depositor::wallet", "no wallet provider detected");
            GatewayError::ProviderUnavailable
        })
    }

    fn connect(&self, account: Address, provider: Arc<dyn Eip1193Provider>) -> WalletConnection {
        let contract = ContractBinding::new(self.contract, self.interface.clone(), provider);
        WalletConnection { account, contract }
    }

    async fn wait_for_receipt(
        &self,
        provider: &dyn Eip1193Provider,
        hash: TxHash,
    ) -> Result<DepositReceipt, GatewayError> {
        loop {
            let receipt: Option<DepositReceipt> =
                request_as(provider, EthereumRequest::GetTransactionReceipt(hash))
                    .await
                    .map_err(GatewayError::transport)?;
            match receipt {
                Some(receipt) if receipt.succeeded() => {
                    debug!(target: "depositor::wallet", %hash, block = ?receipt.block_number, "deposit included");
                    return Ok(receipt);
                }
                Some(_) => {
                    warn!(target: "depositor::wallet", %hash, "deposit reverted");
                    return Err(GatewayError::SubmissionRejected {
                        reason: format!("transaction {hash} reverted"),
                    });
                }
                None => {
                    trace!(target: "depositor::wallet", %hash, "receipt not yet available");
                    tokio::time::sleep(self.receipt_poll_interval).await;
                }
            }
        }
    }
}
