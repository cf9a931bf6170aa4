use crate::{
    EthereumRequest, GatewayError,
    provider::{Eip1193Provider, request_as},
    units::format_amount,
};
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use depositor_config::{ContractInterface, Operation, OperationSpec};
use std::sync::Arc;

/// The deposit contract bound to a live provider.
///
/// A binding is built fresh whenever a provider is obtained and is never re-pointed at another
/// provider, so it can't outlive the handle it was created for.
#[derive(Clone, Debug)]
pub struct ContractBinding {
    address: Address,
    interface: Arc<ContractInterface>,
    provider: Arc<dyn Eip1193Provider>,
}

impl ContractBinding {
    pub fn new(
        address: Address,
        interface: Arc<ContractInterface>,
        provider: Arc<dyn Eip1193Provider>,
    ) -> Self {
        Self { address, interface, provider }
    }

    /// The contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The provider this binding dispatches through.
    pub fn provider(&self) -> &Arc<dyn Eip1193Provider> {
        &self.provider
    }

    /// Builds the `deposit()` transaction transferring `value` base units from `from`.
    pub fn deposit_request(&self, from: Address, value: U256) -> TransactionRequest {
        let deposit = self.interface.operation(Operation::Deposit);
        TransactionRequest::default()
            .from(from)
            .to(self.address)
            .value(value)
            .input(TransactionInput::both(calldata(deposit)))
    }

    /// Sends the `deposit()` transaction through the wallet and returns its hash.
    pub async fn send_deposit(&self, from: Address, value: U256) -> Result<TxHash, GatewayError> {
        let tx = self.deposit_request(from, value);
        debug!(target: "depositor::wallet", %from, amount = %format_amount(value), contract = %self.address, "sending deposit");
        request_as(&*self.provider, EthereumRequest::SendTransaction(tx))
            .await
            .map_err(GatewayError::submission)
    }

    /// Reads `owner()`.
    pub async fn owner(&self) -> Result<Address, GatewayError> {
        self.call_address(Operation::Owner).await
    }

    /// Reads `storageContract()`.
    pub async fn storage_contract(&self) -> Result<Address, GatewayError> {
        self.call_address(Operation::StorageContract).await
    }

    async fn call_address(&self, operation: Operation) -> Result<Address, GatewayError> {
        let spec = self.interface.operation(operation);
        let tx = TransactionRequest::default()
            .to(self.address)
            .input(TransactionInput::both(calldata(spec)));
        let output: Bytes = request_as(&*self.provider, EthereumRequest::Call(tx))
            .await
            .map_err(GatewayError::transport)?;

        let decoded = spec.outputs.first().map(|ty| ty.abi_decode(&output));
        match decoded {
            Some(Ok(DynSolValue::Address(address))) => Ok(address),
            Some(Err(err)) => Err(GatewayError::Transport {
                message: format!("failed to decode `{operation}` output: {err}"),
            }),
            _ => Err(GatewayError::Transport {
                message: format!("`{operation}` did not return an address"),
            }),
        }
    }
}

/// Calldata of an operation that takes no arguments: its selector.
fn calldata(spec: &OperationSpec) -> Bytes {
    debug_assert!(spec.inputs.is_empty(), "`{}` takes arguments", spec.operation);
    Bytes::copy_from_slice(spec.function.selector().as_slice())
}
