//! The deposit contract's operation interface.
//!
//! The raw JSON ABI is checked once at startup against the operations this client knows how to
//! call. Call sites then work with [`OperationSpec`]s instead of trusting the ABI description on
//! every call.

use crate::InterfaceError;
use alloy_dyn_abi::{DynSolType, Specifier};
use alloy_json_abi::{Function, JsonAbi, Param, StateMutability};
use std::{fmt, path::Path};

/// ABI of the deployed deposit contract.
pub const DEFAULT_ABI: &str = include_str!("../abi/Depositor.json");

/// The callable operations of the deposit contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `deposit() payable`
    Deposit,
    /// `transfer(address,uint256)`
    Transfer,
    /// `withdraw()`
    Withdraw,
    /// `owner() view returns (address)`
    Owner,
    /// `storageContract() view returns (address)`
    StorageContract,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Self; 5] =
        [Self::Deposit, Self::Transfer, Self::Withdraw, Self::Owner, Self::StorageContract];

    /// The function name as declared in the ABI.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Transfer => "transfer",
            Self::Withdraw => "withdraw",
            Self::Owner => "owner",
            Self::StorageContract => "storageContract",
        }
    }

    /// The state mutability the contract must declare for this operation.
    pub const fn mutability(self) -> StateMutability {
        match self {
            Self::Deposit => StateMutability::Payable,
            Self::Transfer | Self::Withdraw => StateMutability::NonPayable,
            Self::Owner | Self::StorageContract => StateMutability::View,
        }
    }

    fn inputs(self) -> Vec<DynSolType> {
        match self {
            Self::Transfer => vec![DynSolType::Address, DynSolType::Uint(256)],
            _ => vec![],
        }
    }

    fn outputs(self) -> Vec<DynSolType> {
        match self {
            Self::Owner | Self::StorageContract => vec![DynSolType::Address],
            _ => vec![],
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated operation: the ABI function plus its resolved argument and return types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationSpec {
    pub operation: Operation,
    pub function: Function,
    pub inputs: Vec<DynSolType>,
    pub outputs: Vec<DynSolType>,
}

impl OperationSpec {
    /// The declared state mutability.
    pub fn mutability(&self) -> StateMutability {
        self.function.state_mutability
    }

    /// Whether calls to this operation may carry value.
    pub fn is_payable(&self) -> bool {
        self.mutability() == StateMutability::Payable
    }
}

/// The full set of validated operations of the deposit contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractInterface {
    operations: Vec<OperationSpec>,
}

impl ContractInterface {
    /// Validates the embedded ABI of the deployed contract.
    pub fn embedded() -> Result<Self, InterfaceError> {
        Self::from_json(DEFAULT_ABI)
    }

    /// Reads and validates a JSON ABI file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InterfaceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| InterfaceError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    /// Parses and validates a JSON ABI.
    pub fn from_json(json: &str) -> Result<Self, InterfaceError> {
        let abi: JsonAbi = serde_json::from_str(json)?;
        Self::from_abi(&abi)
    }

    /// Validates every known operation against `abi`.
    pub fn from_abi(abi: &JsonAbi) -> Result<Self, InterfaceError> {
        let operations =
            Operation::ALL.into_iter().map(|op| validate(abi, op)).collect::<Result<Vec<_>, _>>()?;
        trace!(target: "depositor::config", "validated contract interface");
        Ok(Self { operations })
    }

    /// Returns the validated spec of `operation`.
    pub fn operation(&self, operation: Operation) -> &OperationSpec {
        &self.operations[operation.index()]
    }

    /// Iterates over all validated operations.
    pub fn operations(&self) -> impl Iterator<Item = &OperationSpec> {
        self.operations.iter()
    }
}

fn validate(abi: &JsonAbi, operation: Operation) -> Result<OperationSpec, InterfaceError> {
    let name = operation.name();
    let function = match abi.function(name).map(Vec::as_slice) {
        None | Some([]) => return Err(InterfaceError::MissingOperation(name)),
        Some([function]) => function,
        Some(_) => return Err(InterfaceError::Overloaded(name)),
    };

    if function.state_mutability != operation.mutability() {
        return Err(InterfaceError::Mutability {
            operation: name,
            expected: operation.mutability(),
            found: function.state_mutability,
        });
    }

    let inputs = resolve_all(name, &function.inputs)?;
    let outputs = resolve_all(name, &function.outputs)?;
    let (expected_inputs, expected_outputs) = (operation.inputs(), operation.outputs());
    if inputs != expected_inputs || outputs != expected_outputs {
        return Err(InterfaceError::Signature {
            operation: name,
            expected: signature(name, &expected_inputs, &expected_outputs),
            found: signature(name, &inputs, &outputs),
        });
    }

    Ok(OperationSpec { operation, function: function.clone(), inputs, outputs })
}

fn resolve_all(operation: &'static str, params: &[Param]) -> Result<Vec<DynSolType>, InterfaceError> {
    params
        .iter()
        .map(|param| {
            param.resolve().map_err(|source| InterfaceError::InvalidType { operation, source })
        })
        .collect()
}

fn signature(name: &str, inputs: &[DynSolType], outputs: &[DynSolType]) -> String {
    let join = |types: &[DynSolType]| {
        types.iter().map(|ty| ty.sol_type_name().into_owned()).collect::<Vec<_>>().join(",")
    };
    if outputs.is_empty() {
        format!("{name}({})", join(inputs))
    } else {
        format!("{name}({}) returns ({})", join(inputs), join(outputs))
    }
}
