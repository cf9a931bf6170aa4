use alloy_primitives::{Address, TxHash, U64};
use serde::{Deserialize, Serialize};

/// The fields of a transaction receipt this client reads.
///
/// Unknown receipt fields are ignored, so any node's or wallet's receipt decodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositReceipt {
    pub transaction_hash: TxHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<U64>,
    /// `1` on success, `0` on revert. Absent on pre-Byzantium receipts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<U64>,
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U64>,
}

impl DepositReceipt {
    /// Whether the transaction executed without reverting.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| !status.is_zero())
    }
}
