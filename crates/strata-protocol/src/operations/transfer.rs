use super::{check_fee, OperationBody};
use crate::asset::Asset;
use crate::error::{invalid, ProtocolResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strata_primitives::AccountId;

/// Move `amount` from one account to another
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOperation {
    /// Fee, paid by `from`
    pub fee: Asset,
    /// Sender
    pub from: AccountId,
    /// Receiver
    pub to: AccountId,
    /// Amount moved
    pub amount: Asset,
    /// Opaque memo, charged per kilobyte
    pub memo: Bytes,
}

impl OperationBody for TransferOperation {
    fn name(&self) -> &'static str {
        "transfer"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.from
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if self.from == self.to {
            return Err(invalid(self.name(), "cannot transfer to self"));
        }
        if self.amount.amount <= 0 {
            return Err(invalid(self.name(), "amount must be positive"));
        }
        Ok(())
    }
}
