use super::{check_fee, OperationBody};
use crate::asset::Asset;
use crate::error::ProtocolResult;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strata_primitives::AccountId;

/// Application-defined payload; the chain only charges its fee
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOperation {
    /// Fee
    pub fee: Asset,
    /// Fee payer
    pub payer: AccountId,
    /// Additional accounts that must sign
    pub required_auths: BTreeSet<AccountId>,
    /// Application-chosen discriminator
    pub id: u16,
    /// Payload, charged per kilobyte
    pub data: Bytes,
}

impl OperationBody for CustomOperation {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.payer
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)
    }

    fn required_active_authorities(&self, out: &mut BTreeSet<AccountId>) {
        out.insert(self.payer);
        out.extend(self.required_auths.iter().copied());
    }
}
