use super::{check_fee, OperationBody};
use crate::asset::Asset;
use crate::chain_parameters::{ChainParameters, COMMITTEE_ACCOUNT};
use crate::error::ProtocolResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strata_primitives::AccountId;

/// Replace the chain parameters at the next maintenance boundary.
///
/// Only valid inside a committee-proposed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalParametersUpdateOperation {
    /// Fee, paid by the committee account
    pub fee: Asset,
    /// Parameters to activate
    pub new_parameters: ChainParameters,
}

impl OperationBody for GlobalParametersUpdateOperation {
    fn name(&self) -> &'static str {
        "global_parameters_update"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        COMMITTEE_ACCOUNT
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        self.new_parameters.validate()
    }

    // Approval is collected by the committee before the transaction is proposed
    fn required_active_authorities(&self, _out: &mut BTreeSet<AccountId>) {}
}
