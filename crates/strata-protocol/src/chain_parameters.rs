//! Consensus parameters and protocol limits

use crate::error::{ProtocolError, ProtocolResult};
use crate::fee_schedule::FeeSchedule;
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountId, ShareType, MAX_SHARE_SUPPLY, SECONDS_PER_DAY};

/// Account that pays for and owns committee-approved operations
pub const COMMITTEE_ACCOUNT: AccountId = AccountId(0);

/// Shortest asset symbol
pub const MIN_ASSET_SYMBOL_LENGTH: usize = 3;
/// Longest asset symbol
pub const MAX_ASSET_SYMBOL_LENGTH: usize = 16;
/// Shortest account name
pub const MIN_ACCOUNT_NAME_LENGTH: usize = 3;
/// Longest account name
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 63;
/// Most decimal places an asset may declare
pub const MAX_ASSET_PRECISION: u8 = 12;
/// 100% in hundredths of a percent
pub const FULL_PERCENT: u16 = 10_000;
/// Collateral ratios are expressed per mille
pub const COLLATERAL_RATIO_DENOM: u16 = 1_000;
/// Lowest maintenance collateral ratio (100.1%)
pub const MIN_COLLATERAL_RATIO: u16 = 1_001;
/// Highest collateral ratio (3200%)
pub const MAX_COLLATERAL_RATIO: u16 = 32_000;
/// Longest worker name
pub const MAX_WORKER_NAME_LENGTH: usize = 63;
/// Longest worker url
pub const MAX_URL_LENGTH: usize = 127;

/// Parameters every node must agree on; changed only through
/// `global_parameters_update` at a maintenance boundary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParameters {
    /// Fees charged per operation kind
    pub current_fees: FeeSchedule,
    /// Seconds between blocks
    pub block_interval: u8,
    /// Seconds between maintenance passes
    pub maintenance_interval: u32,
    /// Largest encoded transaction accepted
    pub maximum_transaction_size: u32,
    /// Largest encoded block accepted
    pub maximum_block_size: u32,
    /// Furthest a transaction's expiration may lie past head block time
    pub maximum_time_until_expiration: u32,
    /// Treasury spent on workers per day
    pub worker_budget_per_day: ShareType,
    /// Treasury paid to the producing witness per block
    pub witness_pay_per_block: ShareType,
    /// Most keys a single authority may list
    pub maximum_authority_membership: u16,
}

impl Default for ChainParameters {
    fn default() -> Self {
        Self {
            current_fees: FeeSchedule::default(),
            block_interval: 5,
            maintenance_interval: SECONDS_PER_DAY,
            maximum_transaction_size: 2048,
            maximum_block_size: 2 * 1024 * 1024,
            maximum_time_until_expiration: SECONDS_PER_DAY,
            worker_budget_per_day: 500_000,
            witness_pay_per_block: 10,
            maximum_authority_membership: 10,
        }
    }
}

impl ChainParameters {
    /// Range checks applied before parameters can be staged
    pub fn validate(&self) -> ProtocolResult<()> {
        let bad = |reason: &str| Err(ProtocolError::InvalidParameters(reason.to_string()));
        if self.block_interval == 0 {
            return bad("block interval must be positive");
        }
        if self.maintenance_interval == 0
            || self.maintenance_interval % self.block_interval as u32 != 0
        {
            return bad("maintenance interval must be a positive multiple of the block interval");
        }
        if self.maximum_transaction_size < 256 {
            return bad("maximum transaction size too small");
        }
        if self.maximum_block_size < self.maximum_transaction_size {
            return bad("maximum block size below maximum transaction size");
        }
        if self.maximum_time_until_expiration <= self.block_interval as u32 {
            return bad("expiration window shorter than a block");
        }
        if self.worker_budget_per_day < 0 || self.worker_budget_per_day > MAX_SHARE_SUPPLY {
            return bad("worker budget out of range");
        }
        if self.witness_pay_per_block < 0 || self.witness_pay_per_block > MAX_SHARE_SUPPLY {
            return bad("witness pay out of range");
        }
        if self.maximum_authority_membership == 0 {
            return bad("authorities must allow at least one key");
        }
        self.current_fees.validate()
    }
}

/// Asset symbols: upper-case letters and digits, starting with a letter
pub fn is_valid_symbol(symbol: &str) -> bool {
    let len = symbol.len();
    if !(MIN_ASSET_SYMBOL_LENGTH..=MAX_ASSET_SYMBOL_LENGTH).contains(&len) {
        return false;
    }
    let mut chars = symbol.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Account names: lower-case letters, digits and dashes, starting with a
/// letter and not ending with a dash
pub fn is_valid_account_name(name: &str) -> bool {
    let len = name.len();
    if !(MIN_ACCOUNT_NAME_LENGTH..=MAX_ACCOUNT_NAME_LENGTH).contains(&len) {
        return false;
    }
    let bytes = name.as_bytes();
    bytes[0].is_ascii_lowercase()
        && bytes[len - 1] != b'-'
        && bytes
            .iter()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(ChainParameters::default().validate().is_ok());
    }

    #[test]
    fn test_parameters_reject_zero_interval() {
        let params = ChainParameters {
            block_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ProtocolError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_parameters_reject_misaligned_maintenance() {
        let params = ChainParameters {
            block_interval: 7,
            maintenance_interval: 100,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_symbol_rules() {
        assert!(is_valid_symbol("TEST"));
        assert!(is_valid_symbol("BTC2"));
        assert!(!is_valid_symbol("AB"));
        assert!(!is_valid_symbol("test"));
        assert!(!is_valid_symbol("1ABC"));
        assert!(!is_valid_symbol("ABCDEFGHIJKLMNOPQ"));
    }

    #[test]
    fn test_account_name_rules() {
        assert!(is_valid_account_name("alice"));
        assert!(is_valid_account_name("init-0"));
        assert!(!is_valid_account_name("al"));
        assert!(!is_valid_account_name("Alice"));
        assert!(!is_valid_account_name("bob-"));
        assert!(!is_valid_account_name("9lives"));
    }
}
