use super::{check_fee, OperationBody};
use crate::asset::Asset;
use crate::authority::Authority;
use crate::chain_parameters::is_valid_account_name;
use crate::error::{invalid, ProtocolResult};
use serde::{Deserialize, Serialize};
use strata_crypto::PublicKey;
use strata_primitives::{AccountId, Address, KeyId, H160};

/// What a key object stores: a bare address or the full public key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyData {
    /// Address only; the public key is not disclosed
    Address(Address),
    /// Full public key
    PublicKey(PublicKey),
}

impl KeyData {
    /// Address the key is known under, identical for both representations
    pub fn address(&self) -> Address {
        match self {
            KeyData::Address(address) => *address,
            KeyData::PublicKey(key) => key.to_address(),
        }
    }
}

/// Register a key so that authorities can refer to it by id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCreateOperation {
    /// Fee
    pub fee: Asset,
    /// Fee payer
    pub fee_paying_account: AccountId,
    /// Key material
    pub key_data: KeyData,
}

impl OperationBody for KeyCreateOperation {
    fn name(&self) -> &'static str {
        "key_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.fee_paying_account
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if let KeyData::Address(address) = &self.key_data {
            if address.is_zero() {
                return Err(invalid(self.name(), "zero address"));
            }
        }
        Ok(())
    }
}

/// Register a named account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreateOperation {
    /// Fee
    pub fee: Asset,
    /// Account paying for the registration
    pub registrar: AccountId,
    /// Unique name
    pub name: String,
    /// Owner authority
    pub owner: Authority,
    /// Active authority, signs day-to-day operations
    pub active: Authority,
    /// Key for memos
    pub memo_key: KeyId,
    /// Register as a prime account; only prime registrars may do so
    pub prime: bool,
}

impl OperationBody for AccountCreateOperation {
    fn name(&self) -> &'static str {
        "account_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.registrar
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)?;
        if !is_valid_account_name(&self.name) {
            return Err(invalid(self.name(), format!("invalid account name '{}'", self.name)));
        }
        if self.owner.is_impossible() {
            return Err(invalid(self.name(), "owner authority can never be satisfied"));
        }
        if self.active.is_impossible() {
            return Err(invalid(self.name(), "active authority can never be satisfied"));
        }
        Ok(())
    }
}

/// Register a prime account as a committee delegate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateCreateOperation {
    /// Fee
    pub fee: Asset,
    /// Account to register, pays the fee
    pub delegate_account: AccountId,
}

impl OperationBody for DelegateCreateOperation {
    fn name(&self) -> &'static str {
        "delegate_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.delegate_account
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)
    }
}

/// Register an account as a block-producing witness
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessCreateOperation {
    /// Fee
    pub fee: Asset,
    /// Account to register, pays the fee
    pub witness_account: AccountId,
    /// Key that signs this witness's blocks
    pub block_signing_key: KeyId,
    /// Hash of the secret revealed in the witness's first block
    pub initial_secret: H160,
}

impl OperationBody for WitnessCreateOperation {
    fn name(&self) -> &'static str {
        "witness_create"
    }

    fn fee(&self) -> Asset {
        self.fee
    }

    fn fee_payer(&self) -> AccountId {
        self.witness_account
    }

    fn validate(&self) -> ProtocolResult<()> {
        check_fee(self.name(), &self.fee)
    }
}
