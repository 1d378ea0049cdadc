//! Builders for declarative scenario setup
//!
//! [`GenesisBuilder`] describes the chain a harness starts from and
//! [`TrxBuilder`] collects operations into a fee-paying, signed transaction.

use crate::{E2EError, E2EResult};
use strata_chain::{
    initial_secret_hash, Database, GenesisAccount, GenesisConfig, GenesisDelegate, GenesisWitness,
};
use strata_crypto::{derive_private_key, PrivateKey, PublicKey};
use strata_primitives::{ShareType, Timestamp};
use strata_protocol::{Asset, ChainParameters, Operation, SignedTransaction, Transaction};

/// Seconds a built transaction stays valid after the head block
pub const DEFAULT_EXPIRATION: u32 = 60;

/// Key every test account and witness is derived from
pub(crate) fn account_key(name: &str) -> E2EResult<PrivateKey> {
    Ok(derive_private_key(name.as_bytes())?)
}

/// Block signing key of the witness owned by `owner`
pub(crate) fn signing_key(owner: &str) -> E2EResult<PrivateKey> {
    account_key(&format!("{owner}-signing"))
}

/// Genesis description, keyed by account name
#[derive(Clone, Debug)]
pub struct GenesisBuilder {
    pub(crate) timestamp: Timestamp,
    pub(crate) treasury: ShareType,
    pub(crate) parameters: ChainParameters,
    /// (name, balance, prime)
    pub(crate) accounts: Vec<(String, ShareType, bool)>,
    pub(crate) witnesses: Vec<String>,
    pub(crate) delegates: Vec<String>,
}

impl GenesisBuilder {
    /// Chain with no accounts, default parameters and an empty treasury
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            treasury: 0,
            parameters: ChainParameters::default(),
            accounts: Vec::new(),
            witnesses: Vec::new(),
            delegates: Vec::new(),
        }
    }

    /// Add an account holding `balance` core
    pub fn account(mut self, name: &str, balance: ShareType) -> Self {
        self.accounts.push((name.to_string(), balance, false));
        self
    }

    /// Add a prime account holding `balance` core
    pub fn prime_account(mut self, name: &str, balance: ShareType) -> Self {
        self.accounts.push((name.to_string(), balance, true));
        self
    }

    /// Register `owner` as a witness signing with its derived signing key
    pub fn witness(mut self, owner: &str) -> Self {
        self.witnesses.push(owner.to_string());
        self
    }

    /// Register `owner` as a committee delegate
    pub fn delegate(mut self, owner: &str) -> Self {
        self.delegates.push(owner.to_string());
        self
    }

    /// Core held by the chain
    pub fn treasury(mut self, amount: ShareType) -> Self {
        self.treasury = amount;
        self
    }

    /// Replace the consensus parameters
    pub fn parameters(mut self, parameters: ChainParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Seconds between maintenance intervals
    pub fn maintenance_interval(mut self, seconds: u32) -> Self {
        self.parameters.maintenance_interval = seconds;
        self
    }

    /// The equivalent genesis configuration
    pub fn to_config(&self) -> E2EResult<GenesisConfig> {
        let initial_accounts = self
            .accounts
            .iter()
            .map(|(name, balance, prime)| {
                let key = account_key(name)?;
                Ok(GenesisAccount {
                    name: name.clone(),
                    key: PublicKey::from_private_key(&key).to_string(),
                    balance: *balance,
                    prime: *prime,
                })
            })
            .collect::<E2EResult<Vec<_>>>()?;
        let initial_witnesses = self
            .witnesses
            .iter()
            .map(|owner| {
                let key = signing_key(owner)?;
                Ok(GenesisWitness {
                    owner_name: owner.clone(),
                    block_signing_key: PublicKey::from_private_key(&key).to_string(),
                    initial_secret: Some(initial_secret_hash(&key).to_hex()),
                })
            })
            .collect::<E2EResult<Vec<_>>>()?;
        let initial_delegates = self
            .delegates
            .iter()
            .map(|owner| GenesisDelegate {
                owner_name: owner.clone(),
            })
            .collect();

        Ok(GenesisConfig {
            initial_timestamp: self.timestamp,
            initial_treasury: self.treasury,
            initial_parameters: self.parameters.clone(),
            initial_accounts,
            initial_witnesses,
            initial_delegates,
            ..Default::default()
        })
    }
}

/// Builder for one transaction.
///
/// Fees are filled in from the chain's current fee schedule unless
/// [`TrxBuilder::keep_fees`] is set.
#[derive(Clone, Debug, Default)]
pub struct TrxBuilder {
    pub(crate) operations: Vec<Operation>,
    pub(crate) expiration: Option<Timestamp>,
    pub(crate) keep_fees: bool,
}

impl TrxBuilder {
    /// Empty transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction carrying one operation
    pub fn single(op: impl Into<Operation>) -> Self {
        Self::new().op(op)
    }

    /// Append an operation
    pub fn op(mut self, op: impl Into<Operation>) -> Self {
        self.operations.push(op.into());
        self
    }

    /// Absolute expiration time
    pub fn expires_at(mut self, expiration: Timestamp) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Leave the declared fees untouched
    pub fn keep_fees(mut self) -> Self {
        self.keep_fees = true;
        self
    }

    /// Number of operations collected
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether no operation was added
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Build against `db` and sign with every key in `signers`
    pub fn build(self, db: &Database, signers: &[&PrivateKey]) -> E2EResult<SignedTransaction> {
        if self.operations.is_empty() {
            return Err(E2EError::Setup("transaction has no operations".to_string()));
        }
        let expiration = match self.expiration {
            Some(expiration) => expiration,
            None => db.head_block_time()? + DEFAULT_EXPIRATION,
        };
        let mut operations = self.operations;
        if !self.keep_fees {
            let schedule = db.current_fee_schedule()?;
            for op in &mut operations {
                let fee = schedule.calculate_fee(op);
                set_fee(op, Asset::core(fee));
            }
        }
        let mut trx = SignedTransaction::new(Transaction::new(expiration, operations));
        for key in signers {
            trx.sign(key)?;
        }
        Ok(trx)
    }
}

fn set_fee(op: &mut Operation, fee: Asset) {
    let slot = match op {
        Operation::Transfer(op) => &mut op.fee,
        Operation::LimitOrderCreate(op) => &mut op.fee,
        Operation::LimitOrderCancel(op) => &mut op.fee,
        Operation::ShortOrderCreate(op) => &mut op.fee,
        Operation::ShortOrderCancel(op) => &mut op.fee,
        Operation::KeyCreate(op) => &mut op.fee,
        Operation::AccountCreate(op) => &mut op.fee,
        Operation::DelegateCreate(op) => &mut op.fee,
        Operation::WitnessCreate(op) => &mut op.fee,
        Operation::AssetCreate(op) => &mut op.fee,
        Operation::AssetIssue(op) => &mut op.fee,
        Operation::AssetFundFeePool(op) => &mut op.fee,
        Operation::GlobalParametersUpdate(op) => &mut op.fee,
        Operation::CreateBondOffer(op) => &mut op.fee,
        Operation::VestingBalanceCreate(op) => &mut op.fee,
        Operation::VestingBalanceWithdraw(op) => &mut op.fee,
        Operation::WorkerCreate(op) => &mut op.fee,
        Operation::Custom(op) => &mut op.fee,
    };
    *slot = fee;
}

/// Core amount helper.
///
/// Allows writing `10i64.core()` instead of `1_000_000` at the default
/// precision of five decimals.
pub trait CoreDenom {
    /// Smallest units, as given
    fn units(self) -> ShareType;
    /// Whole core, 10^5 units
    fn core(self) -> ShareType;
}

impl CoreDenom for i64 {
    fn units(self) -> ShareType {
        self
    }

    fn core(self) -> ShareType {
        self * 100_000
    }
}
