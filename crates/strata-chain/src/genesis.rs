//! Initial chain state

use crate::config::DatabaseConfig;
use crate::database::Database;
use crate::error::{ChainResult, GenesisError};
use crate::objects::{
    AccountObject, AssetDynamicDataObject, AssetObject, DelegateObject,
    DynamicGlobalPropertyObject, GlobalPropertyObject, KeyObject, WitnessObject,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use strata_crypto::PublicKey;
use strata_primitives::{
    AccountId, Address, AssetId, GlobalPropertyId, KeyId, ShareType, Timestamp, VoteCategory,
    WitnessId, ADDRESS_PREFIX, H160, H256, MAX_SHARE_SUPPLY,
};
use strata_protocol::operations::{AssetOptions, KeyData};
use strata_protocol::{Asset, Authority, BlockId, ChainParameters, Price, COMMITTEE_ACCOUNT};
use tracing::{debug, info};

/// Name of the committee account, always 1.2.0
pub const COMMITTEE_ACCOUNT_NAME: &str = "committee-account";

/// Initial state of a chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Head block time before the first block
    #[serde(default)]
    pub initial_timestamp: Timestamp,
    /// Symbol of the core asset
    #[serde(default = "default_core_symbol")]
    pub core_symbol: String,
    /// Decimal places of the core asset
    #[serde(default = "default_core_precision")]
    pub core_precision: u8,
    /// Core supply may never exceed this
    #[serde(default = "default_max_core_supply")]
    pub max_core_supply: ShareType,
    /// Core held by the chain at genesis
    #[serde(default)]
    pub initial_treasury: ShareType,
    /// Consensus parameters
    #[serde(default)]
    pub initial_parameters: ChainParameters,
    /// Accounts, created in order starting at 1.2.1
    #[serde(default)]
    pub initial_accounts: Vec<GenesisAccount>,
    /// Witnesses, active from the first block
    #[serde(default)]
    pub initial_witnesses: Vec<GenesisWitness>,
    /// Committee members
    #[serde(default)]
    pub initial_delegates: Vec<GenesisDelegate>,
}

fn default_core_symbol() -> String {
    "STR".to_string()
}

fn default_core_precision() -> u8 {
    5
}

fn default_max_core_supply() -> ShareType {
    MAX_SHARE_SUPPLY
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            initial_timestamp: 0,
            core_symbol: default_core_symbol(),
            core_precision: default_core_precision(),
            max_core_supply: default_max_core_supply(),
            initial_treasury: 0,
            initial_parameters: ChainParameters::default(),
            initial_accounts: Vec::new(),
            initial_witnesses: Vec::new(),
            initial_delegates: Vec::new(),
        }
    }
}

/// An account present at genesis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// Unique name
    pub name: String,
    /// Owner, active and memo key: an address (`STR...`) or a hex public key
    pub key: String,
    /// Initial core balance
    #[serde(default)]
    pub balance: ShareType,
    /// Whether the account is prime
    #[serde(default)]
    pub prime: bool,
}

/// A witness present at genesis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisWitness {
    /// Name of the owning account
    pub owner_name: String,
    /// Block signing key, address or hex public key
    pub block_signing_key: String,
    /// Hex hash160 of the first secret the witness will reveal; any reveal
    /// is accepted for the first block when absent
    #[serde(default)]
    pub initial_secret: Option<String>,
}

/// A committee member present at genesis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDelegate {
    /// Name of the owning account, which must be prime
    pub owner_name: String,
}

impl GenesisConfig {
    /// Parse from TOML
    pub fn from_toml_str(s: &str) -> ChainResult<Self> {
        toml::from_str(s).map_err(|e| GenesisError::Config(e.to_string()).into())
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ChainResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GenesisError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&text)
    }
}

/// Parse a key given as an address or a hex public key
pub fn parse_key(key: &str) -> Result<KeyData, GenesisError> {
    let invalid = |reason: String| GenesisError::InvalidKey {
        key: key.to_string(),
        reason,
    };
    if key.starts_with(ADDRESS_PREFIX) {
        Address::from_str(key)
            .map(KeyData::Address)
            .map_err(|e| invalid(e.to_string()))
    } else {
        PublicKey::from_hex(key)
            .map(KeyData::PublicKey)
            .map_err(|e| invalid(e.to_string()))
    }
}

impl Database {
    /// Build the initial state described by `genesis`.
    ///
    /// Creates the global singletons, the committee account (1.2.0), the
    /// core asset (1.3.0), then the configured accounts, witnesses and
    /// delegates. Observers may be registered once this returns.
    pub fn from_genesis(genesis: &GenesisConfig, config: DatabaseConfig) -> ChainResult<Database> {
        let parameters = genesis.initial_parameters.clone();
        parameters.validate()?;
        if genesis.initial_timestamp % u32::from(parameters.block_interval) != 0 {
            return Err(GenesisError::InvalidTimestamp(genesis.initial_timestamp).into());
        }
        let supply = genesis
            .initial_accounts
            .iter()
            .map(|a| a.balance as i128)
            .sum::<i128>()
            + genesis.initial_treasury as i128;
        if supply > genesis.max_core_supply as i128 {
            return Err(GenesisError::SupplyExceeded {
                supply: supply.min(ShareType::MAX as i128) as ShareType,
                max_supply: genesis.max_core_supply,
            }
            .into());
        }

        let mut db = Database::new(config);
        let maintenance_interval = parameters.maintenance_interval;
        db.create::<GlobalPropertyObject, _>(|id| GlobalPropertyObject {
            id,
            parameters,
            ..Default::default()
        })?;
        db.create::<DynamicGlobalPropertyObject, _>(|id| DynamicGlobalPropertyObject {
            id,
            head_block_number: 0,
            head_block_id: BlockId::ZERO,
            time: genesis.initial_timestamp,
            current_witness: WitnessId::new(0),
            next_maintenance_time: genesis.initial_timestamp.saturating_add(maintenance_interval),
            last_budget_time: genesis.initial_timestamp,
            treasury: genesis.initial_treasury,
        })?;

        db.create::<AccountObject, _>(|id| AccountObject {
            id,
            name: COMMITTEE_ACCOUNT_NAME.to_string(),
            owner: Authority::new(1),
            active: Authority::new(1),
            memo_key: None,
            prime: true,
            registrar: COMMITTEE_ACCOUNT,
        })?;

        let dynamic_data = db.create::<AssetDynamicDataObject, _>(|id| AssetDynamicDataObject {
            id,
            current_supply: supply as ShareType,
            ..Default::default()
        })?;
        db.create::<AssetObject, _>(|id| AssetObject {
            id,
            symbol: genesis.core_symbol.clone(),
            issuer: COMMITTEE_ACCOUNT,
            precision: genesis.core_precision,
            options: AssetOptions {
                max_supply: genesis.max_core_supply,
                market_fee_percent: 0,
                core_exchange_rate: Price::unit(AssetId::CORE),
            },
            short_backing_asset: None,
            dynamic_data,
        })?;

        for account in &genesis.initial_accounts {
            if db.find_by_key::<AccountObject>(&account.name).is_some() {
                return Err(GenesisError::DuplicateName(account.name.clone()).into());
            }
            let key = create_key(&mut db, &account.key)?;
            let id = db.create::<AccountObject, _>(|id| AccountObject {
                id,
                name: account.name.clone(),
                owner: Authority::single_key(key),
                active: Authority::single_key(key),
                memo_key: Some(key),
                prime: account.prime,
                registrar: COMMITTEE_ACCOUNT,
            })?;
            db.adjust_balance(id, Asset::core(account.balance))?;
            debug!(account = %id, name = %account.name, balance = account.balance, "genesis account");
        }

        let mut active_witnesses = BTreeSet::new();
        for witness in &genesis.initial_witnesses {
            let owner = account_by_name(&db, &witness.owner_name)?;
            let signing_key = create_key(&mut db, &witness.block_signing_key)?;
            let next_secret = match &witness.initial_secret {
                Some(hex) => H160::from_hex(hex)
                    .map_err(|e| GenesisError::Config(format!("initial secret '{}': {}", hex, e)))?,
                None => H160::ZERO,
            };
            let vote_id = db.register_candidate(VoteCategory::Witness, owner)?;
            let id = db.create::<WitnessObject, _>(|id| WitnessObject {
                id,
                witness_account: owner,
                signing_key,
                next_secret,
                last_secret: H256::ZERO,
                accumulated_income: 0,
                vote_id,
            })?;
            active_witnesses.insert(id);
        }

        let mut active_delegates = BTreeSet::new();
        for delegate in &genesis.initial_delegates {
            let owner = account_by_name(&db, &delegate.owner_name)?;
            if !db.get(owner)?.prime {
                return Err(GenesisError::NotPrime(delegate.owner_name.clone()).into());
            }
            let vote_id = db.register_candidate(VoteCategory::Committee, owner)?;
            let id = db.create::<DelegateObject, _>(|id| DelegateObject {
                id,
                delegate_account: owner,
                vote_id,
            })?;
            active_delegates.insert(id);
        }

        db.modify(GlobalPropertyId::new(0), |g| {
            g.active_witnesses = active_witnesses;
            g.active_delegates = active_delegates;
        })?;
        db.set_loaded();

        info!(
            accounts = genesis.initial_accounts.len(),
            witnesses = genesis.initial_witnesses.len(),
            delegates = genesis.initial_delegates.len(),
            supply = supply as ShareType,
            "loaded genesis"
        );
        Ok(db)
    }
}

fn create_key(db: &mut Database, key: &str) -> ChainResult<KeyId> {
    let key_data = parse_key(key)?;
    db.create::<KeyObject, _>(|id| KeyObject { id, key_data })
}

fn account_by_name(db: &Database, name: &str) -> Result<AccountId, GenesisError> {
    db.find_by_key::<AccountObject>(&name.to_string())
        .map(|a| a.id)
        .ok_or_else(|| GenesisError::UnknownAccount(name.to_string()))
}
