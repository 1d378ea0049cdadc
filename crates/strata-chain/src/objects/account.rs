//! Keys, accounts and balances

use crate::object::Object;
use serde::{Deserialize, Serialize};
use strata_primitives::{AccountBalanceId, AccountId, Address, AssetId, KeyId, ShareType};
use strata_protocol::operations::KeyData;
use strata_protocol::{Asset, Authority};

/// A registered key, referenced by authorities
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyObject {
    /// Id
    pub id: KeyId,
    /// Stored address or public key
    pub key_data: KeyData,
}

impl KeyObject {
    /// Address the key represents, whichever form was stored
    pub fn key_address(&self) -> Address {
        self.key_data.address()
    }
}

impl Object for KeyObject {
    type Id = KeyId;
    type Key = ();
    const TYPE_NAME: &'static str = "key";

    fn id(&self) -> KeyId {
        self.id
    }
}

/// A named account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountObject {
    /// Id
    pub id: AccountId,
    /// Unique name
    pub name: String,
    /// Owner authority
    pub owner: Authority,
    /// Active authority
    pub active: Authority,
    /// Memo key; the committee account has none
    pub memo_key: Option<KeyId>,
    /// May register delegates and prime accounts
    pub prime: bool,
    /// Account that paid for the registration
    pub registrar: AccountId,
}

impl Object for AccountObject {
    type Id = AccountId;
    type Key = String;
    const TYPE_NAME: &'static str = "account";

    fn id(&self) -> AccountId {
        self.id
    }

    fn secondary_key(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

/// Amount of one asset held by one account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalanceObject {
    /// Id
    pub id: AccountBalanceId,
    /// Holder
    pub owner: AccountId,
    /// Asset held
    pub asset_type: AssetId,
    /// Amount held
    pub balance: ShareType,
}

impl AccountBalanceObject {
    /// The balance as an asset amount
    pub fn amount(&self) -> Asset {
        Asset::new(self.balance, self.asset_type)
    }
}

impl Object for AccountBalanceObject {
    type Id = AccountBalanceId;
    type Key = (AccountId, AssetId);
    const TYPE_NAME: &'static str = "account_balance";

    fn id(&self) -> AccountBalanceId {
        self.id
    }

    fn secondary_key(&self) -> Option<(AccountId, AssetId)> {
        Some((self.owner, self.asset_type))
    }
}
