//! Operations: the closed set of state transitions a transaction can carry
//!
//! Every kind implements [`OperationBody`] for its fee, fee payer, stateless
//! checks and required authorities. [`Operation`] is the tagged union that
//! travels on the wire; its tag is the variant's position in the enum.

mod account;
mod asset;
mod bond;
mod custom;
mod governance;
mod market;
mod transfer;
mod vesting;
mod worker;

pub use account::{
    AccountCreateOperation, DelegateCreateOperation, KeyCreateOperation, KeyData,
    WitnessCreateOperation,
};
pub use asset::{AssetCreateOperation, AssetFundFeePoolOperation, AssetIssueOperation, AssetOptions};
pub use bond::CreateBondOfferOperation;
pub use custom::CustomOperation;
pub use governance::GlobalParametersUpdateOperation;
pub use market::{
    LimitOrderCancelOperation, LimitOrderCreateOperation, ShortOrderCancelOperation,
    ShortOrderCreateOperation,
};
pub use transfer::TransferOperation;
pub use vesting::{
    VestingBalanceCreateOperation, VestingBalanceWithdrawOperation, VestingPolicyInitializer,
};
pub use worker::{WorkerCreateOperation, WorkerInitializer, MAX_VESTING_PERIOD_DAYS};

use crate::asset::Asset;
use crate::error::{invalid, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strata_primitives::AccountId;

/// Behaviour shared by every operation kind
pub trait OperationBody {
    /// Short snake_case name, used in errors and logs
    fn name(&self) -> &'static str;

    /// Declared fee
    fn fee(&self) -> Asset;

    /// Account the fee is charged to
    fn fee_payer(&self) -> AccountId;

    /// Checks that need no chain state
    fn validate(&self) -> ProtocolResult<()>;

    /// Accounts whose active authority must sign
    fn required_active_authorities(&self, out: &mut BTreeSet<AccountId>) {
        out.insert(self.fee_payer());
    }
}

/// Fee must name a non-negative amount
pub(crate) fn check_fee(operation: &'static str, fee: &Asset) -> ProtocolResult<()> {
    if fee.amount < 0 {
        return Err(invalid(operation, "fee must not be negative"));
    }
    Ok(())
}

macro_rules! operations {
    ($($(#[$meta:meta])* $tag:literal => $variant:ident($ty:ty),)*) => {
        /// Any operation, tagged by kind
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub enum Operation {
            $($(#[$meta])* $variant($ty),)*
        }

        impl Operation {
            /// Number of operation kinds; valid tags are `0..COUNT`
            pub const COUNT: u32 = [$($tag),*].len() as u32;

            /// Wire tag of this operation's kind
            pub fn tag(&self) -> u32 {
                match self {
                    $(Operation::$variant(_) => $tag,)*
                }
            }

            /// The operation body as a trait object
            pub fn body(&self) -> &dyn OperationBody {
                match self {
                    $(Operation::$variant(op) => op,)*
                }
            }
        }

        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

operations! {
    /// Move an asset between accounts
    0 => Transfer(TransferOperation),
    /// Escrow funds in a limit order
    1 => LimitOrderCreate(LimitOrderCreateOperation),
    /// Cancel a limit order
    2 => LimitOrderCancel(LimitOrderCancelOperation),
    /// Escrow collateral in a short order
    3 => ShortOrderCreate(ShortOrderCreateOperation),
    /// Cancel a short order
    4 => ShortOrderCancel(ShortOrderCancelOperation),
    /// Register a key
    5 => KeyCreate(KeyCreateOperation),
    /// Register an account
    6 => AccountCreate(AccountCreateOperation),
    /// Register a delegate
    7 => DelegateCreate(DelegateCreateOperation),
    /// Register a witness
    8 => WitnessCreate(WitnessCreateOperation),
    /// Create a user-issued or market-issued asset
    9 => AssetCreate(AssetCreateOperation),
    /// Issue new supply of a user-issued asset
    10 => AssetIssue(AssetIssueOperation),
    /// Add core to an asset's fee pool
    11 => AssetFundFeePool(AssetFundFeePoolOperation),
    /// Stage new chain parameters
    12 => GlobalParametersUpdate(GlobalParametersUpdateOperation),
    /// Offer to lend or borrow
    13 => CreateBondOffer(CreateBondOfferOperation),
    /// Lock funds in a vesting balance
    14 => VestingBalanceCreate(VestingBalanceCreateOperation),
    /// Withdraw vested funds
    15 => VestingBalanceWithdraw(VestingBalanceWithdrawOperation),
    /// Register a treasury-funded worker
    16 => WorkerCreate(WorkerCreateOperation),
    /// Opaque payload with no chain effect beyond its fee
    17 => Custom(CustomOperation),
}

impl Operation {
    /// Short name of the operation kind
    pub fn name(&self) -> &'static str {
        self.body().name()
    }

    /// Declared fee
    pub fn fee(&self) -> Asset {
        self.body().fee()
    }

    /// Account the fee is charged to
    pub fn fee_payer(&self) -> AccountId {
        self.body().fee_payer()
    }

    /// Stateless checks
    pub fn validate(&self) -> ProtocolResult<()> {
        self.body().validate()
    }

    /// Accounts whose active authority must sign
    pub fn required_active_authorities(&self, out: &mut BTreeSet<AccountId>) {
        self.body().required_active_authorities(out)
    }
}
