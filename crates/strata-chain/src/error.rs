//! Chain error types

use strata_crypto::CryptoError;
use strata_primitives::{AccountId, AssetId, ObjectId, ShareType, Timestamp};
use strata_protocol::{CodecError, ProtocolError};
use thiserror::Error;

/// A precondition an operation failed; the transaction is rejected and no
/// state changes
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Paid fee, in core, is below the schedule
    #[error("insufficient fee: required {required}, paid {paid}")]
    InsufficientFee {
        /// Fee computed from the current schedule
        required: ShareType,
        /// Core equivalent of the declared fee
        paid: ShareType,
    },

    /// Fee pool cannot cover a fee paid in a non-core asset
    #[error("fee pool of {asset} exhausted: needs {needed}, holds {available}")]
    FeePoolExhausted {
        /// Asset the fee was paid in
        asset: AssetId,
        /// Core required from the pool
        needed: ShareType,
        /// Core in the pool
        available: ShareType,
    },

    /// Balance would go negative
    #[error("insufficient balance: {account} holds {balance} of {asset}, needs {needed}")]
    InsufficientBalance {
        /// Account
        account: AccountId,
        /// Asset
        asset: AssetId,
        /// Current balance
        balance: ShareType,
        /// Total debited
        needed: ShareType,
    },

    /// Signatures do not satisfy an account's active authority
    #[error("missing active authority of {0}")]
    MissingAuthority(AccountId),

    /// Asset symbol already registered
    #[error("asset symbol {0} already exists")]
    DuplicateSymbol(String),

    /// Account name already registered
    #[error("account name {0} already exists")]
    DuplicateName(String),

    /// Account lacks the prime flag
    #[error("account {0} is not prime")]
    NotPrime(AccountId),

    /// Account already holds the role
    #[error("account {account} is already a {role}")]
    AlreadyRegistered {
        /// Account
        account: AccountId,
        /// Role, e.g. "witness"
        role: &'static str,
    },

    /// Operation needs a committee-proposed transaction
    #[error("operation requires a proposed transaction")]
    NotProposed,

    /// Account does not own the object
    #[error("{account} does not own {object}")]
    NotOwner {
        /// Object acted on
        object: ObjectId,
        /// Acting account
        account: AccountId,
    },

    /// Referenced object does not exist
    #[error("referenced object {0} does not exist")]
    NotFound(ObjectId),

    /// Time lies in the past
    #[error("expiration {expiration} is not after head block time {now}")]
    Expired {
        /// Requested expiration
        expiration: Timestamp,
        /// Head block time
        now: Timestamp,
    },

    /// Asset cannot be used this way
    #[error("asset {asset}: {reason}")]
    InvalidAsset {
        /// Asset
        asset: AssetId,
        /// What was wrong
        reason: &'static str,
    },

    /// Withdrawal above the vested amount
    #[error("withdrawal of {requested} exceeds vested {allowed}")]
    VestingLimit {
        /// Requested amount
        requested: ShareType,
        /// Amount the policy allows
        allowed: ShareType,
    },

    /// Issue would exceed the asset's max supply
    #[error("supply of {asset} would exceed {max_supply}")]
    SupplyExceeded {
        /// Asset
        asset: AssetId,
        /// Declared max supply
        max_supply: ShareType,
    },

    /// Any other failed precondition
    #[error("{0}")]
    Precondition(String),
}

/// Errors loading the initial chain state
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenesisError {
    /// Config could not be read or parsed
    #[error("genesis config: {0}")]
    Config(String),

    /// Key string is neither an address nor a public key
    #[error("invalid key '{key}': {reason}")]
    InvalidKey {
        /// Key as written
        key: String,
        /// Parse error
        reason: String,
    },

    /// Referenced account name is not in the initial accounts
    #[error("unknown account '{0}'")]
    UnknownAccount(String),

    /// Two initial accounts share a name
    #[error("duplicate account name '{0}'")]
    DuplicateName(String),

    /// Initial balances plus treasury exceed the core max supply
    #[error("initial supply {supply} exceeds max supply {max_supply}")]
    SupplyExceeded {
        /// Sum of balances and treasury
        supply: ShareType,
        /// Core max supply
        max_supply: ShareType,
    },

    /// Initial delegate is not prime
    #[error("delegate '{0}' is not a prime account")]
    NotPrime(String),

    /// Initial timestamp not aligned to the block interval
    #[error("initial timestamp {0} is not a multiple of the block interval")]
    InvalidTimestamp(Timestamp),
}

/// Chain errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Malformed operation, transaction or block
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Encoding error
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Signature or key error
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Initial state could not be built
    #[error(transparent)]
    Genesis(#[from] GenesisError),

    /// Operation precondition failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Lookup by id missed
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Unique secondary key already indexed
    #[error("duplicate {object_type} key {key}")]
    DuplicateKey {
        /// Object type
        object_type: &'static str,
        /// Key, debug-formatted
        key: String,
    },

    /// A modifier changed an object's id
    #[error("modifier changed the id of {0}")]
    IdChanged(ObjectId),

    /// An initializer built an object under a different id than allocated
    #[error("initializer built {got} instead of {expected}")]
    IdMismatch {
        /// Allocated id
        expected: ObjectId,
        /// Id of the built object
        got: ObjectId,
    },

    /// Commit failed after validation passed; chain integrity fault
    #[error("commit of {operation} failed: {reason}")]
    CommitFault {
        /// Operation name
        operation: &'static str,
        /// Underlying error
        reason: String,
    },

    /// Block rejected
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    /// Transaction rejected before evaluation
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Operation tag outside the known set
    #[error("unknown operation tag {0}")]
    UnknownOperation(u32),

    /// Commit or rollback without an open session
    #[error("no undo session")]
    NoUndoSession,

    /// Block processing needs all sessions closed
    #[error("an undo session is already open")]
    UndoSessionOpen,

    /// No applied block left to pop
    #[error("no block to pop")]
    NoBlockToPop,

    /// Genesis has not been loaded
    #[error("database not loaded")]
    NotLoaded,
}

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_wraps() {
        let err: ChainError = ValidationError::NotPrime(AccountId::new(4)).into();
        assert_eq!(err.to_string(), "account 1.2.4 is not prime");
        assert!(matches!(err, ChainError::Validation(ValidationError::NotPrime(_))));
    }

    #[test]
    fn test_protocol_error_is_transparent() {
        let err: ChainError = ProtocolError::EmptyTransaction.into();
        assert_eq!(err.to_string(), "transaction has no operations");
    }
}
