//! # strata-e2e
//!
//! End-to-end scenarios for the Strata ledger.
//!
//! ## Design Philosophy
//!
//! 1. **Simple**: a harness owns one chain started from a known genesis
//! 2. **Declarative**: scenarios name accounts, not ids or keys
//! 3. **Isolated**: every scenario starts its own chain in memory
//!
//! ## Usage
//!
//! ```ignore
//! cargo test -p strata-e2e
//! ```

mod builder;
mod harness;
mod scenarios;

pub use builder::{CoreDenom, GenesisBuilder, TrxBuilder};
pub use harness::{
    TestAccount, TestHarness, FUNDED_BALANCE, GENESIS_TIME, INITIAL_TREASURY, PRODUCER,
};

use strata_chain::ChainError;
use strata_crypto::CryptoError;
use strata_protocol::{CodecError, ProtocolError};

/// Test result
pub type E2EResult<T> = Result<T, E2EError>;

/// E2E test errors
#[derive(Debug, thiserror::Error)]
pub enum E2EError {
    /// Setup failed
    #[error("setup failed: {0}")]
    Setup(String),

    /// No account of this name in the harness
    #[error("unknown test account: {0}")]
    UnknownAccount(String),

    /// Chain rejected a transaction or block
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Protocol error
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Codec error
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Crypto error
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Assertion failed
    #[error("assertion failed: {0}")]
    Assertion(String),
}
