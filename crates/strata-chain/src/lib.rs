//! # strata-chain
//!
//! Chain state for the Strata ledger.
//!
//! This crate provides:
//! - [`Index`] - ordered per-type object containers with observers
//! - [`Database`] - the typed object store with nested undo sessions
//! - [`evaluator`] - two-phase validate/commit evaluation of every operation
//! - Transaction and block application, block production and popping
//! - [`GenesisConfig`] and [`DatabaseConfig`] - initial state and options
//! - [`ChainHandle`] - the database shared between threads

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod genesis;
pub mod index;
pub mod object;
pub mod objects;
pub mod shared;
pub mod store;
pub mod undo;

// Re-export commonly used types
pub use config::DatabaseConfig;
pub use database::{ChainObserver, Database, SupplyAudit};
pub use error::{ChainError, ChainResult, GenesisError, ValidationError};
pub use evaluator::{
    apply_operation, validate_operation, EvalContext, Evaluator, OperationResult, StagedDeltas,
    TransactionEvalState,
};
pub use executor::{initial_secret_hash, witness_secret, SkipFlags};
pub use genesis::{GenesisAccount, GenesisConfig, GenesisDelegate, GenesisWitness};
pub use index::{Index, IndexObserver};
pub use object::Object;
pub use shared::ChainHandle;
pub use store::AnyObject;
