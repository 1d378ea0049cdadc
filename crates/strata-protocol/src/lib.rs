//! # strata-protocol
//!
//! Protocol types for the Strata ledger.
//!
//! This crate provides:
//! - [`Operation`] - the closed set of state transitions and their stateless checks
//! - [`FeeSchedule`] and [`ChainParameters`] - consensus parameters
//! - [`SignedTransaction`] - ordered operations plus signatures
//! - [`SignedBlock`] - header, witness signature and transactions, with digest and id
//! - [`Envelope`] - typed wire container for gossip messages
//! - [`codec`] - canonical binary encoding

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asset;
pub mod authority;
pub mod block;
pub mod chain_parameters;
pub mod codec;
pub mod error;
pub mod fee_schedule;
pub mod message;
pub mod operations;
pub mod transaction;

// Re-export commonly used types
pub use asset::{Asset, Price};
pub use authority::Authority;
pub use block::{BlockHeader, BlockId, SignedBlock};
pub use chain_parameters::{ChainParameters, COMMITTEE_ACCOUNT};
pub use error::{CodecError, CodecResult, ProtocolError, ProtocolResult};
pub use fee_schedule::FeeSchedule;
pub use message::{BlockMessage, Envelope, Tagged, TransactionMessage};
pub use operations::{Operation, OperationBody};
pub use transaction::{SignedTransaction, Transaction, TransactionId};
