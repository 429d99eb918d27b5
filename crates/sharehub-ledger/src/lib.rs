//! # sharehub-ledger
//!
//! The token → share mapping and its durable backing.
//!
//! A single [`Ledger`] instance is held by the server process. Every mutation
//! runs under one exclusive lock and is flushed to the [`LedgerStore`] before
//! it becomes visible in memory, so two concurrent requests can never both
//! consume the last use of a share.

pub mod error;
pub mod evaluator;
pub mod ledger;
pub mod store;

pub use error::LedgerError;
pub use evaluator::{Decision, Mutation, evaluate};
pub use ledger::{AccessOutcome, Ledger, LedgerOptions};
pub use store::{JsonFileStore, LedgerStore, MemoryStore, StoreFingerprint};
