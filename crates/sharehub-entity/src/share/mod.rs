//! Share domain entities.

pub mod document;
pub mod model;

pub use document::{DocumentError, LedgerDocument};
pub use model::{CreateShare, ShareRecord, UseLimit, validate_token};
