//! Access evaluation.
//!
//! A pure decision over a share record and the current time. The caller
//! decides whether the returned mutation is applied (only requests that
//! consume a use apply it).

use chrono::{DateTime, Utc};

use sharehub_entity::share::{ShareRecord, UseLimit};

/// Ledger change implied by an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Leave the record untouched.
    None,
    /// Consume one use.
    Decrement,
    /// Remove the record from the ledger.
    Delete,
}

/// Outcome of evaluating a request against a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Serve the request, applying the mutation if the request consumes a use.
    Serve(Mutation),
    /// The share is exhausted or past its expiration; it is to be deleted.
    Expired,
    /// No share exists for the token.
    NotFound,
}

impl Decision {
    /// The mutation to apply when the request consumes a use.
    pub fn mutation(&self) -> Mutation {
        match self {
            Self::Serve(mutation) => *mutation,
            Self::Expired => Mutation::Delete,
            Self::NotFound => Mutation::None,
        }
    }
}

/// Decide whether a request against `record` may be served at `now`.
pub fn evaluate(record: Option<&ShareRecord>, now: DateTime<Utc>) -> Decision {
    let Some(record) = record else {
        return Decision::NotFound;
    };

    if record.uses.is_exhausted() || record.is_expired_at(now) {
        return Decision::Expired;
    }

    match record.uses {
        UseLimit::Remaining(_) => Decision::Serve(Mutation::Decrement),
        UseLimit::Unlimited => Decision::Serve(Mutation::None),
    }
}
