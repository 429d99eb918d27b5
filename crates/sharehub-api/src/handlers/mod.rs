//! Request handlers.

pub mod share;
