//! # sharehub-entity
//!
//! Domain entity models for ShareHub. [`share::ShareRecord`] is the in-memory
//! form of one share; [`share::LedgerDocument`] is the durable JSON document
//! both the server and the admin tool read and write.

pub mod share;
