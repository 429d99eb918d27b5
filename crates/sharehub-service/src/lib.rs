//! # sharehub-service
//!
//! Use cases of the share server and the admin tool. Services take their
//! dependencies at construction time as `Arc` references or owned config.

pub mod file;
pub mod share;

pub use file::{ArchiveService, DirectoryListing, UploadService};
pub use share::{AccessIntent, AccessService, LinkService, ShareAccess, ShareAdminService};
