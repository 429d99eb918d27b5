//! Share access and administration.

pub mod access;
pub mod expiry;
pub mod link;
pub mod service;

pub use access::{AccessIntent, AccessService, ShareAccess};
pub use expiry::parse_expiry;
pub use link::LinkService;
pub use service::{AddShare, EditShare, ShareAdminService, ShareOverview};
