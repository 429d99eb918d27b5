//! File operations on an authorized share.

pub mod archive;
pub mod listing;
pub mod upload;

pub use archive::ArchiveService;
pub use listing::DirectoryListing;
pub use upload::UploadService;
