//! Storage module for file management
//!
//! Local-disk store for post attachments and profile pictures. Stored files
//! are referenced from the database by JSONB descriptors.

mod local_store;

pub use local_store::{FileDescriptor, LocalStore, StorageKind};
