//! Durable storage for committed attachments.
//!
//! [`StorageBackend`] is the contract every backend implements. The bundled
//! [`ObjectStorage`] runs on Apache OpenDAL and covers:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write("key", data)      │ op.read("key.meta.json")           │
//! │ op.read("key")             │ op.delete("key")                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod backend;
mod error;
mod service;

pub use backend::{StorageBackend, StoredFile};
pub use error::StorageError;
pub use service::ObjectStorage;
pub use stowage_shared::StorageProvider;
