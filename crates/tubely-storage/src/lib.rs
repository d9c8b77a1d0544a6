//! Tubely Storage Library
//!
//! This crate provides the durable-store abstraction and its implementations
//! (S3 and local filesystem), storage key derivation, and the resolver that
//! turns stored object references into client URLs.
//!
//! # Storage key format
//!
//! Video keys are `{orientation}/{token}{ext}` where orientation is one of
//! `landscape`, `portrait`, `other` and `token` is 32 random bytes encoded
//! as URL-safe base64. Thumbnail keys are `thumbnails/{token}{ext}`.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod resolver;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use factory::create_assets_storage;
pub use keys::{derive_key, derive_thumbnail_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use resolver::{LocatorResolver, ResolveError, ResolverConfig};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
