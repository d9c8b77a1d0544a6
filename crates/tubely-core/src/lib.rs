//! Tubely Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! record-store seam shared by the storage, processing, and CLI crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod media_type;
pub mod models;
pub mod repository;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, UploadServiceConfig, UrlMode};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use media_type::parse_media_type;
pub use models::{Orientation, StorageObject, VideoRecord, VideoView};
pub use repository::{InMemoryVideoRepository, VideoRepository};
pub use storage_types::StorageBackend;
