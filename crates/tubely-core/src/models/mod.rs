//! Data models for the application
//!
//! Each sub-module represents a specific feature area.

mod orientation;
mod storage;
mod video;

// Re-export all models for convenient imports
pub use orientation::Orientation;
pub use storage::StorageObject;
pub use video::{VideoRecord, VideoView};
