// Re-export model types, collaborator traits and service functions
pub mod model;
pub mod picker;
pub mod service;
pub mod store;

pub use model::{BlobRef, LocalImage, StoredImage};
pub use picker::{MediaError, MediaPicker};
pub use service::*;
pub use store::{BlobStore, StorageError};
