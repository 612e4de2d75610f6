//! Domain atoms for the FixIt client: sessions, media blobs and reports.
//!
//! Atoms define models and the collaborator seams. Logic here takes its
//! collaborators as arguments and never reaches for global state.

pub mod media;
pub mod reports;
pub mod users;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
