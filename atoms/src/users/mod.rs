pub mod identity;
pub mod model;

pub use identity::{IdentityError, IdentityProvider};
pub use model::SessionUser;
