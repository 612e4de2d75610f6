use serde::{Deserialize, Serialize};

/// Principal issued by the identity provider.
///
/// The app only observes this value; creating, refreshing and revoking it is
/// the provider's business.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub email: String,
    pub email_verified: bool,
}

impl SessionUser {
    /// Name shown in greetings and report cards.
    ///
    /// Reports carry no reporter profile, so every reporter is shown as "User".
    pub fn display_name(&self) -> &'static str {
        "User"
    }
}
