use async_trait::async_trait;
use tokio::sync::watch;

use super::model::SessionUser;

/// Failures reported by the identity provider.
///
/// `Display` renders the provider's own message so view models can surface
/// it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("{message}")]
    Rejected { code: String, message: String },
    #[error("Please verify your email before logging in.")]
    EmailNotVerified,
    #[error("No user is signed in.")]
    NoSession,
    #[error("{0}")]
    Service(String),
}

impl IdentityError {
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        IdentityError::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Identity collaborator consumed by the app.
///
/// Implementations own token storage and refresh. Session changes are
/// published through a watch channel: every receiver handed out by
/// [`IdentityProvider::session`] sees the latest session and each change,
/// and dropping the receiver unsubscribes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError>;

    async fn send_verification_email(&self, user: &SessionUser) -> Result<(), IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    fn session(&self) -> watch::Receiver<Option<SessionUser>>;

    fn current_session(&self) -> Option<SessionUser> {
        let session = self.session();
        let current = session.borrow().clone();
        current
    }
}
