use fixit_atoms::users::{IdentityError, IdentityProvider, SessionUser};

use crate::gate::verify_email_notice;
use crate::notice::Notice;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Verified user; the shell may be shown.
    SignedIn(SessionUser),
    /// Credentials accepted but the email still needs verifying.
    VerifyEmail(Notice),
    Failed(Notice),
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub async fn submit(&self, identity: &dyn IdentityProvider) -> LoginOutcome {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return LoginOutcome::Failed(Notice::error(
                "Error",
                "Please enter your email and password.",
            ));
        }

        match identity.sign_in(email, &self.password).await {
            Ok(user) if user.email_verified => LoginOutcome::SignedIn(user),
            Ok(_) | Err(IdentityError::EmailNotVerified) => {
                tracing::info!("🔒 Sign-in blocked until {} is verified", email);
                LoginOutcome::VerifyEmail(verify_email_notice())
            }
            Err(e) => {
                tracing::error!("❌ Sign-in failed for {}: {}", email, e);
                LoginOutcome::Failed(Notice::error("Login Failed", e.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Passwords differ; nothing was sent.
    Mismatch(Notice),
    /// Account created and verification email sent; return to login.
    Registered { user: SessionUser, notice: Notice },
    Failed(Notice),
}

impl SignUpForm {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    pub async fn submit(&self, identity: &dyn IdentityProvider) -> SignUpOutcome {
        if self.password != self.confirm_password {
            return SignUpOutcome::Mismatch(Notice::error(
                "Passwords Mismatch",
                "The passwords do not match.",
            ));
        }

        let email = self.email.trim();
        let result = match identity.sign_up(email, &self.password).await {
            Ok(user) => identity.send_verification_email(&user).await.map(|_| user),
            Err(e) => Err(e),
        };

        match result {
            Ok(user) => {
                tracing::info!("✅ Account created for {}, verification pending", email);
                SignUpOutcome::Registered {
                    user,
                    notice: Notice::success(
                        "Sign-Up Successful",
                        "A verification email has been sent. Please verify your email before logging in.",
                    ),
                }
            }
            Err(e) => {
                tracing::error!("❌ Sign-up failed for {}: {}", email, e);
                SignUpOutcome::Failed(Notice::error("Sign-Up Failed", e.to_string()))
            }
        }
    }
}
