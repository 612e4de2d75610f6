use fixit_atoms::users::SessionUser;

use crate::notice::Notice;

/// Where the identity gate sends the user for a given session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// No session: show the login screen, dropping any view state.
    Login,
    /// Signed in but the email is unverified: stay out of the app.
    VerifyEmail(SessionUser),
    /// Verified session: show the tabbed shell.
    Tabs(SessionUser),
}

impl GateDecision {
    pub fn decide(session: Option<&SessionUser>) -> Self {
        match session {
            None => GateDecision::Login,
            Some(user) if !user.email_verified => GateDecision::VerifyEmail(user.clone()),
            Some(user) => GateDecision::Tabs(user.clone()),
        }
    }

    pub fn grants_access(&self) -> bool {
        matches!(self, GateDecision::Tabs(_))
    }
}

pub fn verify_email_notice() -> Notice {
    Notice::info(
        "Email Not Verified",
        "Please verify your email before logging in. Check your inbox for the verification link.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(verified: bool) -> SessionUser {
        SessionUser {
            user_id: "u1".into(),
            email: "ada@example.ie".into(),
            email_verified: verified,
        }
    }

    #[test]
    fn only_verified_sessions_get_in() {
        assert_eq!(GateDecision::decide(None), GateDecision::Login);
        assert_eq!(
            GateDecision::decide(Some(&user(false))),
            GateDecision::VerifyEmail(user(false))
        );
        assert!(!GateDecision::decide(Some(&user(false))).grants_access());
        assert!(GateDecision::decide(Some(&user(true))).grants_access());
    }
}
