use std::fmt;
use std::sync::Arc;

use fixit_atoms::users::{IdentityError, SessionUser};
use parking_lot::Mutex;

use crate::gate::{verify_email_notice, GateDecision};
use crate::login::{LoginForm, LoginOutcome, SignUpForm, SignUpOutcome};
use crate::notice::Notice;
use crate::session::{Services, SessionSubscription};
use crate::tabs::TabsView;

/// Top-level screen.
#[derive(Clone)]
pub enum Screen {
    Login { notice: Option<Notice> },
    SignUp,
    Tabs(Arc<TabsView>),
}

impl Screen {
    pub fn is_login(&self) -> bool {
        matches!(self, Screen::Login { .. })
    }

    pub fn is_tabs(&self) -> bool {
        matches!(self, Screen::Tabs(_))
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Login { notice } => f.debug_struct("Login").field("notice", notice).finish(),
            Screen::SignUp => f.write_str("SignUp"),
            Screen::Tabs(tabs) => f.debug_tuple("Tabs").field(&tabs.user().user_id).finish(),
        }
    }
}

struct ShellInner {
    services: Services,
    screen: Mutex<Screen>,
}

impl ShellInner {
    fn apply_session(&self, session: Option<SessionUser>) {
        let mut screen = self.screen.lock();

        match GateDecision::decide(session.as_ref()) {
            GateDecision::Login => {
                if screen.is_tabs() {
                    tracing::info!("👋 Session ended, back to login");
                    *screen = Screen::Login { notice: None };
                }
            }
            GateDecision::VerifyEmail(user) => match &*screen {
                // the sign-up and sign-in flows set their own notice
                Screen::SignUp | Screen::Login { notice: Some(_) } => {}
                _ => {
                    tracing::info!("🔒 {} must verify their email first", user.email);
                    *screen = Screen::Login {
                        notice: Some(verify_email_notice()),
                    };
                }
            },
            GateDecision::Tabs(user) => {
                if let Screen::Tabs(tabs) = &*screen {
                    if tabs.user().user_id == user.user_id {
                        return;
                    }
                }

                tracing::info!("✅ Opening tabs for {}", user.user_id);
                let tabs = Arc::new(TabsView::new(&user, self.services.clone()));
                *screen = Screen::Tabs(tabs.clone());
                drop(screen);

                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move { tabs.mount().await });
                    }
                    Err(_) => tracing::warn!("⚠️ No runtime, feeds for {} not loaded", user.user_id),
                }
            }
        }
    }
}

/// Root of the app: follows the identity session and owns the current screen.
pub struct AppShell {
    inner: Arc<ShellInner>,
    _subscription: SessionSubscription,
}

impl AppShell {
    /// Build the shell and subscribe to the session. The subscription ends
    /// when the shell is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(services: Services) -> Self {
        let inner = Arc::new(ShellInner {
            services: services.clone(),
            screen: Mutex::new(Screen::Login { notice: None }),
        });

        let listener = inner.clone();
        let subscription = services
            .session()
            .subscribe(move |session| listener.apply_session(session));

        Self {
            inner,
            _subscription: subscription,
        }
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    pub fn screen(&self) -> Screen {
        self.inner.screen.lock().clone()
    }

    pub fn tabs(&self) -> Option<Arc<TabsView>> {
        match &*self.inner.screen.lock() {
            Screen::Tabs(tabs) => Some(tabs.clone()),
            _ => None,
        }
    }

    /// Re-evaluate the gate for `session`. Applying the same session twice
    /// leaves the screen as it is.
    pub fn apply_session(&self, session: Option<SessionUser>) {
        self.inner.apply_session(session);
    }

    pub fn open_sign_up(&self) {
        let mut screen = self.inner.screen.lock();
        if screen.is_login() {
            *screen = Screen::SignUp;
        }
    }

    pub fn back_to_login(&self) {
        let mut screen = self.inner.screen.lock();
        if matches!(*screen, Screen::SignUp) {
            *screen = Screen::Login { notice: None };
        }
    }

    pub async fn sign_in(&self, form: &LoginForm) -> LoginOutcome {
        let outcome = form.submit(self.inner.services.identity.as_ref()).await;
        match &outcome {
            LoginOutcome::SignedIn(user) => self.apply_session(Some(user.clone())),
            LoginOutcome::VerifyEmail(notice) | LoginOutcome::Failed(notice) => {
                let mut screen = self.inner.screen.lock();
                if !screen.is_tabs() {
                    *screen = Screen::Login {
                        notice: Some(notice.clone()),
                    };
                }
            }
        }
        outcome
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> SignUpOutcome {
        let outcome = form.submit(self.inner.services.identity.as_ref()).await;
        if let SignUpOutcome::Registered { notice, .. } = &outcome {
            *self.inner.screen.lock() = Screen::Login {
                notice: Some(notice.clone()),
            };
        }
        outcome
    }

    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        if let Err(e) = self.inner.services.identity.sign_out().await {
            tracing::error!("❌ Sign-out failed: {}", e);
            return Err(e);
        }
        self.apply_session(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixit_atoms::testing::{MemoryBlobStore, MemoryIdentity, StaticPicker, PNG_BYTES};
    use std::time::Duration;

    struct Fixture {
        identity: Arc<MemoryIdentity>,
        blobs: Arc<MemoryBlobStore>,
        shell: AppShell,
    }

    fn start(identity: MemoryIdentity) -> Fixture {
        let identity = Arc::new(identity);
        let blobs = Arc::new(MemoryBlobStore::new());
        blobs.insert("images/user-1/1", PNG_BYTES.to_vec());
        let shell = AppShell::start(Services {
            identity: identity.clone(),
            blobs: blobs.clone(),
            picker: Arc::new(StaticPicker::cancelling()),
            reports: None,
        });
        Fixture {
            identity,
            blobs,
            shell,
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn starts_on_login_without_a_session() {
        let fx = start(MemoryIdentity::new());
        assert!(matches!(fx.shell.screen(), Screen::Login { notice: None }));
        assert_eq!(fx.identity.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn unverified_user_never_reaches_tabs() {
        let fx = start(MemoryIdentity::new().with_account("ada@example.ie", "secret1", false));

        let outcome = fx
            .shell
            .sign_in(&LoginForm::new("ada@example.ie", "secret1"))
            .await;
        settle().await;

        assert!(matches!(outcome, LoginOutcome::VerifyEmail(_)));
        match fx.shell.screen() {
            Screen::Login { notice: Some(n) } => assert_eq!(n.title, "Email Not Verified"),
            other => panic!("unexpected screen {:?}", other),
        }
        assert!(fx.shell.tabs().is_none());
        assert_eq!(fx.blobs.list_calls(), 0);
    }

    #[tokio::test]
    async fn verified_sign_in_opens_and_mounts_tabs() {
        let fx = start(MemoryIdentity::new().with_account("ada@example.ie", "secret1", true));

        fx.shell
            .sign_in(&LoginForm::new("ada@example.ie", "secret1"))
            .await;
        settle().await;

        let tabs = fx.shell.tabs().expect("tabs should be open");
        assert_eq!(tabs.user().email, "ada@example.ie");
        assert_eq!(tabs.home.feed.len(), 1);
        assert_eq!(fx.blobs.list_calls(), 3);
    }

    #[tokio::test]
    async fn applying_the_same_session_keeps_the_tabs() {
        let fx = start(MemoryIdentity::new());
        let user = SessionUser {
            user_id: "user-1".into(),
            email: "ada@example.ie".into(),
            email_verified: true,
        };

        fx.shell.apply_session(Some(user.clone()));
        let first = fx.shell.tabs().unwrap();
        fx.shell.apply_session(Some(user));
        let second = fx.shell.tabs().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn sign_out_returns_to_login_and_drops_tabs() {
        let fx = start(MemoryIdentity::new().with_account("ada@example.ie", "secret1", true));
        fx.shell
            .sign_in(&LoginForm::new("ada@example.ie", "secret1"))
            .await;
        settle().await;
        let tabs = fx.shell.tabs().unwrap();

        fx.shell.sign_out().await.unwrap();
        settle().await;

        assert!(matches!(fx.shell.screen(), Screen::Login { notice: None }));
        assert!(fx.shell.tabs().is_none());
        assert_eq!(fx.identity.sign_out_calls(), 1);
        // the shell no longer holds the old view state
        assert_eq!(Arc::strong_count(&tabs), 1);
    }

    #[tokio::test]
    async fn sign_up_returns_to_login_with_notice() {
        let fx = start(MemoryIdentity::new());
        fx.shell.open_sign_up();
        assert!(matches!(fx.shell.screen(), Screen::SignUp));

        let outcome = fx
            .shell
            .sign_up(&SignUpForm::new("ada@example.ie", "secret1", "secret1"))
            .await;
        settle().await;

        assert!(matches!(outcome, SignUpOutcome::Registered { .. }));
        match fx.shell.screen() {
            Screen::Login { notice: Some(n) } => assert_eq!(n.title, "Sign-Up Successful"),
            other => panic!("unexpected screen {:?}", other),
        }
        assert!(fx.shell.tabs().is_none());
    }

    #[tokio::test]
    async fn verifying_after_sign_up_lets_the_user_in() {
        let fx = start(MemoryIdentity::new());
        fx.shell.open_sign_up();
        fx.shell
            .sign_up(&SignUpForm::new("ada@example.ie", "secret1", "secret1"))
            .await;
        settle().await;
        assert!(fx.shell.tabs().is_none());

        fx.identity.set_verified("ada@example.ie", true);
        let outcome = fx
            .shell
            .sign_in(&LoginForm::new("ada@example.ie", "secret1"))
            .await;
        settle().await;

        assert!(matches!(outcome, LoginOutcome::SignedIn(_)));
        assert!(fx.shell.screen().is_tabs());
    }

    #[tokio::test]
    async fn mismatched_sign_up_stays_put() {
        let fx = start(MemoryIdentity::new());
        fx.shell.open_sign_up();
        fx.shell
            .sign_up(&SignUpForm::new("ada@example.ie", "a", "b"))
            .await;
        assert!(matches!(fx.shell.screen(), Screen::SignUp));

        fx.shell.back_to_login();
        assert!(fx.shell.screen().is_login());
    }

    #[tokio::test]
    async fn dropping_the_shell_unsubscribes() {
        let fx = start(MemoryIdentity::new());
        let identity = fx.identity.clone();
        drop(fx);
        settle().await;
        assert_eq!(identity.subscriber_count(), 0);
    }
}
