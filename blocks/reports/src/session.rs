use std::sync::Arc;

use fixit_atoms::media::{BlobStore, MediaPicker};
use fixit_atoms::reports::ReportStore;
use fixit_atoms::users::{IdentityProvider, SessionUser};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Collaborators handed to every view model that needs them.
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub picker: Arc<dyn MediaPicker>,
    /// Report metadata store; `None` keeps uploads image-only.
    pub reports: Option<Arc<dyn ReportStore>>,
}

impl Services {
    pub fn session(&self) -> SessionContext {
        SessionContext::new(self.identity.clone())
    }
}

type Callback = Box<dyn FnMut(Option<SessionUser>) + Send>;

/// Observable view of the identity provider's session.
#[derive(Clone)]
pub struct SessionContext {
    identity: Arc<dyn IdentityProvider>,
}

impl SessionContext {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    pub fn current(&self) -> Option<SessionUser> {
        self.identity.current_session()
    }

    /// Call `callback` with the current session and then with every change,
    /// until the returned subscription is released or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F>(&self, callback: F) -> SessionSubscription
    where
        F: FnMut(Option<SessionUser>) + Send + 'static,
    {
        let mut rx = self.identity.session();
        let slot: Arc<Mutex<Option<Callback>>> = Arc::new(Mutex::new(Some(Box::new(callback))));

        let initial = rx.borrow_and_update().clone();
        if let Some(cb) = slot.lock().as_mut() {
            cb(initial);
        }

        let task_slot = slot.clone();
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let session = rx.borrow_and_update().clone();
                match task_slot.lock().as_mut() {
                    Some(cb) => cb(session),
                    None => break,
                }
            }
        });

        SessionSubscription {
            slot,
            task: Some(task),
        }
    }
}

/// Handle to a live session subscription. Dropping it unsubscribes.
pub struct SessionSubscription {
    slot: Arc<Mutex<Option<Callback>>>,
    task: Option<JoinHandle<()>>,
}

impl SessionSubscription {
    /// Stop delivery. Once this returns the callback has been dropped and
    /// will never run again.
    pub fn release(&mut self) {
        self.slot.lock().take();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixit_atoms::testing::MemoryIdentity;
    use std::time::Duration;

    fn user(id: &str) -> SessionUser {
        SessionUser {
            user_id: id.to_string(),
            email: format!("{}@example.ie", id),
            email_verified: true,
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn delivers_current_value_then_changes() {
        let identity = Arc::new(MemoryIdentity::new());
        let ctx = SessionContext::new(identity.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let _sub = ctx.subscribe(move |s| sink.lock().push(s.map(|u| u.user_id)));

        identity.publish(Some(user("a")));
        settle().await;
        identity.publish(None);
        settle().await;

        assert_eq!(*seen.lock(), vec![None, Some("a".to_string()), None]);
    }

    #[tokio::test]
    async fn no_callbacks_after_release() {
        let identity = Arc::new(MemoryIdentity::new());
        let ctx = SessionContext::new(identity.clone());
        let count = Arc::new(Mutex::new(0));

        let sink = count.clone();
        let mut sub = ctx.subscribe(move |_| *sink.lock() += 1);
        assert!(sub.is_active());
        sub.release();
        assert!(!sub.is_active());

        identity.publish(Some(user("a")));
        settle().await;
        assert_eq!(*count.lock(), 1);
    }

    #[tokio::test]
    async fn dropping_the_subscription_releases_the_receiver() {
        let identity = Arc::new(MemoryIdentity::new());
        let ctx = SessionContext::new(identity.clone());

        let sub = ctx.subscribe(|_| {});
        settle().await;
        assert_eq!(identity.subscriber_count(), 1);

        drop(sub);
        settle().await;
        assert_eq!(identity.subscriber_count(), 0);
    }
}
