//! In-memory collaborators with call counters, for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::media::{BlobRef, BlobStore, LocalImage, MediaError, MediaPicker, StorageError};
use crate::reports::{ReportRecord, ReportStore};
use crate::users::{IdentityError, IdentityProvider, SessionUser};

/// Smallest payload the image sniffer accepts as PNG.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

// ========== IDENTITY ==========

struct Account {
    user_id: String,
    password: String,
    verified: bool,
}

pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    session: watch::Sender<Option<SessionUser>>,
    next_id: AtomicUsize,
    sign_in_calls: AtomicUsize,
    sign_up_calls: AtomicUsize,
    verification_emails: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session,
            next_id: AtomicUsize::new(1),
            sign_in_calls: AtomicUsize::new(0),
            sign_up_calls: AtomicUsize::new(0),
            verification_emails: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_account(self, email: &str, password: &str, verified: bool) -> Self {
        let user_id = self.allocate_id();
        self.accounts.lock().insert(
            email.to_string(),
            Account {
                user_id,
                password: password.to_string(),
                verified,
            },
        );
        self
    }

    pub fn set_verified(&self, email: &str, verified: bool) {
        if let Some(account) = self.accounts.lock().get_mut(email) {
            account.verified = verified;
        }
    }

    /// Push a session change as if it originated at the provider.
    pub fn publish(&self, session: Option<SessionUser>) {
        self.session.send_replace(session);
    }

    pub fn subscriber_count(&self) -> usize {
        self.session.receiver_count()
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_up_calls(&self) -> usize {
        self.sign_up_calls.load(Ordering::SeqCst)
    }

    pub fn verification_emails_sent(&self) -> usize {
        self.verification_emails.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.sign_in_calls() + self.sign_up_calls() + self.verification_emails_sent() + self.sign_out_calls()
    }

    fn allocate_id(&self) -> String {
        format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        let user = {
            let accounts = self.accounts.lock();
            match accounts.get(email) {
                Some(account) if account.password == password => SessionUser {
                    user_id: account.user_id.clone(),
                    email: email.to_string(),
                    email_verified: account.verified,
                },
                _ => {
                    return Err(IdentityError::rejected(
                        "NotAuthorizedException",
                        "Incorrect username or password.",
                    ))
                }
            }
        };

        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionUser, IdentityError> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);

        if password.len() < 6 {
            return Err(IdentityError::rejected(
                "InvalidPasswordException",
                "Password did not conform with policy: Password not long enough",
            ));
        }

        let user_id = self.allocate_id();
        {
            let mut accounts = self.accounts.lock();
            if accounts.contains_key(email) {
                return Err(IdentityError::rejected(
                    "UsernameExistsException",
                    "An account with the given email already exists.",
                ));
            }
            accounts.insert(
                email.to_string(),
                Account {
                    user_id: user_id.clone(),
                    password: password.to_string(),
                    verified: false,
                },
            );
        }

        let user = SessionUser {
            user_id,
            email: email.to_string(),
            email_verified: false,
        };
        self.publish(Some(user.clone()));
        Ok(user)
    }

    async fn send_verification_email(&self, _user: &SessionUser) -> Result<(), IdentityError> {
        self.verification_emails.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.publish(None);
        Ok(())
    }

    fn session(&self) -> watch::Receiver<Option<SessionUser>> {
        self.session.subscribe()
    }
}

// ========== BLOBS ==========

pub const MEMORY_BLOB_BASE: &str = "memory://blobs/";

struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<String, StoredBlob>>,
    fail_listing: AtomicBool,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    list_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        self.objects.lock().insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: "image/png".to_string(),
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().contains_key(key)
    }

    pub fn bytes_of(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).map(|b| b.bytes.clone())
    }

    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects.lock().get(key).map(|b| b.content_type.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    pub fn url_for(key: &str) -> String {
        format!("{}{}", MEMORY_BLOB_BASE, key)
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list_children(&self, namespace: &str) -> Result<Vec<BlobRef>, StorageError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StorageError::Service("Network request failed".to_string()));
        }

        let prefix = format!("{}/", namespace.trim_end_matches('/'));
        Ok(self
            .objects
            .lock()
            .keys()
            .filter(|k| k.strip_prefix(&prefix).is_some_and(|rest| !rest.contains('/')))
            .map(|k| BlobRef::new(k.clone()))
            .collect())
    }

    async fn retrieval_url(&self, blob: &BlobRef) -> Result<String, StorageError> {
        if self.contains(&blob.key) {
            Ok(Self::url_for(&blob.key))
        } else {
            Err(StorageError::NotFound(blob.key.clone()))
        }
    }

    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobRef, StorageError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Service("Network request failed".to_string()));
        }

        self.objects.lock().insert(
            key.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(BlobRef::new(key))
    }

    async fn delete(&self, blob: &BlobRef) -> Result<(), StorageError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Service("Network request failed".to_string()));
        }

        match self.objects.lock().remove(&blob.key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(blob.key.clone())),
        }
    }

    fn reference_from_url(&self, url: &str) -> Result<BlobRef, StorageError> {
        url.strip_prefix(MEMORY_BLOB_BASE)
            .filter(|key| !key.is_empty())
            .map(BlobRef::new)
            .ok_or_else(|| StorageError::InvalidReference(url.to_string()))
    }
}

// ========== REPORT RECORDS ==========

#[derive(Default)]
pub struct MemoryReportStore {
    records: Mutex<BTreeMap<(String, String), ReportRecord>>,
    fail_puts: AtomicBool,
    fail_listing: AtomicBool,
    put_calls: AtomicUsize,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ReportRecord> {
        self.records.lock().values().cloned().collect()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn put_report(&self, record: &ReportRecord) -> Result<(), StorageError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Service("Table unavailable".to_string()));
        }
        self.records.lock().insert(
            (record.user_id.clone(), record.report_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn list_reports(&self, user_id: &str) -> Result<Vec<ReportRecord>, StorageError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StorageError::Service("Table unavailable".to_string()));
        }
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn delete_report(&self, user_id: &str, report_id: &str) -> Result<(), StorageError> {
        self.records
            .lock()
            .remove(&(user_id.to_string(), report_id.to_string()));
        Ok(())
    }
}

// ========== PICKER ==========

/// Picker that hands out a preset selection and payload.
#[derive(Default)]
pub struct StaticPicker {
    selection: Mutex<Option<LocalImage>>,
    bytes: Mutex<Option<Vec<u8>>>,
    pick_calls: AtomicUsize,
}

impl StaticPicker {
    pub fn selecting(uri: &str, bytes: &[u8]) -> Self {
        Self {
            selection: Mutex::new(Some(LocalImage::new(uri))),
            bytes: Mutex::new(Some(bytes.to_vec())),
            pick_calls: AtomicUsize::new(0),
        }
    }

    pub fn cancelling() -> Self {
        Self::default()
    }

    pub fn set_bytes(&self, bytes: Option<Vec<u8>>) {
        *self.bytes.lock() = bytes;
    }

    pub fn pick_calls(&self) -> usize {
        self.pick_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaPicker for StaticPicker {
    async fn pick_image(&self) -> Result<Option<LocalImage>, MediaError> {
        self.pick_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.selection.lock().clone())
    }

    async fn read_image(&self, image: &LocalImage) -> Result<Vec<u8>, MediaError> {
        self.bytes.lock().clone().ok_or_else(|| MediaError::Unreadable {
            uri: image.uri.clone(),
            message: "file no longer exists".to_string(),
        })
    }
}
