use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use fixit_atoms::media::{self, StorageError};
use fixit_atoms::reports::{ReportListItem, ReportRecord, ReportStatus};
use fixit_atoms::users::SessionUser;
use parking_lot::Mutex;

use crate::session::Services;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedLayout {
    /// Thumbnail strip on the home tab.
    Horizontal,
    /// Full cards on the reports and upload tabs.
    Vertical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedFilter {
    #[default]
    Trending,
    New,
    Dangerous,
    Solved,
    Pending,
}

impl FeedFilter {
    pub fn all() -> &'static [FeedFilter] {
        &[
            FeedFilter::Trending,
            FeedFilter::New,
            FeedFilter::Dangerous,
            FeedFilter::Solved,
            FeedFilter::Pending,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedFilter::Trending => "Trending",
            FeedFilter::New => "New",
            FeedFilter::Dangerous => "Dangerous",
            FeedFilter::Solved => "Solved",
            FeedFilter::Pending => "Pending",
        }
    }
}

#[derive(Default)]
struct FeedState {
    items: Vec<ReportListItem>,
    refreshing: bool,
}

/// One user's report list, loaded from the blob collaborator.
pub struct ReportFeed {
    user_id: String,
    layout: FeedLayout,
    services: Services,
    state: Mutex<FeedState>,
    generation: AtomicU64,
}

impl ReportFeed {
    pub fn new(user: &SessionUser, layout: FeedLayout, services: Services) -> Self {
        Self {
            user_id: user.user_id.clone(),
            layout,
            services,
            state: Mutex::new(FeedState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn layout(&self) -> FeedLayout {
        self.layout
    }

    pub fn items(&self) -> Vec<ReportListItem> {
        self.state.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    /// Items as shown under `filter`.
    pub fn visible(&self, filter: FeedFilter) -> Vec<ReportListItem> {
        let mut items = self.items();
        match filter {
            FeedFilter::Solved => items.retain(|i| i.status == ReportStatus::Solved),
            FeedFilter::Pending => items.retain(|i| i.status == ReportStatus::Pending),
            FeedFilter::New => {
                items.sort_by_key(|i| std::cmp::Reverse(i.report_id().parse::<i64>().unwrap_or(0)))
            }
            FeedFilter::Trending | FeedFilter::Dangerous => {}
        }
        items
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the list if no newer operation has started since `generation`.
    fn commit(&self, generation: u64, items: Vec<ReportListItem>) -> bool {
        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        state.items = items;
        true
    }

    /// Fetch the list. Returns whether the result was applied; a result
    /// overtaken by a newer load or a local change is dropped.
    pub async fn load(&self) -> Result<bool, StorageError> {
        let generation = self.begin();

        match self.fetch_items().await {
            Ok(items) => {
                let count = items.len();
                let applied = self.commit(generation, items);
                if applied {
                    tracing::info!("📥 Loaded {} reports for user {}", count, self.user_id);
                } else {
                    tracing::debug!("Discarded stale report list for user {}", self.user_id);
                }
                Ok(applied)
            }
            Err(e) => {
                tracing::error!("❌ Failed to load reports for user {}: {}", self.user_id, e);
                Err(e)
            }
        }
    }

    /// Pull-to-refresh. The refreshing flag is cleared whatever the outcome.
    pub async fn refresh(&self) -> Result<bool, StorageError> {
        self.state.lock().refreshing = true;
        let result = self.load().await;
        self.state.lock().refreshing = false;
        result
    }

    /// Delete the report behind `url`. The entry leaves the list only after
    /// the blob collaborator acknowledges the delete. Only URLs in this
    /// feed's own namespace are accepted.
    pub async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let blob = match media::delete_by_url(self.services.blobs.as_ref(), &self.user_id, url).await {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!("❌ Failed to delete {}: {}", url, e);
                return Err(e);
            }
        };

        {
            let mut state = self.state.lock();
            if let Some(pos) = state.items.iter().position(|i| i.url == url) {
                state.items.remove(pos);
            }
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
        tracing::info!("✅ Deleted report {}", blob.key);

        if let Some(store) = &self.services.reports {
            let report_id = media::model::report_id_from_key(&blob.key);
            if let Err(e) = store.delete_report(&self.user_id, report_id).await {
                tracing::warn!("⚠️ Report record {} not deleted: {}", report_id, e);
            }
        }
        Ok(())
    }

    /// Append a freshly uploaded report.
    pub fn push(&self, item: ReportListItem) {
        let mut state = self.state.lock();
        state.items.push(item);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    async fn fetch_items(&self) -> Result<Vec<ReportListItem>, StorageError> {
        let images = media::list_images(self.services.blobs.as_ref(), &self.user_id);

        let Some(store) = &self.services.reports else {
            let images = images.await?;
            return Ok(images.into_iter().map(ReportListItem::placeholder).collect());
        };

        let (images, records) = futures::join!(images, store.list_reports(&self.user_id));
        let images = images?;
        let mut by_key: HashMap<String, ReportRecord> = match records {
            Ok(records) => records
                .into_iter()
                .map(|r| (r.image_key.clone(), r))
                .collect(),
            Err(e) => {
                tracing::warn!("⚠️ Report records unavailable for {}: {}", self.user_id, e);
                HashMap::new()
            }
        };

        Ok(images
            .into_iter()
            .map(|image| match by_key.remove(&image.key) {
                Some(record) => ReportListItem::from_record(image, record),
                None => ReportListItem::placeholder(image),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixit_atoms::media::StoredImage;
    use fixit_atoms::reports::{Address, Category, ReportStore};
    use fixit_atoms::testing::{
        MemoryBlobStore, MemoryIdentity, MemoryReportStore, StaticPicker, PNG_BYTES,
    };
    use std::sync::Arc;

    fn user() -> SessionUser {
        SessionUser {
            user_id: "u1".into(),
            email: "ada@example.ie".into(),
            email_verified: true,
        }
    }

    fn services(blobs: Arc<MemoryBlobStore>, records: Option<Arc<MemoryReportStore>>) -> Services {
        Services {
            identity: Arc::new(MemoryIdentity::new()),
            blobs,
            picker: Arc::new(StaticPicker::cancelling()),
            reports: records.map(|r| r as Arc<dyn ReportStore>),
        }
    }

    fn seeded(keys: &[&str]) -> Arc<MemoryBlobStore> {
        let blobs = Arc::new(MemoryBlobStore::new());
        for key in keys {
            blobs.insert(key, PNG_BYTES.to_vec());
        }
        blobs
    }

    fn record(user_id: &str, report_id: &str) -> ReportRecord {
        let key = format!("images/{}/{}", user_id, report_id);
        ReportRecord {
            report_id: report_id.into(),
            user_id: user_id.into(),
            image_url: MemoryBlobStore::url_for(&key),
            image_key: key,
            description: "pothole".into(),
            category: Category::Potholes,
            address: Address::default(),
            status: ReportStatus::Pending,
            created_at: "2026-10-16T09:00:00+00:00".into(),
        }
    }

    fn item(key: &str) -> ReportListItem {
        ReportListItem::placeholder(StoredImage {
            key: key.to_string(),
            url: MemoryBlobStore::url_for(key),
        })
    }

    #[tokio::test]
    async fn load_lists_only_the_users_images() {
        let blobs = seeded(&["images/u1/1", "images/u1/2", "images/u2/3"]);
        let feed = ReportFeed::new(&user(), FeedLayout::Vertical, services(blobs, None));

        assert_eq!(feed.load().await, Ok(true));
        let keys: Vec<_> = feed.items().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["images/u1/1", "images/u1/2"]);
        assert_eq!(feed.items()[0].votes, 200);
    }

    #[tokio::test]
    async fn failed_load_keeps_the_last_good_list() {
        let blobs = seeded(&["images/u1/1"]);
        let feed = ReportFeed::new(&user(), FeedLayout::Vertical, services(blobs.clone(), None));
        feed.load().await.unwrap();

        blobs.fail_listing(true);
        assert!(feed.load().await.is_err());
        assert_eq!(feed.len(), 1);
    }

    #[tokio::test]
    async fn refresh_clears_the_flag_on_success_and_failure() {
        let blobs = seeded(&["images/u1/1"]);
        let feed = ReportFeed::new(&user(), FeedLayout::Horizontal, services(blobs.clone(), None));

        feed.refresh().await.unwrap();
        assert!(!feed.is_refreshing());

        blobs.fail_listing(true);
        assert!(feed.refresh().await.is_err());
        assert!(!feed.is_refreshing());
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_entry() {
        let blobs = seeded(&["images/u1/1", "images/u1/2"]);
        let feed = ReportFeed::new(&user(), FeedLayout::Vertical, services(blobs.clone(), None));
        feed.load().await.unwrap();
        // duplicate URL in the list: only the first goes
        feed.push(item("images/u1/1"));

        feed.delete(&MemoryBlobStore::url_for("images/u1/1")).await.unwrap();

        let keys: Vec<_> = feed.items().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["images/u1/2", "images/u1/1"]);
        assert!(!blobs.contains("images/u1/1"));
        assert_eq!(blobs.delete_calls(), 1);
    }

    #[tokio::test]
    async fn failed_delete_leaves_the_list_unchanged() {
        let blobs = seeded(&["images/u1/1", "images/u1/2"]);
        let feed = ReportFeed::new(&user(), FeedLayout::Vertical, services(blobs.clone(), None));
        feed.load().await.unwrap();
        let before = feed.items();

        blobs.fail_deletes(true);
        let err = feed
            .delete(&MemoryBlobStore::url_for("images/u1/1"))
            .await
            .unwrap_err();

        assert_eq!(err, StorageError::Service("Network request failed".into()));
        assert_eq!(feed.items(), before);
    }

    #[tokio::test]
    async fn delete_with_unknown_url_touches_nothing() {
        let blobs = seeded(&["images/u1/1"]);
        let feed = ReportFeed::new(&user(), FeedLayout::Vertical, services(blobs.clone(), None));
        feed.load().await.unwrap();

        let err = feed.delete("https://elsewhere/x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidReference(_)));
        assert_eq!(blobs.delete_calls(), 0);
        assert_eq!(feed.len(), 1);
    }

    #[tokio::test]
    async fn delete_refuses_reports_of_other_users() {
        let blobs = seeded(&["images/u1/5", "images/u2/5"]);
        let records = Arc::new(MemoryReportStore::new());
        records.put_report(&record("u1", "5")).await.unwrap();
        let feed = ReportFeed::new(
            &user(),
            FeedLayout::Vertical,
            services(blobs.clone(), Some(records.clone())),
        );
        feed.load().await.unwrap();

        let err = feed
            .delete(&MemoryBlobStore::url_for("images/u2/5"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::InvalidReference(_)));
        assert!(blobs.contains("images/u2/5"));
        assert_eq!(blobs.delete_calls(), 0);
        assert_eq!(records.records().len(), 1);
        assert_eq!(feed.len(), 1);
    }

    #[tokio::test]
    async fn stale_results_are_discarded() {
        let blobs = seeded(&["images/u1/1"]);
        let feed = ReportFeed::new(&user(), FeedLayout::Vertical, services(blobs, None));

        let first = feed.begin();
        let second = feed.begin();
        assert!(feed.commit(second, vec![item("images/u1/new")]));
        assert!(!feed.commit(first, vec![item("images/u1/old")]));
        assert_eq!(feed.items()[0].key, "images/u1/new");

        // a local change also overtakes an in-flight load
        let in_flight = feed.begin();
        feed.push(item("images/u1/pushed"));
        assert!(!feed.commit(in_flight, Vec::new()));
        assert_eq!(feed.len(), 2);
    }

    #[tokio::test]
    async fn records_enrich_items_and_are_deleted_with_them() {
        let blobs = seeded(&["images/u1/1", "images/u1/2"]);
        let records = Arc::new(MemoryReportStore::new());
        records.put_report(&record("u1", "2")).await.unwrap();

        let feed = ReportFeed::new(
            &user(),
            FeedLayout::Vertical,
            services(blobs, Some(records.clone())),
        );
        feed.load().await.unwrap();

        let items = feed.items();
        assert_eq!(items[0].status, ReportStatus::Solved);
        assert_eq!(items[1].description, "pothole");
        assert_eq!(items[1].category, Some(Category::Potholes));
        assert_eq!(feed.visible(FeedFilter::Pending).len(), 1);
        assert_eq!(feed.visible(FeedFilter::Solved).len(), 1);

        feed.delete(&MemoryBlobStore::url_for("images/u1/2")).await.unwrap();
        assert!(records.records().is_empty());
    }

    #[tokio::test]
    async fn record_failure_degrades_to_placeholders() {
        let blobs = seeded(&["images/u1/1"]);
        let records = Arc::new(MemoryReportStore::new());
        records.fail_listing(true);
        let feed = ReportFeed::new(&user(), FeedLayout::Vertical, services(blobs, Some(records)));

        assert_eq!(feed.load().await, Ok(true));
        assert_eq!(feed.items()[0].description, "Broken streetlights near downtown area.");
    }

    #[tokio::test]
    async fn new_filter_orders_newest_first() {
        let blobs = seeded(&["images/u1/100", "images/u1/300", "images/u1/200"]);
        let feed = ReportFeed::new(&user(), FeedLayout::Vertical, services(blobs, None));
        feed.load().await.unwrap();

        let ids: Vec<_> = feed
            .visible(FeedFilter::New)
            .iter()
            .map(|i| i.report_id().to_string())
            .collect();
        assert_eq!(ids, vec!["300", "200", "100"]);
        assert_eq!(feed.visible(FeedFilter::Trending).len(), 3);
    }
}
