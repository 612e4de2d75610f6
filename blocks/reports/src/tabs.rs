use std::sync::Arc;

use fixit_atoms::media::StorageError;
use fixit_atoms::users::SessionUser;
use parking_lot::Mutex;

use crate::feed::{FeedFilter, FeedLayout, ReportFeed};
use crate::session::Services;
use crate::wizard::{SubmitOutcome, UploadWizard, WizardError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Home,
    Reports,
    Upload,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Home, Tab::Reports, Tab::Upload]
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Reports => "Reports",
            Tab::Upload => "Upload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub city: &'static str,
    pub country: &'static str,
    pub points: u32,
}

/// Fixed city ranking shown on the home tab.
pub fn leaderboard() -> Vec<LeaderboardEntry> {
    vec![
        LeaderboardEntry { rank: 1, city: "Dublin", country: "Ireland", points: 43485 },
        LeaderboardEntry { rank: 2, city: "Galway", country: "Ireland", points: 34222 },
        LeaderboardEntry { rank: 3, city: "Cork", country: "Ireland", points: 30000 },
    ]
}

// ========== HOME ==========

pub struct HomeView {
    user: SessionUser,
    pub feed: ReportFeed,
}

impl HomeView {
    pub const HEADER: &'static str = "Find It. Report It. Solve It.";

    pub fn new(user: &SessionUser, services: Services) -> Self {
        Self {
            user: user.clone(),
            feed: ReportFeed::new(user, FeedLayout::Horizontal, services),
        }
    }

    pub fn greeting(&self) -> String {
        format!(
            "Welcome back, {}! Let's make your city safer and cleaner.",
            self.user.display_name()
        )
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard()
    }
}

// ========== REPORTS ==========

pub struct ReportsView {
    pub feed: ReportFeed,
    filter: Mutex<FeedFilter>,
}

impl ReportsView {
    pub fn new(user: &SessionUser, services: Services) -> Self {
        Self {
            feed: ReportFeed::new(user, FeedLayout::Vertical, services),
            filter: Mutex::new(FeedFilter::default()),
        }
    }

    pub fn filter(&self) -> FeedFilter {
        *self.filter.lock()
    }

    pub fn set_filter(&self, filter: FeedFilter) {
        *self.filter.lock() = filter;
    }

    /// Cards under the active filter.
    pub fn visible(&self) -> Vec<fixit_atoms::reports::ReportListItem> {
        self.feed.visible(self.filter())
    }
}

// ========== UPLOAD ==========

pub struct UploadView {
    user: SessionUser,
    services: Services,
    /// "Your Reports" strip above the wizard.
    pub feed: ReportFeed,
    /// Held across the upload so a submission runs at most once at a time.
    pub wizard: tokio::sync::Mutex<UploadWizard>,
}

impl UploadView {
    pub fn new(user: &SessionUser, services: Services) -> Self {
        Self {
            user: user.clone(),
            feed: ReportFeed::new(user, FeedLayout::Horizontal, services.clone()),
            services,
            wizard: tokio::sync::Mutex::new(UploadWizard::new()),
        }
    }

    /// Submit the wizard's draft; a successful upload joins the feed.
    pub async fn submit(&self) -> Result<SubmitOutcome, WizardError> {
        let mut wizard = self.wizard.lock().await;
        let outcome = wizard.submit(&self.services, &self.user).await?;
        if let SubmitOutcome::Submitted { item, .. } = &outcome {
            self.feed.push(item.clone());
        }
        Ok(outcome)
    }

    pub async fn delete(&self, url: &str) -> Result<(), StorageError> {
        self.feed.delete(url).await
    }
}

// ========== TABS ==========

/// Tabbed shell shown to a verified user.
pub struct TabsView {
    user: SessionUser,
    active: Mutex<Tab>,
    pub home: HomeView,
    pub reports: ReportsView,
    pub upload: UploadView,
}

impl TabsView {
    pub fn new(user: &SessionUser, services: Services) -> Self {
        Self {
            user: user.clone(),
            active: Mutex::new(Tab::default()),
            home: HomeView::new(user, services.clone()),
            reports: ReportsView::new(user, services.clone()),
            upload: UploadView::new(user, services),
        }
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn active_tab(&self) -> Tab {
        *self.active.lock()
    }

    pub fn select_tab(&self, tab: Tab) {
        *self.active.lock() = tab;
    }

    pub fn feed(&self, tab: Tab) -> &ReportFeed {
        match tab {
            Tab::Home => &self.home.feed,
            Tab::Reports => &self.reports.feed,
            Tab::Upload => &self.upload.feed,
        }
    }

    /// Initial fetch for every feed. Failures are logged by the feeds and
    /// leave them empty.
    pub async fn mount(&self) {
        let (home, reports, upload) = futures::join!(
            self.home.feed.load(),
            self.reports.feed.load(),
            self.upload.feed.load()
        );
        let failed = [home, reports, upload].iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::warn!("⚠️ {} of 3 feeds failed to load for {}", failed, self.user.user_id);
        }
    }
}
