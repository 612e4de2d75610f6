//! View models for the FixIt client: session gating, sign-in, the report
//! upload wizard, report feeds and the tab shell.
//!
//! Nothing here talks to a concrete backend. Every view model receives its
//! collaborators through [`Services`].

pub mod feed;
pub mod gate;
pub mod login;
pub mod notice;
pub mod session;
pub mod shell;
pub mod tabs;
pub mod wizard;

pub use feed::{FeedFilter, FeedLayout, ReportFeed};
pub use gate::GateDecision;
pub use login::{LoginForm, LoginOutcome, SignUpForm, SignUpOutcome};
pub use notice::{Notice, NoticeLevel};
pub use session::{Services, SessionContext, SessionSubscription};
pub use shell::{AppShell, Screen};
pub use tabs::{leaderboard, HomeView, LeaderboardEntry, ReportsView, Tab, TabsView, UploadView};
pub use wizard::{AddressField, SubmitOutcome, UploadWizard, WizardError, WizardStep};
