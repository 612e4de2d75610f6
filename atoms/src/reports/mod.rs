pub mod model;
pub mod store;
pub mod validation;

pub use model::{
    Address, Category, ReportDraft, ReportListItem, ReportRecord, ReportStatus,
};
pub use store::ReportStore;
pub use validation::{validate_draft, DraftField, DraftValidation};
