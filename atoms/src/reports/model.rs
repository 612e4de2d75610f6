use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::media::{model::report_id_from_key, LocalImage, StoredImage};

// ========== CATEGORY ==========

/// The fixed set of issue categories. Free-text categories are not allowed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Graffiti,
    Potholes,
    Litter,
    #[serde(rename = "Broken Infrastructure")]
    BrokenInfrastructure,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Graffiti,
            Category::Potholes,
            Category::Litter,
            Category::BrokenInfrastructure,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Graffiti => "Graffiti",
            Category::Potholes => "Potholes",
            Category::Litter => "Litter",
            Category::BrokenInfrastructure => "Broken Infrastructure",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::all()
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

// ========== STATUS ==========

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStatus {
    #[default]
    Pending,
    Solved,
}

impl ReportStatus {
    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Solved => "Solved",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "solved" => Ok(ReportStatus::Solved),
            other => Err(format!("Unknown report status: {}", other)),
        }
    }
}

// ========== ADDRESS ==========

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub eircode: String,
    pub country: String,
}

// ========== DRAFT ==========

/// The wizard's in-progress report. Never persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportDraft {
    pub image: Option<LocalImage>,
    pub description: String,
    pub category: Option<Category>,
    pub address: Address,
}

impl ReportDraft {
    /// Every new report starts out pending.
    pub fn status(&self) -> ReportStatus {
        ReportStatus::Pending
    }

    pub fn clear(&mut self) {
        *self = ReportDraft::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == ReportDraft::default()
    }
}

// ========== RECORD ==========

/// Report metadata stored alongside the uploaded image.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReportRecord {
    pub report_id: String,
    pub user_id: String,
    pub image_key: String,
    pub image_url: String,
    pub description: String,
    pub category: Category,
    pub address: Address,
    pub status: ReportStatus,
    pub created_at: String,
}

impl ReportRecord {
    /// Build the record for a submitted draft. `None` when the category is
    /// still unset, which validation rules out before any upload.
    pub fn from_draft(user_id: &str, image: &StoredImage, draft: &ReportDraft) -> Option<Self> {
        Some(ReportRecord {
            report_id: report_id_from_key(&image.key).to_string(),
            user_id: user_id.to_string(),
            image_key: image.key.clone(),
            image_url: image.url.clone(),
            description: draft.description.trim().to_string(),
            category: draft.category?,
            address: draft.address.clone(),
            status: draft.status(),
            created_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

// ========== LIST ITEM ==========

pub const PLACEHOLDER_REPORTER: &str = "User";
pub const PLACEHOLDER_DESCRIPTION: &str = "Broken streetlights near downtown area.";
pub const PLACEHOLDER_VOTES: u32 = 200;

/// One rendered entry of a report feed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReportListItem {
    pub url: String,
    pub key: String,
    pub reporter: String,
    pub status: ReportStatus,
    pub description: String,
    pub category: Option<Category>,
    pub address: Option<Address>,
    pub votes: u32,
}

impl ReportListItem {
    /// Display card for an image that has no stored metadata.
    pub fn placeholder(image: StoredImage) -> Self {
        ReportListItem {
            url: image.url,
            key: image.key,
            reporter: PLACEHOLDER_REPORTER.to_string(),
            status: ReportStatus::Solved,
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            category: None,
            address: None,
            votes: PLACEHOLDER_VOTES,
        }
    }

    pub fn from_record(image: StoredImage, record: ReportRecord) -> Self {
        ReportListItem {
            url: image.url,
            key: image.key,
            reporter: PLACEHOLDER_REPORTER.to_string(),
            status: record.status,
            description: record.description,
            category: Some(record.category),
            address: Some(record.address),
            votes: 0,
        }
    }

    /// Report id (the key's timestamp segment).
    pub fn report_id(&self) -> &str {
        report_id_from_key(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_parse_by_label() {
        assert_eq!(Category::all().len(), 4);
        assert_eq!("potholes".parse::<Category>(), Ok(Category::Potholes));
        assert_eq!(
            "Broken Infrastructure".parse::<Category>(),
            Ok(Category::BrokenInfrastructure)
        );
        assert!("Noise".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_with_display_label() {
        let json = serde_json::to_string(&Category::BrokenInfrastructure).unwrap();
        assert_eq!(json, "\"Broken Infrastructure\"");
    }

    #[test]
    fn cleared_draft_is_empty_and_pending() {
        let mut draft = ReportDraft {
            image: Some(LocalImage::new("file:///tmp/a.png")),
            description: "pothole".into(),
            category: Some(Category::Potholes),
            address: Address {
                line1: "1 Main St".into(),
                ..Address::default()
            },
        };
        assert!(!draft.is_empty());
        draft.clear();
        assert!(draft.is_empty());
        assert_eq!(draft.status(), ReportStatus::Pending);
    }

    #[test]
    fn record_projection_replaces_placeholders() {
        let image = StoredImage {
            key: "images/u1/99".into(),
            url: "https://cdn/images/u1/99".into(),
        };
        let placeholder = ReportListItem::placeholder(image.clone());
        assert_eq!(placeholder.votes, PLACEHOLDER_VOTES);
        assert_eq!(placeholder.report_id(), "99");

        let draft = ReportDraft {
            image: None,
            description: "  pothole ".into(),
            category: Some(Category::Potholes),
            address: Address::default(),
        };
        let record = ReportRecord::from_draft("u1", &image, &draft).unwrap();
        assert_eq!(record.report_id, "99");
        assert_eq!(record.description, "pothole");

        let item = ReportListItem::from_record(image, record);
        assert_eq!(item.status, ReportStatus::Pending);
        assert_eq!(item.category, Some(Category::Potholes));
        assert_eq!(item.votes, 0);
    }
}
