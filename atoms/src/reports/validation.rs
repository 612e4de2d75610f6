use super::model::ReportDraft;

/// Draft fields that must be filled in before a report can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Image,
    Description,
    Category,
    AddressLine1,
    City,
    Country,
}

impl DraftField {
    pub fn label(self) -> &'static str {
        match self {
            DraftField::Image => "image",
            DraftField::Description => "description",
            DraftField::Category => "category",
            DraftField::AddressLine1 => "address line 1",
            DraftField::City => "city",
            DraftField::Country => "country",
        }
    }
}

/// Outcome of checking a draft for submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftValidation {
    pub missing: Vec<DraftField>,
}

impl DraftValidation {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn is_missing(&self, field: DraftField) -> bool {
        self.missing.contains(&field)
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Presence check over every required draft field.
///
/// Address line 2 and eircode are optional.
pub fn validate_draft(draft: &ReportDraft) -> DraftValidation {
    let checks = [
        (DraftField::Image, draft.image.is_none()),
        (DraftField::Description, blank(&draft.description)),
        (DraftField::Category, draft.category.is_none()),
        (DraftField::AddressLine1, blank(&draft.address.line1)),
        (DraftField::City, blank(&draft.address.city)),
        (DraftField::Country, blank(&draft.address.country)),
    ];

    DraftValidation {
        missing: checks
            .into_iter()
            .filter_map(|(field, is_missing)| is_missing.then_some(field))
            .collect(),
    }
}
