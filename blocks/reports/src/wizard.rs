//! # Report upload wizard
//!
//! Four linear steps collect a report draft:
//! 1. PickImage - choose a photo (advances by itself once one is picked)
//! 2. Describe - free-text description
//! 3. Categorize - one of the fixed categories
//! 4. AddressSubmit - address, then submit
//!
//! Submitting a complete draft uploads the image, resets the draft and
//! returns to the first step.

use fixit_atoms::media::{self, LocalImage, MediaError, MediaPicker};
use fixit_atoms::reports::{
    validate_draft, Address, Category, DraftValidation, ReportDraft, ReportListItem, ReportRecord,
};
use fixit_atoms::users::SessionUser;

use crate::notice::Notice;
use crate::session::Services;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WizardStep {
    #[default]
    PickImage,
    Describe,
    Categorize,
    AddressSubmit,
}

impl WizardStep {
    pub fn all() -> &'static [Self] {
        &[
            Self::PickImage,
            Self::Describe,
            Self::Categorize,
            Self::AddressSubmit,
        ]
    }

    /// Zero-based position.
    pub fn index(self) -> usize {
        match self {
            Self::PickImage => 0,
            Self::Describe => 1,
            Self::Categorize => 2,
            Self::AddressSubmit => 3,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::PickImage => Some(Self::Describe),
            Self::Describe => Some(Self::Categorize),
            Self::Categorize => Some(Self::AddressSubmit),
            Self::AddressSubmit => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::PickImage => "Pick Image to Upload",
            Self::Describe => "Describe the issue",
            Self::Categorize => "Select a Category",
            Self::AddressSubmit => "Enter the Address",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressField {
    Line1,
    Line2,
    City,
    Eircode,
    Country,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// "Next" is not offered on this step in the current draft state.
    NextUnavailable(WizardStep),
    /// Submission is only offered on the address step.
    SubmitUnavailable(WizardStep),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted {
        item: ReportListItem,
        notice: Notice,
    },
    MissingInformation {
        validation: DraftValidation,
        notice: Notice,
    },
    Failed {
        notice: Notice,
    },
}

fn upload_failed(message: impl Into<String>) -> Notice {
    Notice::error("Upload failed!", message)
}

#[derive(Debug, Default)]
pub struct UploadWizard {
    step: WizardStep,
    draft: ReportDraft,
}

impl UploadWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    /// Step indicator: every step with whether it is the current one.
    pub fn indicator(&self) -> Vec<(WizardStep, bool)> {
        WizardStep::all()
            .iter()
            .map(|s| (*s, *s == self.step))
            .collect()
    }

    pub fn shows_pick_button(&self) -> bool {
        self.step == WizardStep::PickImage && self.draft.image.is_none()
    }

    /// Whether the current step offers a "Next" control.
    pub fn shows_next(&self) -> bool {
        match self.step {
            WizardStep::PickImage => self.draft.image.is_some(),
            WizardStep::Describe => true,
            WizardStep::Categorize => self.draft.category.is_some(),
            WizardStep::AddressSubmit => false,
        }
    }

    pub fn shows_submit(&self) -> bool {
        self.step == WizardStep::AddressSubmit
    }

    /// Press "Next".
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        if !self.shows_next() {
            return Err(WizardError::NextUnavailable(self.step));
        }
        let next = self
            .step
            .next()
            .ok_or(WizardError::NextUnavailable(self.step))?;
        self.step = next;
        Ok(next)
    }

    /// Whether an image can be picked: only on the first step.
    pub fn accepts_image(&self) -> bool {
        self.step == WizardStep::PickImage
    }

    /// Take a picked image and move on to the description. Returns false,
    /// leaving the wizard as it is, on any later step.
    pub fn set_image(&mut self, image: LocalImage) -> bool {
        if !self.accepts_image() {
            return false;
        }
        self.draft.image = Some(image);
        self.step = WizardStep::Describe;
        true
    }

    /// Open the device picker. Returns whether an image was taken; a
    /// cancelled pick leaves the wizard untouched. Past the first step the
    /// picker is not opened at all.
    pub async fn pick_image(&mut self, picker: &dyn MediaPicker) -> Result<bool, MediaError> {
        if !self.accepts_image() {
            return Ok(false);
        }
        match picker.pick_image().await? {
            Some(image) => Ok(self.set_image(image)),
            None => Ok(false),
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn select_category(&mut self, category: Category) {
        self.draft.category = Some(category);
    }

    pub fn set_address(&mut self, address: Address) {
        self.draft.address = address;
    }

    pub fn set_address_field(&mut self, field: AddressField, value: impl Into<String>) {
        let value = value.into();
        let address = &mut self.draft.address;
        match field {
            AddressField::Line1 => address.line1 = value,
            AddressField::Line2 => address.line2 = (!value.trim().is_empty()).then_some(value),
            AddressField::City => address.city = value,
            AddressField::Eircode => address.eircode = value,
            AddressField::Country => address.country = value,
        }
    }

    /// Drop the draft and go back to the first step.
    pub fn reset(&mut self) {
        self.draft.clear();
        self.step = WizardStep::PickImage;
    }

    /// Press "Submit" on the address step.
    ///
    /// An incomplete draft is refused before any collaborator call. On a
    /// collaborator failure the draft is kept as it is.
    pub async fn submit(
        &mut self,
        services: &Services,
        user: &SessionUser,
    ) -> Result<SubmitOutcome, WizardError> {
        if !self.shows_submit() {
            return Err(WizardError::SubmitUnavailable(self.step));
        }

        let validation = validate_draft(&self.draft);
        let image = match (&self.draft.image, validation.is_complete()) {
            (Some(image), true) => image.clone(),
            _ => {
                let missing: Vec<_> = validation.missing.iter().map(|f| f.label()).collect();
                tracing::info!("📋 Submit refused, missing: {}", missing.join(", "));
                return Ok(SubmitOutcome::MissingInformation {
                    validation,
                    notice: Notice::error(
                        "Missing Information",
                        "Please provide all required details before uploading.",
                    ),
                });
            }
        };

        let bytes = match services.picker.read_image(&image).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("❌ Could not read picked image {}: {}", image.uri, e);
                return Ok(SubmitOutcome::Failed {
                    notice: upload_failed(e.to_string()),
                });
            }
        };

        let stored = match media::upload_image(services.blobs.as_ref(), &user.user_id, bytes).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("❌ Report upload failed for user {}: {}", user.user_id, e);
                return Ok(SubmitOutcome::Failed {
                    notice: upload_failed(e.to_string()),
                });
            }
        };

        let record = ReportRecord::from_draft(&user.user_id, &stored, &self.draft);
        let item = match (&services.reports, record) {
            (Some(store), Some(record)) => match store.put_report(&record).await {
                Ok(()) => ReportListItem::from_record(stored, record),
                Err(e) => {
                    // The image is already stored; it shows up without metadata.
                    tracing::warn!("⚠️ Report record {} not saved: {}", record.report_id, e);
                    ReportListItem::placeholder(stored)
                }
            },
            _ => ReportListItem::placeholder(stored),
        };

        tracing::info!("✅ Report uploaded: key={}", item.key);
        self.reset();

        Ok(SubmitOutcome::Submitted {
            item,
            notice: Notice::success("Success", "Report uploaded successfully."),
        })
    }
}
