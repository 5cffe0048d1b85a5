use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::DeckId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("deck name cannot be empty")]
    EmptyName,

    #[error("card template cannot be empty")]
    EmptyTemplate,

    #[error("max reviews per day must be > 0")]
    InvalidMaxReviewsPerDay,

    #[error("graduating interval must be at least 1 day")]
    InvalidGraduatingInterval,

    #[error("learning step `{0}` must be a positive number of minutes")]
    InvalidLearningStep(String),
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Daily limits and learning-step configuration for a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSettings {
    new_cards_per_day: u32,
    max_reviews_per_day: u32,
    learning_steps: Vec<u32>,
    graduating_interval_days: u32,
}

impl Default for DeckSettings {
    /// 20 new cards, 200 reviews, steps of 10 minutes and one day, graduate after one day.
    fn default() -> Self {
        Self {
            new_cards_per_day: 20,
            max_reviews_per_day: 200,
            learning_steps: vec![10, 1440],
            graduating_interval_days: 1,
        }
    }
}

impl DeckSettings {
    /// Creates validated deck settings.
    ///
    /// # Errors
    ///
    /// Returns `DeckError` if the review cap is zero, a learning step is zero,
    /// or the graduating interval is shorter than a day.
    pub fn new(
        new_cards_per_day: u32,
        max_reviews_per_day: u32,
        learning_steps: Vec<u32>,
        graduating_interval_days: u32,
    ) -> Result<Self, DeckError> {
        if max_reviews_per_day == 0 {
            return Err(DeckError::InvalidMaxReviewsPerDay);
        }
        if graduating_interval_days == 0 {
            return Err(DeckError::InvalidGraduatingInterval);
        }
        if learning_steps.contains(&0) {
            return Err(DeckError::InvalidLearningStep("0".into()));
        }

        Ok(Self {
            new_cards_per_day,
            max_reviews_per_day,
            learning_steps,
            graduating_interval_days,
        })
    }

    #[must_use]
    pub fn new_cards_per_day(&self) -> u32 {
        self.new_cards_per_day
    }

    #[must_use]
    pub fn max_reviews_per_day(&self) -> u32 {
        self.max_reviews_per_day
    }

    /// Learning steps in minutes.
    #[must_use]
    pub fn learning_steps(&self) -> &[u32] {
        &self.learning_steps
    }

    #[must_use]
    pub fn graduating_interval_days(&self) -> u32 {
        self.graduating_interval_days
    }

    /// Steps in the editable `"10 1440"` form.
    #[must_use]
    pub fn learning_steps_text(&self) -> String {
        self.learning_steps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parses learning steps written as minutes separated by spaces or commas.
///
/// # Errors
///
/// Returns `DeckError::InvalidLearningStep` for any token that is not a
/// positive integer.
pub fn parse_learning_steps(input: &str) -> Result<Vec<u32>, DeckError> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<u32>() {
            Ok(minutes) if minutes > 0 => Ok(minutes),
            _ => Err(DeckError::InvalidLearningStep(token.to_owned())),
        })
        .collect()
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated deck input, as typed into the deck editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckDraft {
    pub name: String,
    pub card_template: String,
    pub card_css: String,
    pub media_folder: Option<String>,
    pub new_cards_per_day: u32,
    pub max_reviews_per_day: u32,
    pub learning_steps: String,
    pub graduating_interval_days: u32,
}

impl DeckDraft {
    /// Starts a draft carrying the given settings and empty content.
    #[must_use]
    pub fn with_settings(settings: &DeckSettings) -> Self {
        Self {
            name: String::new(),
            card_template: String::new(),
            card_css: String::new(),
            media_folder: None,
            new_cards_per_day: settings.new_cards_per_day(),
            max_reviews_per_day: settings.max_reviews_per_day(),
            learning_steps: settings.learning_steps_text(),
            graduating_interval_days: settings.graduating_interval_days(),
        }
    }

    /// Validates the draft into a deck that has no id yet.
    ///
    /// # Errors
    ///
    /// Returns `DeckError` when the name or template is blank or the settings
    /// are invalid.
    pub fn validate(self) -> Result<Deck, DeckError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(DeckError::EmptyName);
        }
        if self.card_template.trim().is_empty() {
            return Err(DeckError::EmptyTemplate);
        }
        let steps = parse_learning_steps(&self.learning_steps)?;
        let settings = DeckSettings::new(
            self.new_cards_per_day,
            self.max_reviews_per_day,
            steps,
            self.graduating_interval_days,
        )?;
        let media_folder = self
            .media_folder
            .map(|folder| folder.trim().to_owned())
            .filter(|folder| !folder.is_empty());

        Ok(Deck {
            id: DeckId::new(0),
            name,
            card_template: self.card_template,
            card_css: self.card_css,
            media_folder,
            settings,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        })
    }
}

impl From<&Deck> for DeckDraft {
    fn from(deck: &Deck) -> Self {
        Self {
            name: deck.name.clone(),
            card_template: deck.card_template.clone(),
            card_css: deck.card_css.clone(),
            media_folder: deck.media_folder.clone(),
            ..Self::with_settings(&deck.settings)
        }
    }
}

//
// ─── DECK ──────────────────────────────────────────────────────────────────────
//

/// A named collection of cards sharing one template and stylesheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    id: DeckId,
    name: String,
    card_template: String,
    card_css: String,
    media_folder: Option<String>,
    settings: DeckSettings,
    created_at: DateTime<Utc>,
}

impl Deck {
    /// Rehydrates a deck from persisted columns.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` if the stored name is blank.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: DeckId,
        name: impl Into<String>,
        card_template: String,
        card_css: String,
        media_folder: Option<String>,
        settings: DeckSettings,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DeckError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DeckError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            card_template,
            card_css,
            media_folder,
            settings,
            created_at,
        })
    }

    /// Attaches the storage-assigned id and creation time.
    #[must_use]
    pub fn assign_id(mut self, id: DeckId, created_at: DateTime<Utc>) -> Self {
        self.id = id;
        self.created_at = created_at;
        self
    }

    /// Replaces the editable content, keeping identity and creation time.
    #[must_use]
    pub fn with_content_of(mut self, other: Deck) -> Self {
        self.name = other.name;
        self.card_template = other.card_template;
        self.card_css = other.card_css;
        self.media_folder = other.media_folder;
        self.settings = other.settings;
        self
    }

    #[must_use]
    pub fn id(&self) -> DeckId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn card_template(&self) -> &str {
        &self.card_template
    }

    #[must_use]
    pub fn card_css(&self) -> &str {
        &self.card_css
    }

    #[must_use]
    pub fn media_folder(&self) -> Option<&str> {
        self.media_folder.as_deref()
    }

    #[must_use]
    pub fn settings(&self) -> &DeckSettings {
        &self.settings
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
