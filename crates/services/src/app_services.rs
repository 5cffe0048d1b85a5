use std::sync::Arc;

use storage::repository::Storage;

use crate::card_service::CardService;
use crate::deck_service::DeckService;
use crate::error::AppServicesError;
use crate::settings_service::SettingsService;
use crate::study_service::StudyService;
use crate::Clock;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    deck_service: Arc<DeckService>,
    card_service: Arc<CardService>,
    study_service: Arc<StudyService>,
    settings: Arc<SettingsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over an already opened storage backend.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let deck_service = Arc::new(DeckService::new(
            clock,
            Arc::clone(&storage.decks),
            Arc::clone(&storage.cards),
            Arc::clone(&storage.review_logs),
        ));
        let card_service = Arc::new(CardService::new(
            clock,
            Arc::clone(&storage.decks),
            Arc::clone(&storage.cards),
        ));
        let study_service = Arc::new(StudyService::new(
            clock,
            Arc::clone(&storage.decks),
            Arc::clone(&storage.cards),
            Arc::clone(&storage.review_logs),
            Arc::clone(&storage.reviews),
        ));
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));

        Self {
            deck_service,
            card_service,
            study_service,
            settings,
        }
    }

    /// In-memory services for tests and previews.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn deck_service(&self) -> Arc<DeckService> {
        Arc::clone(&self.deck_service)
    }

    #[must_use]
    pub fn card_service(&self) -> Arc<CardService> {
        Arc::clone(&self.card_service)
    }

    #[must_use]
    pub fn study_service(&self) -> Arc<StudyService> {
        Arc::clone(&self.study_service)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }
}
