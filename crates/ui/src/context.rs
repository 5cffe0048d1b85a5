use std::sync::Arc;

use services::{AppServices, CardService, DeckService, SettingsService, StudyService};

/// Services the views need, supplied by the composition root (`crates/app`).
pub trait UiApp: Send + Sync {
    fn deck_service(&self) -> Arc<DeckService>;
    fn card_service(&self) -> Arc<CardService>;
    fn study_service(&self) -> Arc<StudyService>;
    fn settings(&self) -> Arc<SettingsService>;
}

impl UiApp for AppServices {
    fn deck_service(&self) -> Arc<DeckService> {
        AppServices::deck_service(self)
    }

    fn card_service(&self) -> Arc<CardService> {
        AppServices::card_service(self)
    }

    fn study_service(&self) -> Arc<StudyService> {
        AppServices::study_service(self)
    }

    fn settings(&self) -> Arc<SettingsService> {
        AppServices::settings(self)
    }
}

#[derive(Clone)]
pub struct AppContext {
    deck_service: Arc<DeckService>,
    card_service: Arc<CardService>,
    study_service: Arc<StudyService>,
    settings: Arc<SettingsService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            deck_service: app.deck_service(),
            card_service: app.card_service(),
            study_service: app.study_service(),
            settings: app.settings(),
        }
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

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
