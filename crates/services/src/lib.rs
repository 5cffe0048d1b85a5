#![forbid(unsafe_code)]

pub mod app_services;
pub mod card_service;
pub mod deck_service;
pub mod error;
mod queue;
pub mod responses;
pub mod settings_service;
pub mod study_service;

pub use deckflow_core::Clock;

pub use app_services::AppServices;
pub use card_service::CardService;
pub use deck_service::DeckService;
pub use error::{
    AppServicesError, CardServiceError, DeckServiceError, SettingsServiceError, StudyServiceError,
};
pub use queue::QueueCounts;
pub use responses::{
    CardEditResponse, DeckEditorPayload, DeckOverview, DeleteResponse, ImportReport,
    ResponseStatus,
};
pub use settings_service::SettingsService;
pub use study_service::{ReviewResult, StudyCard, StudyService};
