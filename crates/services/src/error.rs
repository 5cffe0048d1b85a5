//! Shared error types for the services crate.

use thiserror::Error;

use deckflow_core::model::{DeckError, DeckId};
use deckflow_core::sample::SampleError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `DeckService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeckServiceError {
    #[error("a deck named `{0}` already exists")]
    DuplicateName(String),
    #[error("deck {0} not found")]
    NotFound(DeckId),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CardServiceError {
    #[error("deck {0} not found")]
    DeckNotFound(DeckId),
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudyService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyServiceError {
    #[error("deck {0} not found")]
    DeckNotFound(DeckId),
    #[error("card not found")]
    CardNotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
