pub mod repository;
pub mod sqlite;

pub use repository::{
    CardRepository, DeckRepository, InMemoryRepository, ReviewLogRepository, ReviewPersistence,
    SettingsRepository, Storage, StorageError,
};
