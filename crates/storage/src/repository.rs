use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use deckflow_core::model::{Card, CardId, CardState, Deck, DeckId, ReviewLog};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait DeckRepository: Send + Sync {
    /// Inserts a deck, ignoring its id, and returns it with the assigned id.
    ///
    /// # Errors
    ///
    /// `StorageError::Conflict` if another deck already has the same name.
    async fn insert_deck(&self, deck: &Deck) -> Result<Deck, StorageError>;

    /// Overwrites the editable columns of an existing deck.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `Conflict` for a duplicate name.
    async fn update_deck(&self, deck: &Deck) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError>;

    /// All decks ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_decks(&self) -> Result<Vec<Deck>, StorageError>;

    /// Deletes a deck together with its cards and review history.
    ///
    /// # Errors
    ///
    /// `NotFound` if the deck does not exist.
    async fn delete_deck(&self, id: DeckId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Inserts a card, ignoring its id, and returns it with the assigned id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the card's deck does not exist.
    async fn insert_card(&self, card: &Card) -> Result<Card, StorageError>;

    /// Inserts many cards atomically; either all are stored or none.
    ///
    /// # Errors
    ///
    /// `NotFound` if a card's deck does not exist.
    async fn insert_cards(&self, cards: &[Card]) -> Result<Vec<Card>, StorageError>;

    /// Overwrites fields and scheduling state of an existing card.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    async fn update_card(&self, card: &Card) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_card(&self, id: CardId) -> Result<Option<Card>, StorageError>;

    /// Cards of a deck ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn cards_in_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError>;

    /// Deletes a card and its review history.
    ///
    /// # Errors
    ///
    /// `NotFound` if the card does not exist.
    async fn delete_card(&self, id: CardId) -> Result<(), StorageError>;

    /// Earliest card in `state` whose next review is at or before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn next_due(
        &self,
        deck_id: DeckId,
        state: CardState,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Card>, StorageError>;

    /// Lowest-id card still in the `new` state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn next_new(&self, deck_id: DeckId) -> Result<Option<Card>, StorageError>;

    /// Number of cards in `state` due at or before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_due(
        &self,
        deck_id: DeckId,
        state: CardState,
        cutoff: DateTime<Utc>,
    ) -> Result<u32, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_in_state(&self, deck_id: DeckId, state: CardState) -> Result<u32, StorageError>;

    /// Number of cards first studied on `day`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_introduced_on(&self, deck_id: DeckId, day: NaiveDate)
    -> Result<u32, StorageError>;
}

#[async_trait]
pub trait ReviewLogRepository: Send + Sync {
    /// Appends one history row and returns its id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the deck or card does not exist.
    async fn append_log(&self, log: &ReviewLog) -> Result<i64, StorageError>;

    /// History rows of a deck stamped within `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_reviews_between(
        &self,
        deck_id: DeckId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, StorageError>;

    /// Full history of one card, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn logs_for_card(&self, card_id: CardId) -> Result<Vec<ReviewLog>, StorageError>;
}

/// Stores an answered card and its history row as one unit.
#[async_trait]
pub trait ReviewPersistence: Send + Sync {
    /// # Errors
    ///
    /// `Conflict` if the log does not belong to the card, `NotFound` if the
    /// card does not exist.
    async fn apply_review(&self, card: &Card, log: &ReviewLog) -> Result<i64, StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Inserts or replaces a setting.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// All settings ordered by key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_settings(&self) -> Result<Vec<(String, String)>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryTables {
    decks: BTreeMap<DeckId, Deck>,
    cards: BTreeMap<CardId, Card>,
    logs: Vec<(i64, ReviewLog)>,
    settings: BTreeMap<String, String>,
    last_deck_id: u64,
    last_card_id: u64,
    last_log_id: i64,
}

impl MemoryTables {
    fn insert_card(&mut self, card: &Card) -> Result<Card, StorageError> {
        if !self.decks.contains_key(&card.deck_id()) {
            return Err(StorageError::NotFound);
        }
        self.last_card_id += 1;
        let stored = card.clone().assign_id(CardId::new(self.last_card_id));
        self.cards.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    fn append_log(&mut self, log: &ReviewLog) -> Result<i64, StorageError> {
        if !self.decks.contains_key(&log.deck_id) || !self.cards.contains_key(&log.card_id) {
            return Err(StorageError::NotFound);
        }
        self.last_log_id += 1;
        self.logs.push((self.last_log_id, log.clone()));
        Ok(self.last_log_id)
    }

    fn deck_cards(&self, deck_id: DeckId) -> impl Iterator<Item = &Card> {
        self.cards.values().filter(move |c| c.deck_id() == deck_id)
    }
}

/// Simple in-memory repository for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<MemoryTables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryTables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn count(n: usize) -> Result<u32, StorageError> {
    u32::try_from(n).map_err(|_| StorageError::Serialization("count overflow".into()))
}

#[async_trait]
impl DeckRepository for InMemoryRepository {
    async fn insert_deck(&self, deck: &Deck) -> Result<Deck, StorageError> {
        let mut tables = self.lock()?;
        if tables.decks.values().any(|d| d.name() == deck.name()) {
            return Err(StorageError::Conflict);
        }
        tables.last_deck_id += 1;
        let stored = deck
            .clone()
            .assign_id(DeckId::new(tables.last_deck_id), deck.created_at());
        tables.decks.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn update_deck(&self, deck: &Deck) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        if tables
            .decks
            .values()
            .any(|d| d.id() != deck.id() && d.name() == deck.name())
        {
            return Err(StorageError::Conflict);
        }
        let slot = tables
            .decks
            .get_mut(&deck.id())
            .ok_or(StorageError::NotFound)?;
        *slot = slot.clone().with_content_of(deck.clone());
        Ok(())
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError> {
        Ok(self.lock()?.decks.get(&id).cloned())
    }

    async fn list_decks(&self) -> Result<Vec<Deck>, StorageError> {
        Ok(self.lock()?.decks.values().cloned().collect())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        tables.decks.remove(&id).ok_or(StorageError::NotFound)?;
        tables.cards.retain(|_, c| c.deck_id() != id);
        tables.logs.retain(|(_, log)| log.deck_id != id);
        Ok(())
    }
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn insert_card(&self, card: &Card) -> Result<Card, StorageError> {
        self.lock()?.insert_card(card)
    }

    async fn insert_cards(&self, cards: &[Card]) -> Result<Vec<Card>, StorageError> {
        let mut tables = self.lock()?;
        if cards.iter().any(|c| !tables.decks.contains_key(&c.deck_id())) {
            return Err(StorageError::NotFound);
        }
        cards.iter().map(|card| tables.insert_card(card)).collect()
    }

    async fn update_card(&self, card: &Card) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        let slot = tables
            .cards
            .get_mut(&card.id())
            .ok_or(StorageError::NotFound)?;
        *slot = card.clone();
        Ok(())
    }

    async fn get_card(&self, id: CardId) -> Result<Option<Card>, StorageError> {
        Ok(self.lock()?.cards.get(&id).cloned())
    }

    async fn cards_in_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError> {
        Ok(self.lock()?.deck_cards(deck_id).cloned().collect())
    }

    async fn delete_card(&self, id: CardId) -> Result<(), StorageError> {
        let mut tables = self.lock()?;
        tables.cards.remove(&id).ok_or(StorageError::NotFound)?;
        tables.logs.retain(|(_, log)| log.card_id != id);
        Ok(())
    }

    async fn next_due(
        &self,
        deck_id: DeckId,
        state: CardState,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Card>, StorageError> {
        let tables = self.lock()?;
        Ok(tables
            .deck_cards(deck_id)
            .filter(|c| c.state() == state && c.next_review_at() <= cutoff)
            .min_by_key(|c| (c.next_review_at(), c.id()))
            .cloned())
    }

    async fn next_new(&self, deck_id: DeckId) -> Result<Option<Card>, StorageError> {
        let tables = self.lock()?;
        Ok(tables
            .deck_cards(deck_id)
            .find(|c| c.state() == CardState::New)
            .cloned())
    }

    async fn count_due(
        &self,
        deck_id: DeckId,
        state: CardState,
        cutoff: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let tables = self.lock()?;
        count(
            tables
                .deck_cards(deck_id)
                .filter(|c| c.state() == state && c.next_review_at() <= cutoff)
                .count(),
        )
    }

    async fn count_in_state(&self, deck_id: DeckId, state: CardState) -> Result<u32, StorageError> {
        let tables = self.lock()?;
        count(tables.deck_cards(deck_id).filter(|c| c.state() == state).count())
    }

    async fn count_introduced_on(
        &self,
        deck_id: DeckId,
        day: NaiveDate,
    ) -> Result<u32, StorageError> {
        let tables = self.lock()?;
        count(
            tables
                .deck_cards(deck_id)
                .filter(|c| c.scheduling().introduction_date == Some(day))
                .count(),
        )
    }
}

#[async_trait]
impl ReviewLogRepository for InMemoryRepository {
    async fn append_log(&self, log: &ReviewLog) -> Result<i64, StorageError> {
        self.lock()?.append_log(log)
    }

    async fn count_reviews_between(
        &self,
        deck_id: DeckId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let tables = self.lock()?;
        count(
            tables
                .logs
                .iter()
                .filter(|(_, log)| {
                    log.deck_id == deck_id && log.reviewed_at >= start && log.reviewed_at < end
                })
                .count(),
        )
    }

    async fn logs_for_card(&self, card_id: CardId) -> Result<Vec<ReviewLog>, StorageError> {
        let tables = self.lock()?;
        let mut logs: Vec<ReviewLog> = tables
            .logs
            .iter()
            .filter(|(_, log)| log.card_id == card_id)
            .map(|(_, log)| log.clone())
            .collect();
        logs.sort_by_key(|log| log.reviewed_at);
        Ok(logs)
    }
}

#[async_trait]
impl ReviewPersistence for InMemoryRepository {
    async fn apply_review(&self, card: &Card, log: &ReviewLog) -> Result<i64, StorageError> {
        if log.card_id != card.id() || log.deck_id != card.deck_id() {
            return Err(StorageError::Conflict);
        }
        let mut tables = self.lock()?;
        let slot = tables
            .cards
            .get_mut(&card.id())
            .ok_or(StorageError::NotFound)?;
        *slot = card.clone();
        tables.append_log(log)
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.settings.get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?
            .settings
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn list_settings(&self) -> Result<Vec<(String, String)>, StorageError> {
        Ok(self
            .lock()?
            .settings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Repositories behind trait objects so the backend can be swapped.
#[derive(Clone)]
pub struct Storage {
    pub decks: Arc<dyn DeckRepository>,
    pub cards: Arc<dyn CardRepository>,
    pub review_logs: Arc<dyn ReviewLogRepository>,
    pub reviews: Arc<dyn ReviewPersistence>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(InMemoryRepository::new())
    }

    pub(crate) fn from_backend<R>(repo: R) -> Self
    where
        R: DeckRepository
            + CardRepository
            + ReviewLogRepository
            + ReviewPersistence
            + SettingsRepository
            + Clone
            + 'static,
    {
        Self {
            decks: Arc::new(repo.clone()),
            cards: Arc::new(repo.clone()),
            review_logs: Arc::new(repo.clone()),
            reviews: Arc::new(repo.clone()),
            settings: Arc::new(repo),
        }
    }
}
