use std::sync::Arc;

use tracing::{error, info};

use deckflow_core::model::{Deck, DeckDraft, DeckId};
use storage::repository::{CardRepository, DeckRepository, ReviewLogRepository, StorageError};

use crate::error::DeckServiceError;
use crate::queue;
use crate::responses::{DeckEditorPayload, DeckOverview, DeleteResponse, mastery_percent};
use crate::Clock;

/// Orchestrates deck creation, editing, and the dashboard figures.
#[derive(Clone)]
pub struct DeckService {
    clock: Clock,
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
    review_logs: Arc<dyn ReviewLogRepository>,
}

fn conflict_as_duplicate(name: &str) -> impl FnOnce(StorageError) -> DeckServiceError + '_ {
    move |err| match err {
        StorageError::Conflict => DeckServiceError::DuplicateName(name.to_owned()),
        other => DeckServiceError::Storage(other),
    }
}

impl DeckService {
    #[must_use]
    pub fn new(
        clock: Clock,
        decks: Arc<dyn DeckRepository>,
        cards: Arc<dyn CardRepository>,
        review_logs: Arc<dyn ReviewLogRepository>,
    ) -> Self {
        Self {
            clock,
            decks,
            cards,
            review_logs,
        }
    }

    /// Validate a draft and persist it as a new deck.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Deck` for validation failures,
    /// `DeckServiceError::DuplicateName` when the name is taken, and
    /// `DeckServiceError::Storage` if persistence fails.
    pub async fn create_deck(&self, draft: DeckDraft) -> Result<Deck, DeckServiceError> {
        let deck = draft.validate()?.assign_id(DeckId::new(0), self.clock.now());
        let stored = self
            .decks
            .insert_deck(&deck)
            .await
            .map_err(conflict_as_duplicate(deck.name()))?;
        info!(deck_id = %stored.id(), name = stored.name(), "deck created");
        Ok(stored)
    }

    /// Replace a deck's content and settings, keeping its id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::NotFound` for an unknown deck, plus the
    /// errors of [`DeckService::create_deck`].
    pub async fn update_deck(
        &self,
        deck_id: DeckId,
        draft: DeckDraft,
    ) -> Result<Deck, DeckServiceError> {
        let existing = self
            .decks
            .get_deck(deck_id)
            .await?
            .ok_or(DeckServiceError::NotFound(deck_id))?;
        let updated = existing.with_content_of(draft.validate()?);
        self.decks
            .update_deck(&updated)
            .await
            .map_err(conflict_as_duplicate(updated.name()))?;
        info!(deck_id = %deck_id, "deck updated");
        Ok(updated)
    }

    /// Fetch a deck by ID.
    ///
    /// Returns `Ok(None)` when the deck does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn get_deck(&self, deck_id: DeckId) -> Result<Option<Deck>, DeckServiceError> {
        Ok(self.decks.get_deck(deck_id).await?)
    }

    /// List decks ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn list_decks(&self) -> Result<Vec<Deck>, DeckServiceError> {
        Ok(self.decks.list_decks().await?)
    }

    /// Delete a deck together with its cards and review history.
    pub async fn delete_deck(&self, deck_id: DeckId) -> DeleteResponse {
        match self.decks.delete_deck(deck_id).await {
            Ok(()) => {
                info!(deck_id = %deck_id, "deck deleted");
                DeleteResponse::success("Deck deleted successfully")
            }
            Err(StorageError::NotFound) => DeleteResponse::error("Deck not found"),
            Err(err) => {
                error!(deck_id = %deck_id, error = %err, "deck delete failed");
                DeleteResponse::error(format!("Could not delete deck: {err}"))
            }
        }
    }

    /// Load a deck for the editor, with its first card's data as the
    /// embedded preview sample.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::NotFound` for an unknown deck and
    /// `DeckServiceError::Storage` if repository access fails.
    pub async fn editor_payload(
        &self,
        deck_id: DeckId,
    ) -> Result<DeckEditorPayload, DeckServiceError> {
        let deck = self
            .decks
            .get_deck(deck_id)
            .await?
            .ok_or(DeckServiceError::NotFound(deck_id))?;
        let sample_json = self
            .cards
            .cards_in_deck(deck_id)
            .await?
            .first()
            .map(|card| card.fields().to_json());
        Ok(DeckEditorPayload { deck, sample_json })
    }

    /// Card totals, mastery, and queue counts for one deck.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::NotFound` for an unknown deck and
    /// `DeckServiceError::Storage` if repository access fails.
    pub async fn deck_overview(&self, deck_id: DeckId) -> Result<DeckOverview, DeckServiceError> {
        let deck = self
            .decks
            .get_deck(deck_id)
            .await?
            .ok_or(DeckServiceError::NotFound(deck_id))?;
        self.overview_of(deck).await
    }

    /// Overviews of every deck, in list order.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn list_overviews(&self) -> Result<Vec<DeckOverview>, DeckServiceError> {
        let mut out = Vec::new();
        for deck in self.decks.list_decks().await? {
            out.push(self.overview_of(deck).await?);
        }
        Ok(out)
    }

    async fn overview_of(&self, deck: Deck) -> Result<DeckOverview, DeckServiceError> {
        let now = self.clock.now();
        let cards = self.cards.cards_in_deck(deck.id()).await?;
        let total_cards = u32::try_from(cards.len()).unwrap_or(u32::MAX);
        let reviewed_cards =
            u32::try_from(cards.iter().filter(|c| c.is_reviewed()).count()).unwrap_or(u32::MAX);
        let counts =
            queue::counts(self.cards.as_ref(), self.review_logs.as_ref(), &deck, now).await?;
        Ok(DeckOverview {
            total_cards,
            reviewed_cards,
            mastery_percent: mastery_percent(reviewed_cards, total_cards),
            counts,
            deck,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use deckflow_core::model::{Card, CardFields, CardId, DeckSettings};
    use deckflow_core::time::fixed_now;
    use storage::repository::Storage;

    fn service(storage: &Storage) -> DeckService {
        DeckService::new(
            Clock::fixed(fixed_now()),
            Arc::clone(&storage.decks),
            Arc::clone(&storage.cards),
            Arc::clone(&storage.review_logs),
        )
    }

    fn draft(name: &str) -> DeckDraft {
        DeckDraft {
            name: name.into(),
            card_template: "<p>{{ card.data.front }}</p>".into(),
            ..DeckDraft::with_settings(&DeckSettings::default())
        }
    }

    #[tokio::test]
    async fn create_deck_rejects_duplicate_names() {
        let storage = Storage::in_memory();
        let service = service(&storage);

        let deck = service.create_deck(draft("Kanji")).await.unwrap();
        assert_eq!(deck.created_at(), fixed_now());

        let err = service.create_deck(draft("Kanji")).await.unwrap_err();
        assert!(matches!(err, DeckServiceError::DuplicateName(name) if name == "Kanji"));
    }

    #[tokio::test]
    async fn update_deck_keeps_identity() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        let deck = service.create_deck(draft("Kanji")).await.unwrap();

        let mut changed = DeckDraft::from(&deck);
        changed.name = "Kanji N5".into();
        changed.learning_steps = "1 10".into();
        let updated = service.update_deck(deck.id(), changed).await.unwrap();

        assert_eq!(updated.id(), deck.id());
        assert_eq!(updated.created_at(), deck.created_at());
        assert_eq!(updated.settings().learning_steps(), &[1, 10]);

        let missing = service
            .update_deck(DeckId::new(99), draft("Ghost"))
            .await
            .unwrap_err();
        assert!(matches!(missing, DeckServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn editor_payload_embeds_first_card() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        let deck = service.create_deck(draft("Kanji")).await.unwrap();

        let empty = service.editor_payload(deck.id()).await.unwrap();
        assert_eq!(empty.sample_json, None);

        let fields = CardFields::from_pairs([("front", "犬")]).unwrap();
        storage
            .cards
            .insert_card(&Card::new(CardId::new(0), deck.id(), fields, fixed_now()))
            .await
            .unwrap();
        let payload = service.editor_payload(deck.id()).await.unwrap();
        assert_eq!(payload.sample_json.as_deref(), Some(r#"{"front":"犬"}"#));
    }

    #[tokio::test]
    async fn delete_deck_reports_missing_deck() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        let deck = service.create_deck(draft("Kanji")).await.unwrap();

        assert!(service.delete_deck(deck.id()).await.is_success());
        let again = service.delete_deck(deck.id()).await;
        assert!(!again.is_success());
        assert_eq!(again.message, "Deck not found");
    }

    #[tokio::test]
    async fn overview_of_fresh_deck() {
        let storage = Storage::in_memory();
        let service = service(&storage);
        let deck = service.create_deck(draft("Kanji")).await.unwrap();
        for front in ["一", "二", "三"] {
            let fields = CardFields::from_pairs([("front", front)]).unwrap();
            storage
                .cards
                .insert_card(&Card::new(CardId::new(0), deck.id(), fields, fixed_now()))
                .await
                .unwrap();
        }

        let overview = service.deck_overview(deck.id()).await.unwrap();
        assert_eq!(overview.total_cards, 3);
        assert_eq!(overview.reviewed_cards, 0);
        assert_eq!(overview.mastery_percent, 0.0);
        assert_eq!(overview.counts.new, 3);
        assert_eq!(service.list_overviews().await.unwrap().len(), 1);
    }
}
