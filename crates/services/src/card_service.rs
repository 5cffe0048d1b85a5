use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use deckflow_core::model::{Card, CardError, CardFields, CardId, DeckId};
use deckflow_core::sample::parse_record_array;
use storage::repository::{CardRepository, DeckRepository, StorageError};

use crate::error::CardServiceError;
use crate::responses::{CardEditResponse, DeleteResponse, ImportReport};
use crate::Clock;

/// Orchestrates card creation, editing, import, and deletion.
#[derive(Clone)]
pub struct CardService {
    clock: Clock,
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
}

impl CardService {
    #[must_use]
    pub fn new(
        clock: Clock,
        decks: Arc<dyn DeckRepository>,
        cards: Arc<dyn CardRepository>,
    ) -> Self {
        Self {
            clock,
            decks,
            cards,
        }
    }

    async fn ensure_deck(&self, deck_id: DeckId) -> Result<(), CardServiceError> {
        match self.decks.get_deck(deck_id).await? {
            Some(_) => Ok(()),
            None => Err(CardServiceError::DeckNotFound(deck_id)),
        }
    }

    /// Create a new card in a deck.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::DeckNotFound` for an unknown deck and
    /// `CardServiceError::Storage` if persistence fails.
    pub async fn create_card(
        &self,
        deck_id: DeckId,
        fields: CardFields,
    ) -> Result<Card, CardServiceError> {
        self.ensure_deck(deck_id).await?;
        let card = Card::new(CardId::new(0), deck_id, fields, self.clock.now());
        let stored = self.cards.insert_card(&card).await?;
        info!(deck_id = %deck_id, card_id = %stored.id(), "card created");
        Ok(stored)
    }

    /// All cards of a deck in creation order.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn list_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CardServiceError> {
        Ok(self.cards.cards_in_deck(deck_id).await?)
    }

    /// Cards of a deck ordered by their next review time.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn progress(&self, deck_id: DeckId) -> Result<Vec<Card>, CardServiceError> {
        let mut cards = self.cards.cards_in_deck(deck_id).await?;
        cards.sort_by_key(|card| (card.next_review_at(), card.id()));
        Ok(cards)
    }

    /// Replace a card's fields with the edited rows.
    ///
    /// Rows go through the same checks as new cards. A rejected edit leaves the
    /// stored card untouched and reports `Validation failed: <reason>`.
    pub async fn edit_card(&self, card_id: CardId, rows: Vec<(String, String)>) -> CardEditResponse {
        let fields = match CardFields::from_pairs(rows) {
            Ok(fields) => fields,
            Err(err) => {
                warn!(card_id = %card_id, error = %err, "card edit rejected");
                return CardEditResponse::error(format!("Validation failed: {err}"));
            }
        };

        let mut card = match self.cards.get_card(card_id).await {
            Ok(Some(card)) => card,
            Ok(None) => return CardEditResponse::error("Card not found"),
            Err(err) => {
                error!(card_id = %card_id, error = %err, "card lookup failed");
                return CardEditResponse::error(format!("Could not load card: {err}"));
            }
        };

        card.set_fields(fields);
        match self.cards.update_card(&card).await {
            Ok(()) => {
                info!(card_id = %card_id, "card updated");
                CardEditResponse::success(card.fields().clone())
            }
            Err(StorageError::NotFound) => CardEditResponse::error("Card not found"),
            Err(err) => {
                error!(card_id = %card_id, error = %err, "card update failed");
                CardEditResponse::error(format!("Could not save card: {err}"))
            }
        }
    }

    /// Delete a card and its review history.
    pub async fn delete_card(&self, card_id: CardId) -> DeleteResponse {
        match self.cards.delete_card(card_id).await {
            Ok(()) => {
                info!(card_id = %card_id, "card deleted");
                DeleteResponse::success("Card deleted successfully")
            }
            Err(StorageError::NotFound) => DeleteResponse::error("Card not found"),
            Err(err) => {
                error!(card_id = %card_id, error = %err, "card delete failed");
                DeleteResponse::error(format!("Could not delete card: {err}"))
            }
        }
    }

    /// Import every object of a JSON array as a new card.
    ///
    /// Elements that are not objects or have no usable fields are skipped and
    /// reported by position. The remaining cards are stored in one batch.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Sample` when the text is not a non-empty
    /// JSON array, `CardServiceError::DeckNotFound` for an unknown deck, and
    /// `CardServiceError::Storage` if persistence fails.
    pub async fn import_cards(
        &self,
        deck_id: DeckId,
        text: &str,
    ) -> Result<ImportReport, CardServiceError> {
        let records = parse_record_array(text)?;
        self.ensure_deck(deck_id).await?;

        let now = self.clock.now();
        let mut report = ImportReport::default();
        let mut batch = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match record_fields(record) {
                Some(Ok(fields)) => batch.push(Card::new(CardId::new(0), deck_id, fields, now)),
                Some(Err(err)) => {
                    warn!(deck_id = %deck_id, index, error = %err, "import record skipped");
                    report.skipped.push(index);
                }
                None => {
                    warn!(deck_id = %deck_id, index, "import record is not an object");
                    report.skipped.push(index);
                }
            }
        }

        report.imported = self.cards.insert_cards(&batch).await?.len();
        if !report.skipped.is_empty() {
            warn!(deck_id = %deck_id, skipped = ?report.skipped, "import skipped records");
        }
        info!(deck_id = %deck_id, imported = report.imported, "cards imported");
        Ok(report)
    }
}

/// Fields of one import record, or `None` when the record is not an object.
fn record_fields(record: &Value) -> Option<Result<CardFields, CardError>> {
    match record {
        Value::Object(object) => Some(CardFields::from_json_object(object)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use deckflow_core::model::{DeckDraft, DeckSettings};
    use deckflow_core::time::fixed_now;
    use storage::repository::Storage;

    use crate::responses::ResponseStatus;

    async fn setup() -> (Storage, CardService, DeckId) {
        let storage = Storage::in_memory();
        let deck = DeckDraft {
            name: "Kanji".into(),
            card_template: "{{ card.data.front }}".into(),
            ..DeckDraft::with_settings(&DeckSettings::default())
        }
        .validate()
        .unwrap()
        .assign_id(DeckId::new(0), fixed_now());
        let deck = storage.decks.insert_deck(&deck).await.unwrap();
        let service = CardService::new(
            Clock::fixed(fixed_now()),
            Arc::clone(&storage.decks),
            Arc::clone(&storage.cards),
        );
        (storage, service, deck.id())
    }

    fn rows(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn edit_card_updates_fields() {
        let (storage, service, deck_id) = setup().await;
        let card = service
            .create_card(deck_id, CardFields::from_pairs([("front", "犬")]).unwrap())
            .await
            .unwrap();

        let response = service
            .edit_card(card.id(), rows(&[("front", "猫"), ("back", "cat")]))
            .await;
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.data.as_ref().and_then(|d| d.get("back")), Some("cat"));

        let stored = storage.cards.get_card(card.id()).await.unwrap().unwrap();
        assert_eq!(stored.fields().get("front"), Some("猫"));
    }

    #[tokio::test]
    async fn rejected_edit_leaves_card_unchanged() {
        let (storage, service, deck_id) = setup().await;
        let card = service
            .create_card(deck_id, CardFields::from_pairs([("front", "犬")]).unwrap())
            .await
            .unwrap();

        let response = service
            .edit_card(card.id(), rows(&[("front", "猫"), ("  ", "blank")]))
            .await;
        assert_eq!(response.status, ResponseStatus::Error);
        assert!(response.message.starts_with("Validation failed"));
        assert_eq!(response.data, None);

        let stored = storage.cards.get_card(card.id()).await.unwrap().unwrap();
        assert_eq!(stored.fields().get("front"), Some("犬"));
    }

    #[tokio::test]
    async fn edit_and_delete_unknown_card() {
        let (_storage, service, _deck_id) = setup().await;
        let edit = service
            .edit_card(CardId::new(404), rows(&[("front", "x")]))
            .await;
        assert_eq!(edit.message, "Card not found");

        let delete = service.delete_card(CardId::new(404)).await;
        assert_eq!(delete.status, ResponseStatus::Error);
        assert_eq!(delete.message, "Card not found");
    }

    #[tokio::test]
    async fn import_skips_unusable_records() {
        let (_storage, service, deck_id) = setup().await;
        let report = service
            .import_cards(deck_id, r#"[{"front":"一"}, 7, {}, {"front":"二","n":2}]"#)
            .await
            .unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, vec![1, 2]);

        let cards = service.list_cards(deck_id).await.unwrap();
        assert_eq!(cards[1].fields().get("n"), Some("2"));
    }

    #[test]
    fn import_records_report_why_they_are_unusable() {
        let empty: Value = serde_json::from_str("{}").unwrap();
        assert!(matches!(record_fields(&empty), Some(Err(CardError::NoFields))));

        let scalar: Value = serde_json::from_str("7").unwrap();
        assert!(record_fields(&scalar).is_none());

        let card: Value = serde_json::from_str(r#"{"front":"一"}"#).unwrap();
        let fields = record_fields(&card).unwrap().unwrap();
        assert_eq!(fields.get("front"), Some("一"));
    }

    #[tokio::test]
    async fn import_rejects_non_arrays() {
        let (_storage, service, deck_id) = setup().await;
        let err = service
            .import_cards(deck_id, r#"{"front":"一"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "JSON must be an array of card objects");

        let err = service
            .import_cards(DeckId::new(9), "[{\"a\":\"b\"}]")
            .await
            .unwrap_err();
        assert!(matches!(err, CardServiceError::DeckNotFound(_)));
    }

    #[tokio::test]
    async fn progress_orders_by_next_review() {
        let (storage, service, deck_id) = setup().await;
        let first = service
            .create_card(deck_id, CardFields::from_pairs([("front", "a")]).unwrap())
            .await
            .unwrap();
        let mut second = service
            .create_card(deck_id, CardFields::from_pairs([("front", "b")]).unwrap())
            .await
            .unwrap();
        let mut s = second.scheduling().clone();
        s.next_review_at = fixed_now() - chrono::Duration::days(1);
        second.set_scheduling(s);
        storage.cards.update_card(&second).await.unwrap();

        let ordered: Vec<_> = service
            .progress(deck_id)
            .await
            .unwrap()
            .iter()
            .map(Card::id)
            .collect();
        assert_eq!(ordered, vec![second.id(), first.id()]);
    }
}
