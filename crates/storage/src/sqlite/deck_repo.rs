use deckflow_core::model::{Deck, DeckId};

use super::SqliteRepository;
use super::mapping::{DECK_COLUMNS, db_err, deck_id_from_i64, id_to_i64, map_deck_row};
use crate::repository::{DeckRepository, StorageError};

#[async_trait::async_trait]
impl DeckRepository for SqliteRepository {
    async fn insert_deck(&self, deck: &Deck) -> Result<Deck, StorageError> {
        let settings = deck.settings();
        let res = sqlx::query(
            r"
            INSERT INTO decks (
                name, card_template, card_css, media_folder, new_cards_per_day,
                max_reviews_per_day, learning_steps, graduating_interval, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(deck.name())
        .bind(deck.card_template())
        .bind(deck.card_css())
        .bind(deck.media_folder())
        .bind(i64::from(settings.new_cards_per_day()))
        .bind(i64::from(settings.max_reviews_per_day()))
        .bind(settings.learning_steps_text())
        .bind(i64::from(settings.graduating_interval_days()))
        .bind(deck.created_at())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = deck_id_from_i64(res.last_insert_rowid())?;
        Ok(deck.clone().assign_id(id, deck.created_at()))
    }

    async fn update_deck(&self, deck: &Deck) -> Result<(), StorageError> {
        let settings = deck.settings();
        let res = sqlx::query(
            r"
            UPDATE decks SET
                name = ?2,
                card_template = ?3,
                card_css = ?4,
                media_folder = ?5,
                new_cards_per_day = ?6,
                max_reviews_per_day = ?7,
                learning_steps = ?8,
                graduating_interval = ?9
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("deck_id", deck.id().value())?)
        .bind(deck.name())
        .bind(deck.card_template())
        .bind(deck.card_css())
        .bind(deck.media_folder())
        .bind(i64::from(settings.new_cards_per_day()))
        .bind(i64::from(settings.max_reviews_per_day()))
        .bind(settings.learning_steps_text())
        .bind(i64::from(settings.graduating_interval_days()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError> {
        let row = sqlx::query(&format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = ?1"))
            .bind(id_to_i64("deck_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(map_deck_row).transpose()
    }

    async fn list_decks(&self) -> Result<Vec<Deck>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {DECK_COLUMNS} FROM decks ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(map_deck_row).collect()
    }

    async fn delete_deck(&self, id: DeckId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM decks WHERE id = ?1")
            .bind(id_to_i64("deck_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
