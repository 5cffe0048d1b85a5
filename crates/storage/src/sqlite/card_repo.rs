use chrono::{DateTime, NaiveDate, Utc};
use deckflow_core::model::{Card, CardId, CardState, DeckId};
use sqlx::Sqlite;
use sqlx::sqlite::SqliteArguments;

use super::SqliteRepository;
use super::mapping::{
    CARD_COLUMNS, card_id_from_i64, count_from_i64, db_err, id_to_i64, map_card_row,
};
use crate::repository::{CardRepository, StorageError};

type SqliteQuery = sqlx::query::Query<'static, Sqlite, SqliteArguments<'static>>;

pub(super) fn insert_query(card: &Card) -> Result<SqliteQuery, StorageError> {
    let s = card.scheduling();
    Ok(sqlx::query(
        r"
        INSERT INTO cards (
            deck_id, data, state, learning_step, interval_days, ease_factor, reviews,
            next_review_at, last_reviewed_at, introduction_date, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ",
    )
    .bind(id_to_i64("deck_id", card.deck_id().value())?)
    .bind(card.fields().to_json())
    .bind(s.state.as_str())
    .bind(i64::from(s.learning_step))
    .bind(s.interval_days)
    .bind(s.ease_factor)
    .bind(i64::from(s.reviews))
    .bind(s.next_review_at)
    .bind(s.last_reviewed_at)
    .bind(s.introduction_date)
    .bind(card.created_at()))
}

pub(super) fn update_query(card: &Card) -> Result<SqliteQuery, StorageError> {
    let s = card.scheduling();
    Ok(sqlx::query(
        r"
        UPDATE cards SET
            data = ?2,
            state = ?3,
            learning_step = ?4,
            interval_days = ?5,
            ease_factor = ?6,
            reviews = ?7,
            next_review_at = ?8,
            last_reviewed_at = ?9,
            introduction_date = ?10
        WHERE id = ?1
        ",
    )
    .bind(id_to_i64("card_id", card.id().value())?)
    .bind(card.fields().to_json())
    .bind(s.state.as_str())
    .bind(i64::from(s.learning_step))
    .bind(s.interval_days)
    .bind(s.ease_factor)
    .bind(i64::from(s.reviews))
    .bind(s.next_review_at)
    .bind(s.last_reviewed_at)
    .bind(s.introduction_date))
}

#[async_trait::async_trait]
impl CardRepository for SqliteRepository {
    async fn insert_card(&self, card: &Card) -> Result<Card, StorageError> {
        let res = insert_query(card)?
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(card
            .clone()
            .assign_id(card_id_from_i64(res.last_insert_rowid())?))
    }

    async fn insert_cards(&self, cards: &[Card]) -> Result<Vec<Card>, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut stored = Vec::with_capacity(cards.len());
        for card in cards {
            let res = insert_query(card)?
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            stored.push(
                card.clone()
                    .assign_id(card_id_from_i64(res.last_insert_rowid())?),
            );
        }
        tx.commit().await.map_err(db_err)?;
        Ok(stored)
    }

    async fn update_card(&self, card: &Card) -> Result<(), StorageError> {
        let res = update_query(card)?
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_card(&self, id: CardId) -> Result<Option<Card>, StorageError> {
        let row = sqlx::query(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"))
            .bind(id_to_i64("card_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(map_card_row).transpose()
    }

    async fn cards_in_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE deck_id = ?1 ORDER BY id ASC"
        ))
        .bind(id_to_i64("deck_id", deck_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(map_card_row).collect()
    }

    async fn delete_card(&self, id: CardId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM cards WHERE id = ?1")
            .bind(id_to_i64("card_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn next_due(
        &self,
        deck_id: DeckId,
        state: CardState,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Card>, StorageError> {
        let row = sqlx::query(&format!(
            r"
            SELECT {CARD_COLUMNS}
            FROM cards
            WHERE deck_id = ?1 AND state = ?2 AND next_review_at <= ?3
            ORDER BY next_review_at ASC, id ASC
            LIMIT 1
            "
        ))
        .bind(id_to_i64("deck_id", deck_id.value())?)
        .bind(state.as_str())
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(map_card_row).transpose()
    }

    async fn next_new(&self, deck_id: DeckId) -> Result<Option<Card>, StorageError> {
        let row = sqlx::query(&format!(
            r"
            SELECT {CARD_COLUMNS}
            FROM cards
            WHERE deck_id = ?1 AND state = 'new'
            ORDER BY id ASC
            LIMIT 1
            "
        ))
        .bind(id_to_i64("deck_id", deck_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(map_card_row).transpose()
    }

    async fn count_due(
        &self,
        deck_id: DeckId,
        state: CardState,
        cutoff: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let n: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM cards
            WHERE deck_id = ?1 AND state = ?2 AND next_review_at <= ?3
            ",
        )
        .bind(id_to_i64("deck_id", deck_id.value())?)
        .bind(state.as_str())
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        count_from_i64(n)
    }

    async fn count_in_state(&self, deck_id: DeckId, state: CardState) -> Result<u32, StorageError> {
        let n: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cards WHERE deck_id = ?1 AND state = ?2")
                .bind(id_to_i64("deck_id", deck_id.value())?)
                .bind(state.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        count_from_i64(n)
    }

    async fn count_introduced_on(
        &self,
        deck_id: DeckId,
        day: NaiveDate,
    ) -> Result<u32, StorageError> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cards WHERE deck_id = ?1 AND introduction_date = ?2",
        )
        .bind(id_to_i64("deck_id", deck_id.value())?)
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        count_from_i64(n)
    }
}
