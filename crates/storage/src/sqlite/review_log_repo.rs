use chrono::{DateTime, Utc};
use deckflow_core::model::{Card, CardId, DeckId, ReviewLog};

use super::SqliteRepository;
use super::card_repo::update_query;
use super::mapping::{count_from_i64, db_err, id_to_i64, map_review_log_row};
use crate::repository::{ReviewLogRepository, ReviewPersistence, StorageError};

fn append_query(
    log: &ReviewLog,
) -> Result<sqlx::query::Query<'static, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'static>>, StorageError>
{
    Ok(sqlx::query(
        r"
            INSERT INTO review_history (deck_id, card_id, quality, reviewed_at)
            VALUES (?1, ?2, ?3, ?4)
        ",
    )
    .bind(id_to_i64("deck_id", log.deck_id.value())?)
    .bind(id_to_i64("card_id", log.card_id.value())?)
    .bind(i64::from(log.quality))
    .bind(log.reviewed_at))
}

#[async_trait::async_trait]
impl ReviewLogRepository for SqliteRepository {
    async fn append_log(&self, log: &ReviewLog) -> Result<i64, StorageError> {
        let res = append_query(log)?
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.last_insert_rowid())
    }

    async fn count_reviews_between(
        &self,
        deck_id: DeckId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let n: i64 = sqlx::query_scalar(
            r"
                SELECT COUNT(*) FROM review_history
                WHERE deck_id = ?1 AND reviewed_at >= ?2 AND reviewed_at < ?3
            ",
        )
        .bind(id_to_i64("deck_id", deck_id.value())?)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        count_from_i64(n)
    }

    async fn logs_for_card(&self, card_id: CardId) -> Result<Vec<ReviewLog>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT deck_id, card_id, quality, reviewed_at
                FROM review_history
                WHERE card_id = ?1
                ORDER BY reviewed_at ASC, id ASC
            ",
        )
        .bind(id_to_i64("card_id", card_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_review_log_row).collect()
    }
}

#[async_trait::async_trait]
impl ReviewPersistence for SqliteRepository {
    async fn apply_review(&self, card: &Card, log: &ReviewLog) -> Result<i64, StorageError> {
        if log.card_id != card.id() || log.deck_id != card.deck_id() {
            return Err(StorageError::Conflict);
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated = update_query(card)?
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let res = append_query(log)?
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(res.last_insert_rowid())
    }
}
