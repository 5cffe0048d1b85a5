use chrono::{DateTime, NaiveDate, Utc};
use deckflow_core::model::{
    Card, CardFields, CardId, CardState, Deck, DeckId, DeckSettings, ReviewLog,
    parse_learning_steps,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) const DECK_COLUMNS: &str = "id, name, card_template, card_css, media_folder, \
     new_cards_per_day, max_reviews_per_day, learning_steps, graduating_interval, created_at";

pub(crate) const CARD_COLUMNS: &str = "id, deck_id, data, state, learning_step, interval_days, \
     ease_factor, reviews, next_review_at, last_reviewed_at, introduction_date, created_at";

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps constraint violations onto domain errors; everything else is a connection failure.
pub(crate) fn db_err(e: sqlx::Error) -> StorageError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn deck_id_from_i64(v: i64) -> Result<DeckId, StorageError> {
    Ok(DeckId::new(i64_to_u64("deck_id", v)?))
}

pub(crate) fn card_id_from_i64(v: i64) -> Result<CardId, StorageError> {
    Ok(CardId::new(i64_to_u64("card_id", v)?))
}

pub(crate) fn count_from_i64(v: i64) -> Result<u32, StorageError> {
    i64_to_u32("count", v)
}

pub(crate) fn map_deck_row(row: &SqliteRow) -> Result<Deck, StorageError> {
    let steps_text: String = row.try_get("learning_steps").map_err(ser)?;
    let settings = DeckSettings::new(
        i64_to_u32(
            "new_cards_per_day",
            row.try_get("new_cards_per_day").map_err(ser)?,
        )?,
        i64_to_u32(
            "max_reviews_per_day",
            row.try_get("max_reviews_per_day").map_err(ser)?,
        )?,
        parse_learning_steps(&steps_text).map_err(ser)?,
        i64_to_u32(
            "graduating_interval",
            row.try_get("graduating_interval").map_err(ser)?,
        )?,
    )
    .map_err(ser)?;

    Deck::from_persisted(
        deck_id_from_i64(row.try_get("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get("card_template").map_err(ser)?,
        row.try_get("card_css").map_err(ser)?,
        row.try_get("media_folder").map_err(ser)?,
        settings,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_card_row(row: &SqliteRow) -> Result<Card, StorageError> {
    let data: String = row.try_get("data").map_err(ser)?;
    let fields: CardFields = serde_json::from_str(&data).map_err(ser)?;

    let state: String = row.try_get("state").map_err(ser)?;
    let mut scheduling =
        deckflow_core::model::SchedulingState::fresh(row.try_get("created_at").map_err(ser)?);
    scheduling.state = state.parse::<CardState>().map_err(ser)?;
    scheduling.learning_step = i64_to_u32("learning_step", row.try_get("learning_step").map_err(ser)?)?;
    scheduling.interval_days = row.try_get("interval_days").map_err(ser)?;
    scheduling.ease_factor = row.try_get("ease_factor").map_err(ser)?;
    scheduling.reviews = i64_to_u32("reviews", row.try_get("reviews").map_err(ser)?)?;
    scheduling.next_review_at = row.try_get("next_review_at").map_err(ser)?;
    scheduling.last_reviewed_at = row
        .try_get::<Option<DateTime<Utc>>, _>("last_reviewed_at")
        .map_err(ser)?;
    scheduling.introduction_date = row
        .try_get::<Option<NaiveDate>, _>("introduction_date")
        .map_err(ser)?;

    Card::from_persisted(
        card_id_from_i64(row.try_get("id").map_err(ser)?)?,
        deck_id_from_i64(row.try_get("deck_id").map_err(ser)?)?,
        fields,
        scheduling,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_review_log_row(row: &SqliteRow) -> Result<ReviewLog, StorageError> {
    let quality: i64 = row.try_get("quality").map_err(ser)?;
    Ok(ReviewLog {
        deck_id: deck_id_from_i64(row.try_get("deck_id").map_err(ser)?)?,
        card_id: card_id_from_i64(row.try_get("card_id").map_err(ser)?)?,
        quality: u8::try_from(quality)
            .map_err(|_| StorageError::Serialization(format!("invalid quality: {quality}")))?,
        reviewed_at: row.try_get("reviewed_at").map_err(ser)?,
    })
}
