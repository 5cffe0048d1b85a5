use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS decks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            card_template TEXT NOT NULL,
            card_css TEXT NOT NULL DEFAULT '',
            media_folder TEXT,
            new_cards_per_day INTEGER NOT NULL CHECK (new_cards_per_day >= 0),
            max_reviews_per_day INTEGER NOT NULL CHECK (max_reviews_per_day > 0),
            learning_steps TEXT NOT NULL DEFAULT '',
            graduating_interval INTEGER NOT NULL CHECK (graduating_interval > 0),
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL,
            data TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'new' CHECK (state IN ('new', 'learning', 'review')),
            learning_step INTEGER NOT NULL DEFAULT 0 CHECK (learning_step >= 0),
            interval_days REAL NOT NULL DEFAULT 0.0,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            reviews INTEGER NOT NULL DEFAULT 0 CHECK (reviews >= 0),
            next_review_at TEXT NOT NULL,
            last_reviewed_at TEXT,
            introduction_date TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS review_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL,
            card_id INTEGER NOT NULL,
            quality INTEGER NOT NULL CHECK (quality BETWEEN 0 AND 5),
            reviewed_at TEXT NOT NULL,
            FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE,
            FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS settings (
            setting_name TEXT PRIMARY KEY,
            setting_value TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_cards_deck_state_next_review
            ON cards (deck_id, state, next_review_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_cards_deck_introduced
            ON cards (deck_id, introduction_date);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_review_history_deck_reviewed_at
            ON review_history (deck_id, reviewed_at);
    ",
];

/// Applies pending schema versions, each inside its own transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
        ",
    )
    .execute(pool)
    .await?;

    for (version, statements) in [(1_i64, SCHEMA_V1)] {
        if is_applied(pool, version).await? {
            continue;
        }

        let mut tx = pool.begin().await?;
        for statement in statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
    }

    Ok(())
}
