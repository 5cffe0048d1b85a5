use async_trait::async_trait;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db_err, ser};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        sqlx::query_scalar("SELECT setting_value FROM settings WHERE setting_name = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO settings (setting_name, setting_value)
            VALUES (?1, ?2)
            ON CONFLICT(setting_name) DO UPDATE SET
                setting_value = excluded.setting_value
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_settings(&self) -> Result<Vec<(String, String)>, StorageError> {
        let rows = sqlx::query(
            "SELECT setting_name, setting_value FROM settings ORDER BY setting_name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.try_get("setting_name").map_err(ser)?,
                    row.try_get("setting_value").map_err(ser)?,
                ))
            })
            .collect()
    }
}
