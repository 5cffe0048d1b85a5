use std::sync::Arc;

use tracing::{info, warn};

use deckflow_core::model::DeckSettings;
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

pub const DEFAULT_NEW_CARDS_PER_DAY: &str = "default_new_cards_per_day";
pub const DEFAULT_MAX_REVIEWS_PER_DAY: &str = "default_max_reviews_per_day";

/// Key/value app settings plus the daily limits that seed new decks.
#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on storage failures.
    pub async fn get(&self, key: &str) -> Result<Option<String>, SettingsServiceError> {
        Ok(self.repo.get_setting(key).await?)
    }

    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on storage failures.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), SettingsServiceError> {
        self.repo.set_setting(key, value).await?;
        Ok(())
    }

    async fn limit_or(&self, key: &str, fallback: u32) -> Result<u32, SettingsServiceError> {
        let Some(raw) = self.repo.get_setting(key).await? else {
            return Ok(fallback);
        };
        match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => Ok(value),
            _ => {
                warn!(key, value = %raw, "ignoring unusable stored limit");
                Ok(fallback)
            }
        }
    }

    /// Daily `(new cards, max reviews)` limits for new decks.
    ///
    /// Unset or unusable values fall back to the built-in deck defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on storage failures.
    pub async fn deck_defaults(&self) -> Result<(u32, u32), SettingsServiceError> {
        let builtin = DeckSettings::default();
        Ok((
            self.limit_or(DEFAULT_NEW_CARDS_PER_DAY, builtin.new_cards_per_day())
                .await?,
            self.limit_or(DEFAULT_MAX_REVIEWS_PER_DAY, builtin.max_reviews_per_day())
                .await?,
        ))
    }

    /// Deck settings carrying the stored daily limits.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::Storage` on storage failures.
    pub async fn new_deck_settings(&self) -> Result<DeckSettings, SettingsServiceError> {
        let (new_per_day, max_reviews) = self.deck_defaults().await?;
        let builtin = DeckSettings::default();
        Ok(DeckSettings::new(
            new_per_day,
            max_reviews,
            builtin.learning_steps().to_vec(),
            builtin.graduating_interval_days(),
        )
        .unwrap_or(builtin))
    }

    /// Persist the daily limits for new decks.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError::MustBePositive` for a zero limit and
    /// `SettingsServiceError::Storage` on storage failures.
    pub async fn save_deck_defaults(
        &self,
        new_cards_per_day: u32,
        max_reviews_per_day: u32,
    ) -> Result<(), SettingsServiceError> {
        if new_cards_per_day == 0 {
            return Err(SettingsServiceError::MustBePositive("new cards per day"));
        }
        if max_reviews_per_day == 0 {
            return Err(SettingsServiceError::MustBePositive("max reviews per day"));
        }
        self.repo
            .set_setting(DEFAULT_NEW_CARDS_PER_DAY, &new_cards_per_day.to_string())
            .await?;
        self.repo
            .set_setting(DEFAULT_MAX_REVIEWS_PER_DAY, &max_reviews_per_day.to_string())
            .await?;
        info!(new_cards_per_day, max_reviews_per_day, "deck defaults saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::Storage;

    fn service() -> SettingsService {
        SettingsService::new(Arc::clone(&Storage::in_memory().settings))
    }

    #[tokio::test]
    async fn defaults_fall_back_to_builtin_limits() {
        let service = service();
        assert_eq!(service.deck_defaults().await.unwrap(), (20, 200));

        service.set(DEFAULT_NEW_CARDS_PER_DAY, "oops").await.unwrap();
        assert_eq!(service.deck_defaults().await.unwrap(), (20, 200));
    }

    #[tokio::test]
    async fn saved_defaults_seed_new_decks() {
        let service = service();
        service.save_deck_defaults(5, 50).await.unwrap();

        assert_eq!(service.deck_defaults().await.unwrap(), (5, 50));
        let settings = service.new_deck_settings().await.unwrap();
        assert_eq!(settings.new_cards_per_day(), 5);
        assert_eq!(settings.learning_steps(), &[10, 1440]);
        assert_eq!(
            service.get(DEFAULT_MAX_REVIEWS_PER_DAY).await.unwrap(),
            Some("50".into())
        );
    }

    #[tokio::test]
    async fn zero_limits_are_rejected() {
        let service = service();
        let err = service.save_deck_defaults(0, 10).await.unwrap_err();
        assert!(matches!(err, SettingsServiceError::MustBePositive(_)));
        assert_eq!(service.get(DEFAULT_NEW_CARDS_PER_DAY).await.unwrap(), None);
    }
}
