//! Structured results handed back to the UI.
//!
//! Edit and delete operations never fail with an `Err`: every outcome is a
//! response the view can render as a status line.

use serde::{Deserialize, Serialize};

use deckflow_core::model::{CardFields, Deck};

use crate::queue::QueueCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

impl ResponseStatus {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, ResponseStatus::Success)
    }
}

/// Outcome of editing a card's fields.
///
/// On success `data` holds the fields as stored; on error it is `None` and the
/// stored card is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEditResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub data: Option<CardFields>,
}

impl CardEditResponse {
    #[must_use]
    pub fn success(data: CardFields) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: "Card updated successfully".into(),
            data: Some(data),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Outcome of deleting a deck or a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl DeleteResponse {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Summary of a bulk card import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    /// Zero-based positions of records that were not objects or had no usable fields.
    pub skipped: Vec<usize>,
}

/// Everything the deck editor needs to open an existing deck.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckEditorPayload {
    pub deck: Deck,
    /// First card's data as a JSON object, used as the embedded preview sample.
    pub sample_json: Option<String>,
}

/// Dashboard row for a deck.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckOverview {
    pub deck: Deck,
    pub total_cards: u32,
    pub reviewed_cards: u32,
    pub mastery_percent: f64,
    pub counts: QueueCounts,
}

/// Percentage of reviewed cards, rounded to one decimal place.
#[must_use]
pub fn mastery_percent(reviewed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let ratio = f64::from(reviewed) / f64::from(total) * 100.0;
    (ratio * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mastery_rounds_to_one_decimal() {
        assert_eq!(mastery_percent(0, 0), 0.0);
        assert_eq!(mastery_percent(1, 3), 33.3);
        assert_eq!(mastery_percent(2, 3), 66.7);
        assert_eq!(mastery_percent(4, 4), 100.0);
    }

    #[test]
    fn edit_response_serializes_lowercase_status() {
        let json = serde_json::to_value(CardEditResponse::error("Card not found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "Card not found", "data": null})
        );
    }
}
