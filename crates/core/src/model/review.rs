use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CardId, DeckId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid review quality: {0} (expected 0-5)")]
    InvalidQuality(u8),
}

//
// ─── REVIEW GRADE ─────────────────────────────────────────────────────────────
//

/// Answer buttons offered while studying, mapped onto the SM-2 quality scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewGrade {
    /// Forgotten. Quality 1.
    Again,
    /// Recalled. Quality 3.
    Good,
    /// Recalled without effort. Quality 5.
    Easy,
}

impl ReviewGrade {
    pub const ALL: [ReviewGrade; 3] = [ReviewGrade::Again, ReviewGrade::Good, ReviewGrade::Easy];

    /// SM-2 quality (0-5) recorded for this grade.
    #[must_use]
    pub fn quality(self) -> u8 {
        match self {
            ReviewGrade::Again => 1,
            ReviewGrade::Good => 3,
            ReviewGrade::Easy => 5,
        }
    }

    /// Buckets a raw quality value into a grade: 0-2 again, 3-4 good, 5 easy.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidQuality` above 5.
    pub fn from_quality(quality: u8) -> Result<Self, ReviewError> {
        match quality {
            0..=2 => Ok(ReviewGrade::Again),
            3 | 4 => Ok(ReviewGrade::Good),
            5 => Ok(ReviewGrade::Easy),
            other => Err(ReviewError::InvalidQuality(other)),
        }
    }

    #[must_use]
    pub fn is_correct(self) -> bool {
        self.quality() >= 3
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ReviewGrade::Again => "Again",
            ReviewGrade::Good => "Good",
            ReviewGrade::Easy => "Easy",
        }
    }
}

//
// ─── REVIEW LOG ───────────────────────────────────────────────────────────────
//

/// One row of review history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub deck_id: DeckId,
    pub card_id: CardId,
    pub quality: u8,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewLog {
    #[must_use]
    pub fn new(deck_id: DeckId, card_id: CardId, grade: ReviewGrade, reviewed_at: DateTime<Utc>) -> Self {
        Self {
            deck_id,
            card_id,
            quality: grade.quality(),
            reviewed_at,
        }
    }
}
