use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::ids::{CardId, DeckId};
use crate::sample::value_text;
use crate::template::FieldSource;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("a card needs at least one field")]
    NoFields,

    #[error("field names cannot be empty")]
    EmptyFieldName,

    #[error("duplicate field name `{0}`")]
    DuplicateField(String),

    #[error("unknown card state `{0}`")]
    UnknownState(String),

    #[error("invalid persisted card: {0}")]
    InvalidPersistedState(String),
}

//
// ─── FIELDS ────────────────────────────────────────────────────────────────────
//

/// Validated field map of a card, e.g. `{"front": "犬", "back": "dog"}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardFields(BTreeMap<String, String>);

impl CardFields {
    /// Builds fields from name/value pairs, trimming names.
    ///
    /// # Errors
    ///
    /// Returns `CardError` when there are no pairs, a name is blank, or two
    /// names collide after trimming.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, CardError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(CardError::EmptyFieldName);
            }
            if map.insert(name.to_owned(), value.into()).is_some() {
                return Err(CardError::DuplicateField(name.to_owned()));
            }
        }
        if map.is_empty() {
            return Err(CardError::NoFields);
        }
        Ok(Self(map))
    }

    /// Builds fields from a JSON object, turning non-string values into text.
    ///
    /// # Errors
    ///
    /// Same as [`CardFields::from_pairs`].
    pub fn from_json_object(object: &Map<String, Value>) -> Result<Self, CardError> {
        Self::from_pairs(object.iter().map(|(k, v)| (k, value_text(v))))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON object text, as stored in the `data` column.
    #[must_use]
    pub fn to_json(&self) -> String {
        let object: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(object).to_string()
    }
}

impl FieldSource for CardFields {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

//
// ─── SCHEDULING ────────────────────────────────────────────────────────────────
//

/// Position of a card in the learning lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    New,
    Learning,
    Review,
}

impl CardState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
        }
    }
}

impl fmt::Display for CardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardState {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            other => Err(CardError::UnknownState(other.to_owned())),
        }
    }
}

/// SM-2 bookkeeping carried by every card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub state: CardState,
    pub learning_step: u32,
    pub interval_days: f64,
    pub ease_factor: f64,
    pub reviews: u32,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub introduction_date: Option<NaiveDate>,
}

impl SchedulingState {
    pub const INITIAL_EASE: f64 = 2.5;

    /// State of a card that has never been studied.
    #[must_use]
    pub fn fresh(created_at: DateTime<Utc>) -> Self {
        Self {
            state: CardState::New,
            learning_step: 0,
            interval_days: 0.0,
            ease_factor: Self::INITIAL_EASE,
            reviews: 0,
            next_review_at: created_at,
            last_reviewed_at: None,
            introduction_date: None,
        }
    }
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    deck_id: DeckId,
    fields: CardFields,
    scheduling: SchedulingState,
    created_at: DateTime<Utc>,
}

impl Card {
    /// A brand-new card in the `new` state.
    #[must_use]
    pub fn new(id: CardId, deck_id: DeckId, fields: CardFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            deck_id,
            fields,
            scheduling: SchedulingState::fresh(created_at),
            created_at,
        }
    }

    /// Rehydrates a card from storage.
    ///
    /// # Errors
    ///
    /// Returns `CardError::InvalidPersistedState` if the ease factor is not
    /// finite and positive or the interval is negative.
    pub fn from_persisted(
        id: CardId,
        deck_id: DeckId,
        fields: CardFields,
        scheduling: SchedulingState,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CardError> {
        if !scheduling.ease_factor.is_finite() || scheduling.ease_factor <= 0.0 {
            return Err(CardError::InvalidPersistedState(format!(
                "ease factor {}",
                scheduling.ease_factor
            )));
        }
        if !scheduling.interval_days.is_finite() || scheduling.interval_days < 0.0 {
            return Err(CardError::InvalidPersistedState(format!(
                "interval {}",
                scheduling.interval_days
            )));
        }
        Ok(Self {
            id,
            deck_id,
            fields,
            scheduling,
            created_at,
        })
    }

    #[must_use]
    pub fn assign_id(mut self, id: CardId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn fields(&self) -> &CardFields {
        &self.fields
    }

    pub fn set_fields(&mut self, fields: CardFields) {
        self.fields = fields;
    }

    #[must_use]
    pub fn scheduling(&self) -> &SchedulingState {
        &self.scheduling
    }

    pub fn set_scheduling(&mut self, scheduling: SchedulingState) {
        self.scheduling = scheduling;
    }

    #[must_use]
    pub fn state(&self) -> CardState {
        self.scheduling.state
    }

    #[must_use]
    pub fn next_review_at(&self) -> DateTime<Utc> {
        self.scheduling.next_review_at
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the card has been answered at least once.
    #[must_use]
    pub fn is_reviewed(&self) -> bool {
        self.scheduling.reviews > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn from_pairs_trims_and_rejects_blank_names() {
        let fields = CardFields::from_pairs([(" front ", "犬"), ("back", "dog")]).unwrap();
        assert_eq!(fields.get("front"), Some("犬"));
        assert_eq!(fields.len(), 2);

        assert_eq!(
            CardFields::from_pairs([("  ", "x")]).unwrap_err(),
            CardError::EmptyFieldName
        );
        assert_eq!(
            CardFields::from_pairs(Vec::<(String, String)>::new()).unwrap_err(),
            CardError::NoFields
        );
        assert_eq!(
            CardFields::from_pairs([("a", "1"), (" a", "2")]).unwrap_err(),
            CardError::DuplicateField("a".into())
        );
    }

    #[test]
    fn from_json_object_stringifies_scalars() {
        let value: Value =
            serde_json::from_str(r#"{"front":"犬","strokes":4,"common":true,"note":null}"#)
                .unwrap();
        let fields = CardFields::from_json_object(value.as_object().unwrap()).unwrap();
        assert_eq!(fields.get("strokes"), Some("4"));
        assert_eq!(fields.get("common"), Some("true"));
        assert_eq!(fields.get("note"), Some(""));
    }

    #[test]
    fn to_json_is_a_round_trippable_object() {
        let fields = CardFields::from_pairs([("back", "dog"), ("front", "犬")]).unwrap();
        assert_eq!(fields.to_json(), r#"{"back":"dog","front":"犬"}"#);
        let parsed: CardFields = serde_json::from_str(&fields.to_json()).unwrap();
        assert_eq!(parsed, fields);
    }

    #[test]
    fn card_state_parses_storage_text() {
        assert_eq!("learning".parse::<CardState>().unwrap(), CardState::Learning);
        assert!("relearning".parse::<CardState>().is_err());
        assert_eq!(CardState::Review.to_string(), "review");
    }

    #[test]
    fn new_card_starts_unreviewed() {
        let fields = CardFields::from_pairs([("q", "a")]).unwrap();
        let card = Card::new(CardId::new(1), DeckId::new(1), fields, fixed_now());
        assert_eq!(card.state(), CardState::New);
        assert!(!card.is_reviewed());
        assert_eq!(card.scheduling().ease_factor, 2.5);
        assert_eq!(card.next_review_at(), fixed_now());
    }

    #[test]
    fn from_persisted_rejects_broken_ease() {
        let fields = CardFields::from_pairs([("q", "a")]).unwrap();
        let mut scheduling = SchedulingState::fresh(fixed_now());
        scheduling.ease_factor = f64::NAN;
        let err = Card::from_persisted(
            CardId::new(1),
            DeckId::new(1),
            fields,
            scheduling,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, CardError::InvalidPersistedState(_)));
    }
}
