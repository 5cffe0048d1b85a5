mod card;
mod deck;
mod ids;
mod review;

pub use ids::{CardId, DeckId, ParseIdError};

pub use card::{Card, CardError, CardFields, CardState, SchedulingState};
pub use deck::{Deck, DeckDraft, DeckError, DeckSettings, parse_learning_steps};
pub use review::{ReviewError, ReviewGrade, ReviewLog};
