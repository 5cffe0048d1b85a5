use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use deckflow_core::model::{Card, CardState, Deck};
use deckflow_core::time::day_bounds;
use storage::repository::{CardRepository, ReviewLogRepository, StorageError};

/// Cards waiting in each part of a deck's study queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub learning: u32,
    pub review: u32,
    pub new: u32,
}

impl QueueCounts {
    #[must_use]
    pub fn total(&self) -> u32 {
        self.learning + self.review + self.new
    }
}

/// Last instant of the calendar day containing `now`.
fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    day_bounds(now).1 - Duration::nanoseconds(1)
}

pub(crate) async fn reviews_done_today(
    logs: &dyn ReviewLogRepository,
    deck: &Deck,
    now: DateTime<Utc>,
) -> Result<u32, StorageError> {
    let (start, end) = day_bounds(now);
    logs.count_reviews_between(deck.id(), start, end).await
}

async fn new_allowance(
    cards: &dyn CardRepository,
    deck: &Deck,
    now: DateTime<Utc>,
) -> Result<u32, StorageError> {
    let introduced = cards
        .count_introduced_on(deck.id(), now.date_naive())
        .await?;
    Ok(deck
        .settings()
        .new_cards_per_day()
        .saturating_sub(introduced))
}

/// Zero across the board once today's review cap is spent.
pub(crate) async fn counts(
    cards: &dyn CardRepository,
    logs: &dyn ReviewLogRepository,
    deck: &Deck,
    now: DateTime<Utc>,
) -> Result<QueueCounts, StorageError> {
    if reviews_done_today(logs, deck, now).await? >= deck.settings().max_reviews_per_day() {
        return Ok(QueueCounts::default());
    }
    let learning = cards.count_due(deck.id(), CardState::Learning, now).await?;
    let review = cards
        .count_due(deck.id(), CardState::Review, end_of_day(now))
        .await?;
    let unseen = cards.count_in_state(deck.id(), CardState::New).await?;
    let new = unseen.min(new_allowance(cards, deck, now).await?);
    Ok(QueueCounts {
        learning,
        review,
        new,
    })
}

/// Picks the next card: due learning cards, then reviews due today, then new
/// cards while the daily allowance lasts. Nothing once the review cap is hit.
pub(crate) async fn next_card(
    cards: &dyn CardRepository,
    logs: &dyn ReviewLogRepository,
    deck: &Deck,
    now: DateTime<Utc>,
) -> Result<Option<Card>, StorageError> {
    if reviews_done_today(logs, deck, now).await? >= deck.settings().max_reviews_per_day() {
        return Ok(None);
    }
    if let Some(card) = cards.next_due(deck.id(), CardState::Learning, now).await? {
        return Ok(Some(card));
    }
    if let Some(card) = cards
        .next_due(deck.id(), CardState::Review, end_of_day(now))
        .await?
    {
        return Ok(Some(card));
    }
    if new_allowance(cards, deck, now).await? > 0 {
        return cards.next_new(deck.id()).await;
    }
    Ok(None)
}
