use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use deckflow_core::model::{Card, CardId, Deck, DeckId, ReviewGrade};
use deckflow_core::scheduler::Scheduler;
use deckflow_core::template;
use storage::repository::{
    CardRepository, DeckRepository, ReviewLogRepository, ReviewPersistence,
};

use crate::error::StudyServiceError;
use crate::queue::{self, QueueCounts};
use crate::Clock;

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// The card to show next, already rendered through its deck template.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyCard {
    pub card: Card,
    pub deck: Deck,
    /// Template output with every field substituted; the answer region is
    /// hidden until toggled.
    pub markup: String,
    /// When the card would come back for each answer button.
    pub due_by_grade: [(ReviewGrade, DateTime<Utc>); 3],
}

/// Result of a persisted review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewResult {
    pub card: Card,
    pub grade: ReviewGrade,
    pub log_id: i64,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Drives a study session: picks cards, grades them, and keeps the daily counts.
#[derive(Clone)]
pub struct StudyService {
    clock: Clock,
    scheduler: Scheduler,
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
    review_logs: Arc<dyn ReviewLogRepository>,
    reviews: Arc<dyn ReviewPersistence>,
}

impl StudyService {
    #[must_use]
    pub fn new(
        clock: Clock,
        decks: Arc<dyn DeckRepository>,
        cards: Arc<dyn CardRepository>,
        review_logs: Arc<dyn ReviewLogRepository>,
        reviews: Arc<dyn ReviewPersistence>,
    ) -> Self {
        Self {
            clock,
            scheduler: Scheduler::new(),
            decks,
            cards,
            review_logs,
            reviews,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn deck(&self, deck_id: DeckId) -> Result<Deck, StudyServiceError> {
        self.decks
            .get_deck(deck_id)
            .await?
            .ok_or(StudyServiceError::DeckNotFound(deck_id))
    }

    /// The next card due in a deck, or `None` when the session is over.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::DeckNotFound` for an unknown deck and
    /// `StudyServiceError::Storage` if repository access fails.
    pub async fn next_card(&self, deck_id: DeckId) -> Result<Option<StudyCard>, StudyServiceError> {
        let deck = self.deck(deck_id).await?;
        let now = self.clock.now();
        let Some(card) =
            queue::next_card(self.cards.as_ref(), self.review_logs.as_ref(), &deck, now).await?
        else {
            return Ok(None);
        };

        let states = self.scheduler.schedule(&card, deck.settings(), now);
        let due_by_grade =
            ReviewGrade::ALL.map(|grade| (grade, states.select(grade).next_review_at));
        let markup = template::render(deck.card_template(), card.fields());
        Ok(Some(StudyCard {
            card,
            deck,
            markup,
            due_by_grade,
        }))
    }

    /// Learning, review, and new cards waiting right now.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::DeckNotFound` for an unknown deck and
    /// `StudyServiceError::Storage` if repository access fails.
    pub async fn queue_counts(&self, deck_id: DeckId) -> Result<QueueCounts, StudyServiceError> {
        let deck = self.deck(deck_id).await?;
        Ok(queue::counts(
            self.cards.as_ref(),
            self.review_logs.as_ref(),
            &deck,
            self.clock.now(),
        )
        .await?)
    }

    /// Reviews recorded for a deck since midnight.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::DeckNotFound` for an unknown deck and
    /// `StudyServiceError::Storage` if repository access fails.
    pub async fn reviews_done_today(&self, deck_id: DeckId) -> Result<u32, StudyServiceError> {
        let deck = self.deck(deck_id).await?;
        Ok(queue::reviews_done_today(self.review_logs.as_ref(), &deck, self.clock.now()).await?)
    }

    /// Grade a card and persist its new schedule with the history row.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::CardNotFound` or `DeckNotFound` when the
    /// card or its deck is gone, and `StudyServiceError::Storage` if the
    /// write fails.
    pub async fn answer(
        &self,
        card_id: CardId,
        grade: ReviewGrade,
    ) -> Result<ReviewResult, StudyServiceError> {
        let mut card = self
            .cards
            .get_card(card_id)
            .await?
            .ok_or(StudyServiceError::CardNotFound)?;
        let deck = self.deck(card.deck_id()).await?;

        let applied = self
            .scheduler
            .apply_review(&card, grade, deck.settings(), self.clock.now());
        card.set_scheduling(applied.scheduling);
        let log_id = self
            .reviews
            .apply_review(&card, &applied.log)
            .await
            .inspect_err(|err| error!(card_id = %card_id, error = %err, "review write failed"))?;

        info!(
            card_id = %card_id,
            grade = grade.label(),
            state = %card.state(),
            next_review_at = %card.next_review_at(),
            "card reviewed"
        );
        Ok(ReviewResult {
            card,
            grade,
            log_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use deckflow_core::model::{CardFields, CardState, DeckDraft, DeckSettings};
    use deckflow_core::time::fixed_now;
    use storage::repository::Storage;

    async fn setup(settings: DeckSettings, cards: &[&str]) -> (Storage, StudyService, DeckId) {
        let storage = Storage::in_memory();
        let deck = DeckDraft {
            name: "Kanji".into(),
            card_template: "<b>{{ card.data.front }}</b>".into(),
            ..DeckDraft::with_settings(&settings)
        }
        .validate()
        .unwrap()
        .assign_id(DeckId::new(0), fixed_now());
        let deck = storage.decks.insert_deck(&deck).await.unwrap();
        for front in cards {
            let fields = CardFields::from_pairs([("front", *front)]).unwrap();
            storage
                .cards
                .insert_card(&Card::new(CardId::new(0), deck.id(), fields, fixed_now()))
                .await
                .unwrap();
        }
        let service = StudyService::new(
            Clock::fixed(fixed_now()),
            Arc::clone(&storage.decks),
            Arc::clone(&storage.cards),
            Arc::clone(&storage.review_logs),
            Arc::clone(&storage.reviews),
        );
        (storage, service, deck.id())
    }

    #[tokio::test]
    async fn next_card_renders_markup() {
        let (_storage, service, deck_id) = setup(DeckSettings::default(), &["犬"]).await;
        let study = service.next_card(deck_id).await.unwrap().expect("card");
        assert_eq!(study.markup, "<b>犬</b>");
        assert_eq!(study.due_by_grade[0].0, ReviewGrade::Again);
        assert_eq!(study.due_by_grade[1].1, fixed_now() + Duration::minutes(10));
    }

    #[tokio::test]
    async fn learning_cards_come_back_after_their_step() {
        let (storage, service, deck_id) = setup(DeckSettings::default(), &["一", "二"]).await;
        let first = service.next_card(deck_id).await.unwrap().unwrap().card;

        let result = service.answer(first.id(), ReviewGrade::Good).await.unwrap();
        assert_eq!(result.card.state(), CardState::Learning);
        assert_eq!(storage.review_logs.logs_for_card(first.id()).await.unwrap().len(), 1);

        let next = service.next_card(deck_id).await.unwrap().unwrap().card;
        assert_ne!(next.id(), first.id());

        let later = service.clone().with_clock(Clock::fixed(fixed_now() + Duration::minutes(11)));
        let due = later.next_card(deck_id).await.unwrap().unwrap().card;
        assert_eq!(due.id(), first.id());
    }

    #[tokio::test]
    async fn new_cards_respect_daily_allowance() {
        let settings = DeckSettings::new(1, 200, vec![10], 1).unwrap();
        let (_storage, service, deck_id) = setup(settings, &["一", "二", "三"]).await;
        assert_eq!(service.queue_counts(deck_id).await.unwrap().new, 1);

        let card = service.next_card(deck_id).await.unwrap().unwrap().card;
        service.answer(card.id(), ReviewGrade::Again).await.unwrap();

        let counts = service.queue_counts(deck_id).await.unwrap();
        assert_eq!(counts.new, 0);
        assert_eq!(counts.learning, 0);
        assert!(service.next_card(deck_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn review_cap_ends_the_session() {
        let settings = DeckSettings::new(20, 1, vec![10], 1).unwrap();
        let (_storage, service, deck_id) = setup(settings, &["一", "二"]).await;

        let card = service.next_card(deck_id).await.unwrap().unwrap().card;
        service.answer(card.id(), ReviewGrade::Easy).await.unwrap();

        assert_eq!(service.reviews_done_today(deck_id).await.unwrap(), 1);
        assert!(service.next_card(deck_id).await.unwrap().is_none());
        assert_eq!(service.queue_counts(deck_id).await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn answering_unknown_card_fails() {
        let (_storage, service, _deck_id) = setup(DeckSettings::default(), &[]).await;
        let err = service
            .answer(CardId::new(42), ReviewGrade::Good)
            .await
            .unwrap_err();
        assert!(matches!(err, StudyServiceError::CardNotFound));
    }
}
