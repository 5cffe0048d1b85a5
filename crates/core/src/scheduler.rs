use chrono::{DateTime, Duration, Utc};

use crate::model::{Card, CardState, DeckSettings, ReviewGrade, ReviewLog, SchedulingState};

//
// ─── SCHEDULED STATES ──────────────────────────────────────────────────────────
//

/// Every possible next state of a card, one per answer button.
///
/// ```
/// # use deckflow_core::scheduler::Scheduler;
/// # use deckflow_core::model::{Card, CardFields, CardId, DeckId, DeckSettings, ReviewGrade};
/// # use deckflow_core::time::fixed_now;
/// let fields = CardFields::from_pairs([("front", "犬")]).unwrap();
/// let card = Card::new(CardId::new(1), DeckId::new(1), fields, fixed_now());
/// let states = Scheduler::new().schedule(&card, &DeckSettings::default(), fixed_now());
///
/// let good = states.select(ReviewGrade::Good);
/// assert_eq!(good.learning_step, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledStates {
    pub again: SchedulingState,
    pub good: SchedulingState,
    pub easy: SchedulingState,
}

impl ScheduledStates {
    #[must_use]
    pub fn select(&self, grade: ReviewGrade) -> &SchedulingState {
        match grade {
            ReviewGrade::Again => &self.again,
            ReviewGrade::Good => &self.good,
            ReviewGrade::Easy => &self.easy,
        }
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// SM-2 scheduler with Anki-style learning steps.
///
/// New and lapsed cards walk through the deck's learning steps (minutes)
/// before graduating to day-based review intervals driven by the ease factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduler {
    min_ease: f64,
    lapse_penalty: f64,
}

/// Outcome of answering a card: its new scheduling state plus the history row.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedReview {
    pub scheduling: SchedulingState,
    pub log: ReviewLog,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Ease never drops below 1.3; a lapse costs 0.2 ease.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_ease: 1.3,
            lapse_penalty: 0.2,
        }
    }

    #[must_use]
    pub fn min_ease(&self) -> f64 {
        self.min_ease
    }

    /// Computes the next state for each grade without committing to one.
    #[must_use]
    pub fn schedule(
        &self,
        card: &Card,
        settings: &DeckSettings,
        now: DateTime<Utc>,
    ) -> ScheduledStates {
        let current = card.scheduling();
        ScheduledStates {
            again: self.next_state(current, ReviewGrade::Again, settings, now),
            good: self.next_state(current, ReviewGrade::Good, settings, now),
            easy: self.next_state(current, ReviewGrade::Easy, settings, now),
        }
    }

    /// Answers `card` with `grade` at `now`.
    #[must_use]
    pub fn apply_review(
        &self,
        card: &Card,
        grade: ReviewGrade,
        settings: &DeckSettings,
        now: DateTime<Utc>,
    ) -> AppliedReview {
        AppliedReview {
            scheduling: self.next_state(card.scheduling(), grade, settings, now),
            log: ReviewLog::new(card.deck_id(), card.id(), grade, now),
        }
    }

    fn next_state(
        &self,
        current: &SchedulingState,
        grade: ReviewGrade,
        settings: &DeckSettings,
        now: DateTime<Utc>,
    ) -> SchedulingState {
        let mut next = current.clone();
        next.reviews = current.reviews.saturating_add(1);
        next.last_reviewed_at = Some(now);
        if next.introduction_date.is_none() {
            next.introduction_date = Some(now.date_naive());
        }

        let steps = settings.learning_steps();
        match current.state {
            CardState::New | CardState::Learning => {
                let step = if current.state == CardState::New {
                    0
                } else {
                    current.learning_step
                };
                if grade.is_correct() {
                    match usize::try_from(step).ok().and_then(|i| steps.get(i)) {
                        Some(&minutes) => {
                            next.state = CardState::Learning;
                            next.learning_step = step + 1;
                            next.next_review_at = now + Duration::minutes(i64::from(minutes));
                        }
                        None => graduate(&mut next, settings, now),
                    }
                } else {
                    restart_learning(&mut next, steps, now);
                }
            }
            CardState::Review => {
                if grade.is_correct() {
                    let interval = if current.interval_days <= 0.0 {
                        f64::from(settings.graduating_interval_days())
                    } else {
                        (current.interval_days * current.ease_factor).round()
                    };
                    next.interval_days = interval;
                    next.ease_factor =
                        (current.ease_factor + ease_delta(grade.quality())).max(self.min_ease);
                    next.next_review_at = now + days(interval);
                } else {
                    next.ease_factor = (current.ease_factor - self.lapse_penalty).max(self.min_ease);
                    next.interval_days = 0.0;
                    restart_learning(&mut next, steps, now);
                }
            }
        }
        next
    }
}

/// SM-2 ease adjustment for quality `q`.
fn ease_delta(quality: u8) -> f64 {
    let miss = f64::from(5_u8.saturating_sub(quality));
    0.1 - miss * (0.08 + miss * 0.02)
}

fn graduate(next: &mut SchedulingState, settings: &DeckSettings, now: DateTime<Utc>) {
    let interval = f64::from(settings.graduating_interval_days());
    next.state = CardState::Review;
    next.learning_step = 0;
    next.interval_days = interval;
    next.next_review_at = now + days(interval);
}

fn restart_learning(next: &mut SchedulingState, steps: &[u32], now: DateTime<Utc>) {
    next.learning_step = 0;
    match steps.first() {
        Some(&minutes) => {
            next.state = CardState::Learning;
            next.next_review_at = now + Duration::minutes(i64::from(minutes));
        }
        // Without learning steps a miss is simply seen again tomorrow.
        None => {
            next.state = CardState::Review;
            next.interval_days = 1.0;
            next.next_review_at = now + Duration::days(1);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn days(interval: f64) -> Duration {
    Duration::days(interval.round() as i64)
}
