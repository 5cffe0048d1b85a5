use chrono::{DateTime, Utc};
use dioxus::document::eval;
use dioxus::prelude::*;
use dioxus_router::Link;
use tracing::warn;

use deckflow_core::model::{CardId, DeckId, ReviewGrade};
use services::{QueueCounts, StudyCard};

use crate::context::AppContext;
use crate::preview::{compose, toggle_bind_script};
use crate::routes::Route;
use crate::views::{StatusLine, StatusMessage, ViewError, ViewState, view_state_from_resource};

pub const STUDY_CARD_ID: &str = "study-card";

#[derive(Clone, Debug, PartialEq)]
struct StudySnapshot {
    deck_name: String,
    counts: QueueCounts,
    next: Option<StudyCard>,
}

fn grade_class(grade: ReviewGrade) -> &'static str {
    match grade {
        ReviewGrade::Again => "btn grade grade--again",
        ReviewGrade::Good => "btn grade grade--good",
        ReviewGrade::Easy => "btn grade grade--easy",
    }
}

fn due_label(due: DateTime<Utc>) -> String {
    due.format("%Y-%m-%d %H:%M").to_string()
}

#[component]
pub fn StudyView(deck_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let study_service = ctx.study_service();
    let answer_service = study_service.clone();
    let deck_id = DeckId::new(deck_id);

    let mut generation = use_signal(|| 0_u64);
    let mut status = use_signal(|| None::<StatusLine>);

    let mut resource = use_resource(move || {
        let study_service = study_service.clone();
        async move {
            let next = study_service.next_card(deck_id).await?;
            let counts = study_service.queue_counts(deck_id).await?;
            let deck_name = match &next {
                Some(study) => study.deck.name().to_owned(),
                None => String::new(),
            };
            Ok::<_, ViewError>(StudySnapshot {
                deck_name,
                counts,
                next,
            })
        }
    });
    let state = view_state_from_resource(resource);

    use_effect(move || {
        let current = generation();
        if resource.value().read().is_some() {
            spawn(async move {
                let _ = eval(&toggle_bind_script(STUDY_CARD_ID, current)).await;
            });
        }
    });

    let answer = use_callback(move |(card_id, grade): (CardId, ReviewGrade)| {
        let answer_service = answer_service.clone();
        spawn(async move {
            match answer_service.answer(card_id, grade).await {
                Ok(_) => {
                    status.set(None);
                    *generation.write() += 1;
                    resource.restart();
                }
                Err(err) => {
                    warn!(card_id = %card_id, error = %err, "answer not recorded");
                    status.set(Some(StatusLine::error(err.to_string())));
                }
            }
        });
    });

    rsx! {
        div { class: "page study-page",
            StatusMessage { status: status() }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! { p { "Loading..." } },
                ViewState::Error(err) => rsx! { p { class: "error", "{err.message()}" } },
                ViewState::Ready(snapshot) => rsx! {
                    if !snapshot.deck_name.is_empty() {
                        h2 { "{snapshot.deck_name}" }
                    }
                    QueueBar { counts: snapshot.counts }
                    match snapshot.next {
                        Some(study) => rsx! {
                            StudyCardPanel {
                                study,
                                generation: generation(),
                                on_answer: move |choice| answer.call(choice),
                            }
                        },
                        None => rsx! {
                            div { class: "study-done",
                                p { "All caught up. Nothing else is due in this deck right now." }
                                Link { to: Route::Decks {}, "Back to decks" }
                            }
                        },
                    }
                },
            }
        }
    }
}

#[component]
fn QueueBar(counts: QueueCounts) -> Element {
    rsx! {
        div { class: "queue-bar",
            span { class: "queue-count queue-count--learning", "Learning {counts.learning}" }
            span { class: "queue-count queue-count--review", "Due {counts.review}" }
            span { class: "queue-count queue-count--new", "New {counts.new}" }
            span { class: "queue-count queue-count--total", "Due now {counts.total()}" }
        }
    }
}

#[component]
fn StudyCardPanel(
    study: StudyCard,
    generation: u64,
    on_answer: EventHandler<(CardId, ReviewGrade)>,
) -> Element {
    let card_id = study.card.id();
    let html = compose(
        &study.markup,
        study.deck.card_css(),
        study.deck.media_folder(),
        Utc::now().timestamp_millis(),
    );

    rsx! {
        div {
            class: "card-preview study-card",
            id: STUDY_CARD_ID,
            "data-generation": "{generation}",
            dangerous_inner_html: "{html}",
        }
        div { class: "grade-buttons",
            for (grade, due) in study.due_by_grade {
                button {
                    key: "{grade.label()}",
                    class: grade_class(grade),
                    r#type: "button",
                    title: "Next review {due_label(due)}",
                    onclick: move |_| on_answer.call((card_id, grade)),
                    "{grade.label()}"
                }
            }
        }
    }
}
