use dioxus::prelude::*;
use dioxus_router::Link;

use deckflow_core::model::DeckId;
use services::DeckOverview;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{StatusLine, StatusMessage, ViewError, ViewState, view_state_from_resource};

#[derive(Clone, Debug, PartialEq)]
struct PendingDelete {
    deck_id: DeckId,
    name: String,
}

#[component]
pub fn DecksView() -> Element {
    let ctx = use_context::<AppContext>();
    let deck_service = ctx.deck_service();
    let deck_service_for_resource = deck_service.clone();

    let mut pending_delete = use_signal(|| None::<PendingDelete>);
    let mut status = use_signal(|| None::<StatusLine>);

    let mut resource = use_resource(move || {
        let deck_service = deck_service_for_resource.clone();
        async move { Ok::<_, ViewError>(deck_service.list_overviews().await?) }
    });
    let state = view_state_from_resource(resource);

    let confirm_delete = use_callback(move |()| {
        let Some(target) = pending_delete() else {
            return;
        };
        let deck_service = deck_service.clone();
        spawn(async move {
            let response = deck_service.delete_deck(target.deck_id).await;
            status.set(Some(if response.is_success() {
                StatusLine::ok(format!("Deleted {}", target.name))
            } else {
                StatusLine::error(response.message)
            }));
            pending_delete.set(None);
            resource.restart();
        });
    });

    rsx! {
        div { class: "page decks-page",
            header { class: "page-header",
                h2 { "Decks" }
                Link { class: "btn btn-primary", to: Route::NewDeck {}, "New deck" }
            }
            StatusMessage { status: status() }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! { p { "Loading..." } },
                ViewState::Error(err) => rsx! { p { class: "error", "{err.message()}" } },
                ViewState::Ready(overviews) if overviews.is_empty() => rsx! {
                    p { class: "empty", "No decks yet. Create one to get started." }
                },
                ViewState::Ready(overviews) => rsx! {
                    table { class: "deck-table",
                        thead {
                            tr {
                                th { "Deck" }
                                th { "Cards" }
                                th { "Learning" }
                                th { "Due" }
                                th { "New" }
                                th { "Due now" }
                                th { "Mastery" }
                                th {}
                            }
                        }
                        tbody {
                            for overview in overviews {
                                DeckRow {
                                    key: "{overview.deck.id()}",
                                    overview: overview.clone(),
                                    on_delete: move |target: PendingDelete| pending_delete.set(Some(target)),
                                }
                            }
                        }
                    }
                },
            }
            if let Some(target) = pending_delete() {
                div {
                    class: "modal-overlay",
                    onclick: move |_| pending_delete.set(None),
                    div {
                        class: "modal",
                        role: "dialog",
                        onclick: move |evt| evt.stop_propagation(),
                        h3 { class: "modal-title", "Delete deck?" }
                        p { class: "modal-body",
                            "“{target.name}” and all of its cards and review history will be removed."
                        }
                        div { class: "modal-actions",
                            button {
                                class: "btn",
                                r#type: "button",
                                onclick: move |_| pending_delete.set(None),
                                "Cancel"
                            }
                            button {
                                class: "btn btn-danger",
                                id: "confirm-delete-deck",
                                r#type: "button",
                                onclick: move |_| confirm_delete.call(()),
                                "Delete"
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn DeckRow(overview: DeckOverview, on_delete: EventHandler<PendingDelete>) -> Element {
    let deck_id = overview.deck.id();
    let name = overview.deck.name().to_owned();
    let counts = overview.counts;
    let mastery = format!("{:.1}%", overview.mastery_percent);
    let name_for_delete = name.clone();

    rsx! {
        tr { class: "deck-row",
            td { class: "deck-name", "{name}" }
            td { "{overview.total_cards}" }
            td { "{counts.learning}" }
            td { "{counts.review}" }
            td { "{counts.new}" }
            td { class: "deck-due-total", "{counts.total()}" }
            td { class: "deck-mastery", "{mastery}" }
            td { class: "deck-actions",
                Link { to: Route::Study { deck_id: deck_id.value() }, "Study" }
                Link { to: Route::EditDeck { deck_id: deck_id.value() }, "Edit" }
                Link { to: Route::Cards { deck_id: deck_id.value() }, "Cards" }
                button {
                    class: "btn btn-link btn-danger",
                    r#type: "button",
                    onclick: move |_| on_delete.call(PendingDelete {
                        deck_id,
                        name: name_for_delete.clone(),
                    }),
                    "Delete"
                }
            }
        }
    }
}
