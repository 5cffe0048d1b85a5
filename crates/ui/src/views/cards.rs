use dioxus::prelude::*;
use dioxus_router::Link;

use deckflow_core::model::{Card, CardId, DeckId};
use services::{CardEditResponse, DeleteResponse};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{StatusLine, StatusMessage, ViewError, ViewState, view_state_from_resource};

/// Field rows being edited in the modal, in display order.
#[derive(Clone, Debug, PartialEq, Eq)]
struct EditDraft {
    card_id: CardId,
    rows: Vec<(String, String)>,
}

impl EditDraft {
    fn from_card(card: &Card) -> Self {
        Self {
            card_id: card.id(),
            rows: card
                .fields()
                .iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
        }
    }
}

/// Refreshes the edited row from the server's field mapping. A failed edit
/// leaves every row as it was.
fn apply_edit_response(cards: &mut [Card], card_id: CardId, response: &CardEditResponse) -> StatusLine {
    match (response.is_success(), response.data.as_ref()) {
        (true, Some(fields)) => {
            if let Some(card) = cards.iter_mut().find(|card| card.id() == card_id) {
                card.set_fields(fields.clone());
            }
            StatusLine::ok(response.message.clone())
        }
        _ => StatusLine::error(response.message.clone()),
    }
}

fn apply_delete_response(cards: &mut Vec<Card>, card_id: CardId, response: &DeleteResponse) -> StatusLine {
    if response.is_success() {
        cards.retain(|card| card.id() != card_id);
        StatusLine::ok(response.message.clone())
    } else {
        StatusLine::error(response.message.clone())
    }
}

fn field_summary(card: &Card) -> String {
    card.fields()
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(" · ")
}

fn next_review_label(card: &Card) -> String {
    card.next_review_at().format("%Y-%m-%d %H:%M").to_string()
}

#[component]
pub fn CardsView(deck_id: u64) -> Element {
    let ctx = use_context::<AppContext>();
    let deck_service = ctx.deck_service();
    let card_service = ctx.card_service();
    let deck_id = DeckId::new(deck_id);

    let resource = use_resource(move || {
        let deck_service = deck_service.clone();
        let card_service = card_service.clone();
        async move {
            let deck = deck_service
                .get_deck(deck_id)
                .await?
                .ok_or(ViewError::NotFound)?;
            let cards = card_service.progress(deck_id).await?;
            Ok::<_, ViewError>((deck.name().to_owned(), cards))
        }
    });
    let state = view_state_from_resource(resource);

    rsx! {
        div { class: "page cards-page",
            match state {
                ViewState::Idle | ViewState::Loading => rsx! { p { "Loading..." } },
                ViewState::Error(err) => rsx! { p { class: "error", "{err.message()}" } },
                ViewState::Ready((deck_name, cards)) => rsx! {
                    header { class: "page-header",
                        h2 { "{deck_name}" }
                        Link { class: "btn", to: Route::Study { deck_id: deck_id.value() }, "Study" }
                    }
                    CardsTable { cards }
                },
            }
        }
    }
}

#[component]
fn CardsTable(cards: Vec<Card>) -> Element {
    let ctx = use_context::<AppContext>();
    let card_service = ctx.card_service();
    let card_service_for_delete = card_service.clone();

    let mut rows = use_signal(|| cards.clone());
    let mut editing = use_signal(|| None::<EditDraft>);
    let mut edit_status = use_signal(|| None::<StatusLine>);
    let mut pending_delete = use_signal(|| None::<CardId>);
    let mut status = use_signal(|| None::<StatusLine>);

    let save_edit = move |_| {
        let Some(draft) = editing() else {
            return;
        };
        let card_service = card_service.clone();
        spawn(async move {
            let response = card_service.edit_card(draft.card_id, draft.rows).await;
            let line = apply_edit_response(&mut rows.write(), draft.card_id, &response);
            if line.ok {
                editing.set(None);
                edit_status.set(None);
                status.set(Some(line));
            } else {
                edit_status.set(Some(line));
            }
        });
    };

    let confirm_delete = move |_| {
        let Some(card_id) = pending_delete() else {
            return;
        };
        let card_service = card_service_for_delete.clone();
        spawn(async move {
            let response = card_service.delete_card(card_id).await;
            let line = apply_delete_response(&mut rows.write(), card_id, &response);
            status.set(Some(line));
            pending_delete.set(None);
        });
    };

    let listed = rows();

    rsx! {
        StatusMessage { status: status() }
        if listed.is_empty() {
            p { class: "empty", "This deck has no cards yet." }
        } else {
            table { class: "card-table",
                thead {
                    tr {
                        th { "Fields" }
                        th { "State" }
                        th { "Reviews" }
                        th { "Next review" }
                        th {}
                    }
                }
                tbody {
                    for card in listed {
                        tr {
                            key: "{card.id()}",
                            class: "card-row",
                            id: "card-row-{card.id()}",
                            td { class: "card-fields", "{field_summary(&card)}" }
                            td { "{card.state()}" }
                            td { "{card.scheduling().reviews}" }
                            td { "{next_review_label(&card)}" }
                            td { class: "card-actions",
                                button {
                                    class: "btn btn-link",
                                    r#type: "button",
                                    onclick: {
                                        let draft = EditDraft::from_card(&card);
                                        move |_| {
                                            edit_status.set(None);
                                            editing.set(Some(draft.clone()));
                                        }
                                    },
                                    "Edit"
                                }
                                button {
                                    class: "btn btn-link btn-danger",
                                    r#type: "button",
                                    onclick: {
                                        let card_id = card.id();
                                        move |_| pending_delete.set(Some(card_id))
                                    },
                                    "Delete"
                                }
                            }
                        }
                    }
                }
            }
        }
        if let Some(draft) = editing() {
            div { class: "modal-overlay",
                div { class: "modal", role: "dialog", id: "edit-card-modal",
                    h3 { class: "modal-title", "Edit card" }
                    for (index, (name, value)) in draft.rows.iter().cloned().enumerate() {
                        div { class: "field-row", key: "{index}",
                            input {
                                class: "field-name",
                                placeholder: "Field",
                                value: "{name}",
                                oninput: move |evt| {
                                    if let Some(row) = editing.write().as_mut().and_then(|d| d.rows.get_mut(index)) {
                                        row.0 = evt.value();
                                    }
                                },
                            }
                            input {
                                class: "field-value",
                                placeholder: "Value",
                                value: "{value}",
                                oninput: move |evt| {
                                    if let Some(row) = editing.write().as_mut().and_then(|d| d.rows.get_mut(index)) {
                                        row.1 = evt.value();
                                    }
                                },
                            }
                            button {
                                class: "btn btn-link",
                                r#type: "button",
                                onclick: move |_| {
                                    if let Some(draft) = editing.write().as_mut()
                                        .filter(|d| index < d.rows.len())
                                    {
                                        draft.rows.remove(index);
                                    }
                                },
                                "Remove"
                            }
                        }
                    }
                    button {
                        class: "btn btn-link",
                        r#type: "button",
                        onclick: move |_| {
                            if let Some(draft) = editing.write().as_mut() {
                                draft.rows.push((String::new(), String::new()));
                            }
                        },
                        "Add field"
                    }
                    StatusMessage { status: edit_status() }
                    div { class: "modal-actions",
                        button {
                            class: "btn",
                            r#type: "button",
                            onclick: move |_| editing.set(None),
                            "Cancel"
                        }
                        button {
                            class: "btn btn-primary",
                            id: "save-card",
                            r#type: "button",
                            onclick: save_edit,
                            "Save"
                        }
                    }
                }
            }
        }
        if pending_delete().is_some() {
            div {
                class: "modal-overlay",
                onclick: move |_| pending_delete.set(None),
                div {
                    class: "modal",
                    role: "dialog",
                    onclick: move |evt| evt.stop_propagation(),
                    h3 { class: "modal-title", "Delete card?" }
                    p { class: "modal-body", "The card and its review history will be removed." }
                    div { class: "modal-actions",
                        button {
                            class: "btn",
                            r#type: "button",
                            onclick: move |_| pending_delete.set(None),
                            "Cancel"
                        }
                        button {
                            class: "btn btn-danger",
                            id: "confirm-delete-card",
                            r#type: "button",
                            onclick: confirm_delete,
                            "Delete"
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckflow_core::model::CardFields;
    use deckflow_core::time::fixed_now;
    use pretty_assertions::assert_eq;

    fn card(id: u64, front: &str) -> Card {
        let fields = CardFields::from_pairs([("front", front), ("back", "dog")]).unwrap();
        Card::new(CardId::new(id), DeckId::new(1), fields, fixed_now())
    }

    #[test]
    fn rejected_edit_leaves_rows_alone() {
        let mut cards = vec![card(1, "犬"), card(2, "猫")];
        let before = cards.clone();
        let response = CardEditResponse::error("Validation failed");

        let line = apply_edit_response(&mut cards, CardId::new(1), &response);

        assert!(!line.ok);
        assert_eq!(line.color(), "red");
        assert_eq!(line.text, "Validation failed");
        assert_eq!(cards, before);
    }

    #[test]
    fn accepted_edit_refreshes_matching_row() {
        let mut cards = vec![card(1, "犬"), card(2, "猫")];
        let fields = CardFields::from_pairs([("front", "鳥"), ("back", "bird")]).unwrap();
        let response = CardEditResponse::success(fields.clone());

        let line = apply_edit_response(&mut cards, CardId::new(2), &response);

        assert!(line.ok);
        assert_eq!(cards[1].fields(), &fields);
        assert_eq!(cards[0].fields().get("front"), Some("犬"));
    }

    #[test]
    fn delete_removes_row_only_on_success() {
        let mut cards = vec![card(1, "犬"), card(2, "猫")];

        let line = apply_delete_response(&mut cards, CardId::new(1), &DeleteResponse::error("Card not found"));
        assert!(!line.ok);
        assert_eq!(cards.len(), 2);

        let line = apply_delete_response(
            &mut cards,
            CardId::new(1),
            &DeleteResponse::success("Card deleted successfully"),
        );
        assert!(line.ok);
        assert_eq!(cards.iter().map(Card::id).collect::<Vec<_>>(), vec![CardId::new(2)]);
    }

    #[test]
    fn edit_draft_lists_fields_in_order() {
        let draft = EditDraft::from_card(&card(7, "犬"));
        assert_eq!(draft.card_id, CardId::new(7));
        assert_eq!(
            draft.rows,
            vec![
                ("back".to_owned(), "dog".to_owned()),
                ("front".to_owned(), "犬".to_owned())
            ]
        );
    }
}
