use dioxus::document::eval;
use dioxus::prelude::*;
use dioxus_router::use_navigator;
use tracing::{info, warn};

use deckflow_core::model::{DeckDraft, DeckId};

use crate::context::AppContext;
use crate::preview::{PreviewSession, PreviewStatus, pick_sample_file, read_sample_file, toggle_bind_script};
use crate::routes::Route;
use crate::views::{StatusLine, StatusMessage, ViewError, ViewState, view_state_from_resource};

use super::form::DeckForm;

pub const PREVIEW_ID: &str = "deck-preview";

/// What the editor opens with: the form contents and the preview session.
#[derive(Clone, Debug, PartialEq)]
struct EditorSeed {
    deck_id: Option<DeckId>,
    form: DeckForm,
    session: PreviewSession,
}

fn preview_stamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn sample_status_line(status: &PreviewStatus) -> Option<StatusLine> {
    match status {
        PreviewStatus::Empty => None,
        PreviewStatus::Error(message) => Some(StatusLine::error(message.clone())),
        other => Some(StatusLine::ok(other.message())),
    }
}

#[component]
pub fn NewDeckView() -> Element {
    rsx! { DeckEditor { deck_id: None } }
}

#[component]
pub fn DeckEditorView(deck_id: u64) -> Element {
    rsx! { DeckEditor { deck_id: Some(deck_id) } }
}

#[component]
fn DeckEditor(#[props(!optional)] deck_id: Option<u64>) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let deck_service = ctx.deck_service();
    let settings = ctx.settings();
    let deck_id = deck_id.map(DeckId::new);

    let resource = use_resource(move || {
        let deck_service = deck_service.clone();
        let settings = settings.clone();
        async move {
            let seed = match deck_id {
                Some(id) => {
                    let payload = deck_service.editor_payload(id).await?;
                    EditorSeed {
                        deck_id: Some(id),
                        form: DeckForm::from_draft(&DeckDraft::from(&payload.deck)),
                        session: PreviewSession::with_embedded(
                            payload.deck.card_template(),
                            payload.deck.card_css(),
                            payload.sample_json.as_deref(),
                        )
                        .with_media_folder(payload.deck.media_folder()),
                    }
                }
                None => {
                    let defaults = settings.new_deck_settings().await?;
                    EditorSeed {
                        deck_id: None,
                        form: DeckForm::from_draft(&DeckDraft::with_settings(&defaults)),
                        session: PreviewSession::new("", ""),
                    }
                }
            };
            Ok::<_, ViewError>(seed)
        }
    });
    let state = view_state_from_resource(resource);

    rsx! {
        div { class: "page deck-editor-page",
            h2 { if deck_id.is_some() { "Edit deck" } else { "New deck" } }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! { p { "Loading..." } },
                ViewState::Error(err) => rsx! { p { class: "error", "{err.message()}" } },
                ViewState::Ready(seed) => rsx! {
                    DeckEditorForm {
                        seed,
                        on_saved: move |()| {
                            let _ = navigator.push(Route::Decks {});
                        },
                    }
                },
            }
        }
    }
}

#[component]
fn DeckEditorForm(seed: EditorSeed, on_saved: EventHandler<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let deck_service = ctx.deck_service();
    let card_service = ctx.card_service();
    let deck_id = seed.deck_id;

    let mut form = use_signal(|| seed.form.clone());
    let mut session = use_signal(|| seed.session.clone());
    let mut import_on_save = use_signal(|| false);
    let mut status = use_signal(|| None::<StatusLine>);
    let mut saving = use_signal(|| false);

    let rendered = use_memo(move || session.read().render(preview_stamp()));

    use_effect(move || {
        let generation = rendered.read().generation;
        spawn(async move {
            let _ = eval(&toggle_bind_script(PREVIEW_ID, generation)).await;
        });
    });

    let choose_file = move |_| {
        spawn(async move {
            let Some(path) = pick_sample_file().await else {
                return;
            };
            let ticket = session.write().begin_load();
            let outcome = read_sample_file(&path).await;
            session.write().finish_load(ticket, outcome);
        });
    };

    let save = move |_| {
        let deck_service = deck_service.clone();
        let card_service = card_service.clone();
        spawn(async move {
            let draft = match form.read().to_draft() {
                Ok(draft) => draft,
                Err(message) => {
                    status.set(Some(StatusLine::error(message)));
                    return;
                }
            };
            saving.set(true);
            let saved = match deck_id {
                Some(id) => deck_service.update_deck(id, draft).await,
                None => deck_service.create_deck(draft).await,
            };
            let deck = match saved {
                Ok(deck) => deck,
                Err(err) => {
                    warn!(error = %err, "deck save rejected");
                    status.set(Some(StatusLine::error(err.to_string())));
                    saving.set(false);
                    return;
                }
            };

            let import_text = session.read().source_text().map(str::to_owned);
            if let (true, Some(text)) = (import_on_save(), import_text) {
                match card_service.import_cards(deck.id(), &text).await {
                    Ok(report) => info!(
                        deck_id = %deck.id(),
                        imported = report.imported,
                        "sample file imported on save"
                    ),
                    Err(err) => {
                        status.set(Some(StatusLine::error(format!(
                            "Deck saved, but the import failed: {err}"
                        ))));
                        saving.set(false);
                        return;
                    }
                }
            }
            saving.set(false);
            on_saved.call(());
        });
    };

    let preview = rendered();
    let sample_status = sample_status_line(session.read().status());
    let has_source = session.read().source_text().is_some();
    let values = form();

    rsx! {
        div { class: "deck-editor",
            form {
                class: "deck-form",
                onsubmit: move |evt| evt.prevent_default(),
                label { "Name"
                    input {
                        id: "deck-name",
                        value: "{values.name}",
                        oninput: move |evt| form.write().name = evt.value(),
                    }
                }
                label { "Card template"
                    textarea {
                        id: "deck-template",
                        rows: "10",
                        value: "{values.card_template}",
                        oninput: move |evt| {
                            let value = evt.value();
                            form.write().card_template = value.clone();
                            session.write().set_template(value);
                        },
                    }
                }
                label { "Card CSS"
                    textarea {
                        id: "deck-css",
                        rows: "6",
                        value: "{values.card_css}",
                        oninput: move |evt| {
                            let value = evt.value();
                            form.write().card_css = value.clone();
                            session.write().set_css(value);
                        },
                    }
                }
                label { "Media folder"
                    input {
                        value: "{values.media_folder}",
                        oninput: move |evt| {
                            let value = evt.value();
                            form.write().media_folder = value.clone();
                            session.write().set_media_folder(value);
                        },
                    }
                }
                fieldset { class: "deck-limits",
                    legend { "Scheduling" }
                    label { "New cards per day"
                        input {
                            r#type: "number",
                            min: "0",
                            value: "{values.new_cards_per_day}",
                            oninput: move |evt| form.write().new_cards_per_day = evt.value(),
                        }
                    }
                    label { "Max reviews per day"
                        input {
                            r#type: "number",
                            min: "1",
                            value: "{values.max_reviews_per_day}",
                            oninput: move |evt| form.write().max_reviews_per_day = evt.value(),
                        }
                    }
                    label { "Learning steps (minutes)"
                        input {
                            value: "{values.learning_steps}",
                            oninput: move |evt| form.write().learning_steps = evt.value(),
                        }
                    }
                    label { "Graduating interval (days)"
                        input {
                            r#type: "number",
                            min: "1",
                            value: "{values.graduating_interval_days}",
                            oninput: move |evt| form.write().graduating_interval_days = evt.value(),
                        }
                    }
                }
                div { class: "sample-picker",
                    button {
                        class: "btn",
                        id: "choose-sample",
                        r#type: "button",
                        onclick: choose_file,
                        "Load sample JSON…"
                    }
                    if has_source {
                        label { class: "import-toggle",
                            input {
                                r#type: "checkbox",
                                checked: import_on_save(),
                                onchange: move |evt| import_on_save.set(evt.checked()),
                            }
                            "Import every card from this file on save"
                        }
                    }
                    StatusMessage { status: sample_status }
                }
                StatusMessage { status: status() }
                button {
                    class: "btn btn-primary",
                    id: "save-deck",
                    r#type: "button",
                    disabled: saving(),
                    onclick: save,
                    "Save deck"
                }
            }
            section { class: "deck-preview-pane",
                h3 { "Preview" }
                div {
                    class: "card-preview",
                    id: PREVIEW_ID,
                    "data-generation": "{preview.generation}",
                    dangerous_inner_html: "{preview.html}",
                }
            }
        }
    }
}
