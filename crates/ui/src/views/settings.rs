use dioxus::prelude::*;

use crate::context::AppContext;
use crate::views::deck_editor::parse_count;
use crate::views::{StatusLine, StatusMessage, ViewError, ViewState, view_state_from_resource};

/// Raw text of the default-limit inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct DefaultsForm {
    new_cards_per_day: String,
    max_reviews_per_day: String,
}

impl DefaultsForm {
    fn from_limits((new_cards_per_day, max_reviews_per_day): (u32, u32)) -> Self {
        Self {
            new_cards_per_day: new_cards_per_day.to_string(),
            max_reviews_per_day: max_reviews_per_day.to_string(),
        }
    }

    fn parse(&self) -> Result<(u32, u32), String> {
        Ok((
            parse_count("New cards per day", &self.new_cards_per_day)?,
            parse_count("Max reviews per day", &self.max_reviews_per_day)?,
        ))
    }
}

#[component]
pub fn SettingsView() -> Element {
    let ctx = use_context::<AppContext>();
    let settings = ctx.settings();

    let resource = use_resource(move || {
        let settings = settings.clone();
        async move { Ok::<_, ViewError>(settings.deck_defaults().await?) }
    });
    let state = view_state_from_resource(resource);

    rsx! {
        div { class: "page settings-page",
            h2 { "Settings" }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! { p { "Loading..." } },
                ViewState::Error(err) => rsx! { p { class: "error", "{err.message()}" } },
                ViewState::Ready(limits) => rsx! { DefaultsEditor { limits } },
            }
        }
    }
}

#[component]
fn DefaultsEditor(limits: (u32, u32)) -> Element {
    let ctx = use_context::<AppContext>();
    let settings = ctx.settings();

    let mut form = use_signal(|| DefaultsForm::from_limits(limits));
    let mut status = use_signal(|| None::<StatusLine>);

    let save = move |_| {
        let settings = settings.clone();
        spawn(async move {
            let (new_cards, max_reviews) = match form.read().parse() {
                Ok(limits) => limits,
                Err(message) => {
                    status.set(Some(StatusLine::error(message)));
                    return;
                }
            };
            let line = match settings.save_deck_defaults(new_cards, max_reviews).await {
                Ok(()) => StatusLine::ok("Defaults saved"),
                Err(err) => StatusLine::error(err.to_string()),
            };
            status.set(Some(line));
        });
    };

    let values = form();

    rsx! {
        form {
            class: "settings-form",
            onsubmit: move |evt| evt.prevent_default(),
            p { class: "hint", "Limits applied to decks created from now on." }
            label { "New cards per day"
                input {
                    id: "default-new-cards",
                    r#type: "number",
                    min: "1",
                    value: "{values.new_cards_per_day}",
                    oninput: move |evt| form.write().new_cards_per_day = evt.value(),
                }
            }
            label { "Max reviews per day"
                input {
                    id: "default-max-reviews",
                    r#type: "number",
                    min: "1",
                    value: "{values.max_reviews_per_day}",
                    oninput: move |evt| form.write().max_reviews_per_day = evt.value(),
                }
            }
            StatusMessage { status: status() }
            button {
                class: "btn btn-primary",
                id: "save-settings",
                r#type: "button",
                onclick: save,
                "Save"
            }
        }
    }
}
