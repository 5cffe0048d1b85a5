use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use deckflow_core::model::{Card, CardFields, Deck, DeckDraft, DeckSettings};
use deckflow_core::time::fixed_clock;
use services::AppServices;

use crate::context::{UiApp, build_app_context};
use crate::views::{CardsView, DeckEditorView, DecksView, NewDeckView, SettingsView, StudyView};

pub const SAMPLE_TEMPLATE: &str = concat!(
    r#"<div class="front">{{ card.data.front }}</div>"#,
    r#"<button data-role="toggle-answer">Reveal</button>"#,
    r#"<div data-role="answer">{{ card.data.back }}</div>"#,
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Decks,
    NewDeck,
    EditDeck(u64),
    Cards(u64),
    Study(u64),
    Settings,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<AppServices>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    match use_context::<ViewKind>() {
        ViewKind::Decks => rsx! { DecksView {} },
        ViewKind::NewDeck => rsx! { NewDeckView {} },
        ViewKind::EditDeck(deck_id) => rsx! { DeckEditorView { deck_id } },
        ViewKind::Cards(deck_id) => rsx! { CardsView { deck_id } },
        ViewKind::Study(deck_id) => rsx! { StudyView { deck_id } },
        ViewKind::Settings => rsx! { SettingsView {} },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub app: Arc<AppServices>,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuilds and lets pending resources settle before rendering.
    pub async fn settle(&mut self) -> String {
        self.rebuild();
        for _ in 0..3 {
            self.drive_async().await;
        }
        self.render()
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// Services over in-memory storage with the clock pinned to `fixed_now`.
pub fn test_services() -> Arc<AppServices> {
    Arc::new(AppServices::in_memory(fixed_clock()))
}

/// Creates a deck named `name` holding one card per `(front, back)` pair.
pub async fn seed_deck(app: &AppServices, name: &str, cards: &[(&str, &str)]) -> (Deck, Vec<Card>) {
    seed_deck_with_template(app, name, SAMPLE_TEMPLATE, cards).await
}

pub async fn seed_deck_with_template(
    app: &AppServices,
    name: &str,
    card_template: &str,
    cards: &[(&str, &str)],
) -> (Deck, Vec<Card>) {
    let mut draft = DeckDraft::with_settings(&DeckSettings::default());
    draft.name = name.to_owned();
    draft.card_template = card_template.to_owned();
    draft.card_css = ".front { font-size: 2rem; }".to_owned();
    let deck = app.deck_service().create_deck(draft).await.expect("create deck");

    let mut created = Vec::new();
    for (front, back) in cards {
        let fields = CardFields::from_pairs([("front", *front), ("back", *back)]).expect("fields");
        let card = app
            .card_service()
            .create_card(deck.id(), fields)
            .await
            .expect("create card");
        created.push(card);
    }
    (deck, created)
}

pub fn setup_view_harness(view: ViewKind, app: Arc<AppServices>) -> ViewHarness {
    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app: Arc::clone(&app),
            view,
        },
    );
    ViewHarness { dom, app }
}
