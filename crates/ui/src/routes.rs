use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::views::{
    CardsView, DeckEditorView, DecksView, NewDeckView, SettingsView, StudyView,
};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", DecksView)] Decks {},
        #[route("/decks/new", NewDeckView)] NewDeck {},
        #[route("/decks/:deck_id/edit", DeckEditorView)] EditDeck { deck_id: u64 },
        #[route("/decks/:deck_id/cards", CardsView)] Cards { deck_id: u64 },
        #[route("/decks/:deck_id/study", StudyView)] Study { deck_id: u64 },
        #[route("/settings", SettingsView)] Settings {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    rsx! {
        nav { class: "sidebar",
            h1 { "Deckflow" }
            ul {
                li { Link { to: Route::Decks {}, "Decks" } }
                li { Link { to: Route::NewDeck {}, "New deck" } }
                li { Link { to: Route::Settings {}, "Settings" } }
            }
        }
    }
}
