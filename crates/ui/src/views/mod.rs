mod cards;
mod deck_editor;
mod decks;
mod settings;
mod state;
mod study;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use cards::CardsView;
pub use deck_editor::{DeckEditorView, DeckForm, NewDeckView, PREVIEW_ID};
pub use decks::DecksView;
pub use settings::SettingsView;
pub use state::{StatusLine, StatusMessage, ViewError, ViewState, view_state_from_resource};
pub use study::{STUDY_CARD_ID, StudyView};
