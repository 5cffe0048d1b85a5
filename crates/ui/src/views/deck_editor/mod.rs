mod form;
mod view;

pub use form::DeckForm;
pub(crate) use form::parse_count;
pub use view::{DeckEditorView, NewDeckView, PREVIEW_ID};
