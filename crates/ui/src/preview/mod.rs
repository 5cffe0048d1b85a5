//! Live card preview for the deck editor.
//!
//! A [`PreviewSession`] owns everything the
//! editor preview shows. Rendering is a pure function of that state and the toggle
//! script is bound after every render.

mod loader;
mod render;
mod session;
mod toggle;

pub use loader::{LoadError, LoadedSample, pick_sample_file, read_embedded_sample, read_sample_file};
pub use render::{PLACEHOLDER, compose, render_preview};
pub use session::{LoadTicket, PreviewSession, PreviewStatus, RenderedPreview};
pub use toggle::{SHOW_LABEL, toggle_bind_script};
