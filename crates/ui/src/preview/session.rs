use deckflow_core::sample::SampleRecord;

use super::loader::{LoadError, LoadedSample, read_embedded_sample};
use super::render::render_preview;

/// Message shown under the sample picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewStatus {
    Empty,
    Embedded,
    Loaded { file_name: String },
    Error(String),
}

impl PreviewStatus {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, PreviewStatus::Error(_))
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            PreviewStatus::Empty => "No sample data loaded.".into(),
            PreviewStatus::Embedded => "Showing the deck's first card.".into(),
            PreviewStatus::Loaded { file_name } => format!("Loaded sample from {file_name}"),
            PreviewStatus::Error(message) => message.clone(),
        }
    }
}

/// Identifies one file load. Only the most recent ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Markup for the preview region plus the generation it was rendered at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPreview {
    pub generation: u64,
    pub html: String,
}

/// Everything the deck editor's preview shows, owned by the editor view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSession {
    template: String,
    css: String,
    media_folder: Option<String>,
    record: Option<SampleRecord>,
    source_text: Option<String>,
    status: PreviewStatus,
    generation: u64,
    latest_load: u64,
}

impl PreviewSession {
    #[must_use]
    pub fn new(template: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            css: css.into(),
            media_folder: None,
            record: None,
            source_text: None,
            status: PreviewStatus::Empty,
            generation: 0,
            latest_load: 0,
        }
    }

    /// Session for an existing deck, seeded from its embedded sample.
    ///
    /// Malformed embedded text leaves the record absent and sets an error status.
    #[must_use]
    pub fn with_embedded(
        template: impl Into<String>,
        css: impl Into<String>,
        embedded: Option<&str>,
    ) -> Self {
        let mut session = Self::new(template, css);
        if let Some(text) = embedded {
            match read_embedded_sample(text) {
                Ok(record) => {
                    session.record = Some(record);
                    session.status = PreviewStatus::Embedded;
                }
                Err(err) => session.status = PreviewStatus::Error(err.to_string()),
            }
        }
        session
    }

    /// Sets the folder relative media sources resolve against.
    #[must_use]
    pub fn with_media_folder(mut self, media_folder: Option<&str>) -> Self {
        self.media_folder = media_folder.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn css(&self) -> &str {
        &self.css
    }

    #[must_use]
    pub fn record(&self) -> Option<&SampleRecord> {
        self.record.as_ref()
    }

    /// Raw text of the last successfully loaded file, kept for import on save.
    #[must_use]
    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> &PreviewStatus {
        &self.status
    }

    /// Bumped on every change that alters the rendered output.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
        self.generation += 1;
    }

    pub fn set_css(&mut self, css: impl Into<String>) {
        self.css = css.into();
        self.generation += 1;
    }

    pub fn set_media_folder(&mut self, media_folder: impl Into<String>) {
        self.media_folder = Some(media_folder.into());
        self.generation += 1;
    }

    /// Starts a file load. Any load started earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_load += 1;
        LoadTicket(self.latest_load)
    }

    /// Applies the outcome of a load. Returns `false` and changes nothing when
    /// a newer load has started since `ticket` was issued.
    ///
    /// A failed load keeps the previous record and only reports the error.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: Result<LoadedSample, LoadError>,
    ) -> bool {
        if ticket.0 != self.latest_load {
            return false;
        }
        match outcome {
            Ok(loaded) => {
                self.record = Some(loaded.record);
                self.source_text = Some(loaded.text);
                self.status = PreviewStatus::Loaded {
                    file_name: loaded.file_name,
                };
                self.generation += 1;
            }
            Err(err) => self.status = PreviewStatus::Error(err.to_string()),
        }
        true
    }

    /// Renders the preview region's inner HTML at the current generation.
    #[must_use]
    pub fn render(&self, stamp: i64) -> RenderedPreview {
        RenderedPreview {
            generation: self.generation,
            html: render_preview(
                &self.template,
                &self.css,
                self.record.as_ref(),
                self.media_folder.as_deref(),
                stamp,
            ),
        }
    }
}
