use dioxus::prelude::*;
use tracing::error;

use services::{CardServiceError, DeckServiceError, SettingsServiceError, StudyServiceError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    NotFound,
    Storage,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::NotFound => "That deck or card no longer exists.",
            ViewError::Storage => "Could not reach the database. Please try again.",
            ViewError::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl From<DeckServiceError> for ViewError {
    fn from(err: DeckServiceError) -> Self {
        match err {
            DeckServiceError::NotFound(_) => ViewError::NotFound,
            other => {
                error!(error = %other, "deck view failed");
                ViewError::Storage
            }
        }
    }
}

impl From<CardServiceError> for ViewError {
    fn from(err: CardServiceError) -> Self {
        match err {
            CardServiceError::DeckNotFound(_) => ViewError::NotFound,
            other => {
                error!(error = %other, "card view failed");
                ViewError::Storage
            }
        }
    }
}

impl From<StudyServiceError> for ViewError {
    fn from(err: StudyServiceError) -> Self {
        match err {
            StudyServiceError::DeckNotFound(_) | StudyServiceError::CardNotFound => {
                ViewError::NotFound
            }
            other => {
                error!(error = %other, "study view failed");
                ViewError::Storage
            }
        }
    }
}

impl From<SettingsServiceError> for ViewError {
    fn from(err: SettingsServiceError) -> Self {
        error!(error = %err, "settings view failed");
        ViewError::Storage
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}

/// Green or red status line under a form or table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub ok: bool,
    pub text: String,
}

impl StatusLine {
    #[must_use]
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn color(&self) -> &'static str {
        if self.ok { "green" } else { "red" }
    }

    #[must_use]
    pub fn class(&self) -> &'static str {
        if self.ok {
            "status status--ok"
        } else {
            "status status--error"
        }
    }
}

#[component]
pub fn StatusMessage(#[props(!optional)] status: Option<StatusLine>) -> Element {
    match status {
        Some(line) => rsx! {
            p {
                class: line.class(),
                style: "color: {line.color()}",
                role: "status",
                "{line.text}"
            }
        },
        None => rsx! {},
    }
}
