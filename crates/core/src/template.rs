//! Placeholder substitution for card templates.
//!
//! Templates reference card fields with `{{ card.data.<field> }}`; whitespace
//! inside the braces is ignored. Substitution is a single textual pass: values
//! are inserted verbatim and never rescanned for further placeholders.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Anything that can answer "what is the value of field `name`?".
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<&str>;
}

impl FieldSource for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<T: FieldSource + ?Sized> FieldSource for &T {
    fn field(&self, name: &str) -> Option<&str> {
        (**self).field(name)
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*card\.data\.(\w+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Text shown in place of a field the record does not have.
#[must_use]
pub fn missing_marker(name: &str) -> String {
    format!("[{name} not found]")
}

/// Replaces every placeholder in `template` with the matching field value.
///
/// ```
/// # use std::collections::BTreeMap;
/// # use deckflow_core::template::render;
/// let mut record = BTreeMap::new();
/// record.insert("front".to_string(), "犬".to_string());
///
/// assert_eq!(render("<div>{{card.data.front}}</div>", &record), "<div>犬</div>");
/// assert_eq!(render("{{ card.data.back }}", &record), "[back not found]");
/// ```
#[must_use]
pub fn render<S: FieldSource + ?Sized>(template: &str, fields: &S) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            fields
                .field(name)
                .map_or_else(|| missing_marker(name), str::to_owned)
        })
        .into_owned()
}
