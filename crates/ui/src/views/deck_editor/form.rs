use deckflow_core::model::DeckDraft;

/// Raw text of the deck editor inputs. Numbers stay strings until save.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeckForm {
    pub name: String,
    pub card_template: String,
    pub card_css: String,
    pub media_folder: String,
    pub new_cards_per_day: String,
    pub max_reviews_per_day: String,
    pub learning_steps: String,
    pub graduating_interval_days: String,
}

pub(crate) fn parse_count(label: &str, raw: &str) -> Result<u32, String> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| format!("{label} must be a whole number"))
}

impl DeckForm {
    #[must_use]
    pub fn from_draft(draft: &DeckDraft) -> Self {
        Self {
            name: draft.name.clone(),
            card_template: draft.card_template.clone(),
            card_css: draft.card_css.clone(),
            media_folder: draft.media_folder.clone().unwrap_or_default(),
            new_cards_per_day: draft.new_cards_per_day.to_string(),
            max_reviews_per_day: draft.max_reviews_per_day.to_string(),
            learning_steps: draft.learning_steps.clone(),
            graduating_interval_days: draft.graduating_interval_days.to_string(),
        }
    }

    /// Parses the numeric inputs. Domain checks happen in the deck service.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message naming the first unparsable number.
    pub fn to_draft(&self) -> Result<DeckDraft, String> {
        Ok(DeckDraft {
            name: self.name.clone(),
            card_template: self.card_template.clone(),
            card_css: self.card_css.clone(),
            media_folder: Some(self.media_folder.clone()),
            new_cards_per_day: parse_count("New cards per day", &self.new_cards_per_day)?,
            max_reviews_per_day: parse_count("Max reviews per day", &self.max_reviews_per_day)?,
            learning_steps: self.learning_steps.clone(),
            graduating_interval_days: parse_count(
                "Graduating interval",
                &self.graduating_interval_days,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckflow_core::model::DeckSettings;

    #[test]
    fn form_round_trips_through_draft() {
        let draft = DeckDraft {
            name: "Kanji".into(),
            card_template: "{{ card.data.front }}".into(),
            media_folder: Some("kanji".into()),
            ..DeckDraft::with_settings(&DeckSettings::default())
        };
        let form = DeckForm::from_draft(&draft);
        assert_eq!(form.learning_steps, "10 1440");
        assert_eq!(form.to_draft().unwrap(), draft);
    }

    #[test]
    fn bad_numbers_name_the_field() {
        let form = DeckForm {
            new_cards_per_day: "ten".into(),
            ..DeckForm::default()
        };
        assert_eq!(
            form.to_draft().unwrap_err(),
            "New cards per day must be a whole number"
        );
    }
}
