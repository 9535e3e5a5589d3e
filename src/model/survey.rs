use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    clock,
    id::{Id, PublicId},
};

pub const MIN_QUESTION_LENGTH: usize = 5;
pub const MAX_QUESTION_LENGTH: usize = 300;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;
pub const MAX_OPTION_LENGTH: usize = 100;

/// One answer a voter may pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyOption {
    pub id: Id,
    pub text: String,
}

impl SurveyOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            text: text.into(),
        }
    }
}

/// A survey, as persisted in the data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Id,
    pub question: String,
    pub options: Vec<SurveyOption>,
    pub public_id: PublicId,
    pub created_by_user_id: Id,
    pub created_at: DateTime<Utc>,
}

impl Survey {
    /// Build a new survey from a validated spec, minting every id.
    pub fn new(spec: SurveySpec, created_by: Id) -> Self {
        Self {
            id: Id::new(),
            question: spec.question,
            options: spec.options.into_iter().map(SurveyOption::new).collect(),
            public_id: PublicId::new(),
            created_by_user_id: created_by,
            created_at: clock::now(),
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&SurveyOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// Request body for creating a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySpec {
    pub question: String,
    pub options: Vec<String>,
}

impl SurveySpec {
    pub fn validate(&self) -> Result<()> {
        validate_question(&self.question)?;
        validate_option_count(self.options.len())?;
        self.options.iter().try_for_each(|o| validate_option_text(o))
    }
}

/// An option as it appears in an update request, resolved from the loose
/// wire shape before any reconciliation happens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawOptionSpec", into = "RawOptionSpec")]
pub enum OptionSpec {
    /// A bare string, or an object without an id: gets a fresh id.
    NewOptionText(String),
    /// An object carrying an id: keeps that id with the given text.
    ExistingOption { id: Id, text: String },
}

impl OptionSpec {
    pub fn text(&self) -> &str {
        match self {
            Self::NewOptionText(text) => text,
            Self::ExistingOption { text, .. } => text,
        }
    }
}

/// Wire shape of an update option: either `"text"` or `{"id"?: ..., "text": ...}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
enum RawOptionSpec {
    Text(String),
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        text: String,
    },
}

impl From<RawOptionSpec> for OptionSpec {
    fn from(raw: RawOptionSpec) -> Self {
        match raw {
            RawOptionSpec::Text(text) => Self::NewOptionText(text),
            RawOptionSpec::Object { id: Some(id), text } if !id.is_empty() => {
                Self::ExistingOption {
                    id: id.into(),
                    text,
                }
            }
            RawOptionSpec::Object { text, .. } => Self::NewOptionText(text),
        }
    }
}

impl From<OptionSpec> for RawOptionSpec {
    fn from(spec: OptionSpec) -> Self {
        match spec {
            OptionSpec::NewOptionText(text) => Self::Text(text),
            OptionSpec::ExistingOption { id, text } => Self::Object {
                id: Some(id.to_string()),
                text,
            },
        }
    }
}

/// Request body for replacing a survey's question and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyUpdate {
    pub question: String,
    pub options: Vec<OptionSpec>,
}

impl SurveyUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_question(&self.question)?;
        validate_option_count(self.options.len())?;
        self.options
            .iter()
            .try_for_each(|o| validate_option_text(o.text()))?;

        // Explicit ids must stay unique within the survey.
        let mut seen = HashSet::new();
        for option in &self.options {
            if let OptionSpec::ExistingOption { id, .. } = option {
                if !seen.insert(id) {
                    return Err(Error::BadRequest(format!("Duplicate option id {id}")));
                }
            }
        }
        Ok(())
    }
}

fn validate_question(question: &str) -> Result<()> {
    let len = question.chars().count();
    if !(MIN_QUESTION_LENGTH..=MAX_QUESTION_LENGTH).contains(&len) {
        return Err(Error::BadRequest(format!(
            "Question must be between {MIN_QUESTION_LENGTH} and {MAX_QUESTION_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_option_count(count: usize) -> Result<()> {
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
        return Err(Error::BadRequest(format!(
            "A survey needs between {MIN_OPTIONS} and {MAX_OPTIONS} options, got {count}"
        )));
    }
    Ok(())
}

fn validate_option_text(text: &str) -> Result<()> {
    let len = text.chars().count();
    if !(1..=MAX_OPTION_LENGTH).contains(&len) {
        return Err(Error::BadRequest(format!(
            "Option text must be between 1 and {MAX_OPTION_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Example data for tests.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    impl SurveySpec {
        pub fn example() -> Self {
            Self {
                question: "Which rendering mode do you ship?".into(),
                options: vec!["CSR".into(), "SSR".into(), "SSG".into()],
            }
        }
    }

    impl Survey {
        /// A survey with fixed option ids `a`, `b` and `c`.
        pub fn example() -> Self {
            Self {
                id: Id::from("survey-1"),
                question: "Pick a letter".into(),
                options: vec![
                    SurveyOption {
                        id: Id::from("a"),
                        text: "A".into(),
                    },
                    SurveyOption {
                        id: Id::from("b"),
                        text: "B".into(),
                    },
                    SurveyOption {
                        id: Id::from("c"),
                        text: "C".into(),
                    },
                ],
                public_id: PublicId::from("pub-1"),
                created_by_user_id: Id::from("admin-1"),
                created_at: clock::now(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json::{self, json};

    use super::*;

    #[test]
    fn new_survey_mints_distinct_option_ids() {
        let survey = Survey::new(SurveySpec::example(), Id::from("admin"));
        assert_eq!(survey.options.len(), 3);
        assert_ne!(survey.options[0].id, survey.options[1].id);
        assert_ne!(survey.options[1].id, survey.options[2].id);
        assert_eq!(survey.created_by_user_id, "admin");
    }

    #[test]
    fn option_specs_resolve_from_wire_shapes() {
        let options: Vec<OptionSpec> = serde_json::from_value(json!([
            {"id": "x", "text": "kept"},
            "brand new",
            {"text": "object without id"},
            {"id": "", "text": "empty id"},
        ]))
        .unwrap();
        assert_eq!(
            options,
            vec![
                OptionSpec::ExistingOption {
                    id: Id::from("x"),
                    text: "kept".into()
                },
                OptionSpec::NewOptionText("brand new".into()),
                OptionSpec::NewOptionText("object without id".into()),
                OptionSpec::NewOptionText("empty id".into()),
            ]
        );
    }

    #[test]
    fn survey_wire_format_is_camel_case() {
        let value = serde_json::to_value(Survey::example()).unwrap();
        assert_eq!(value["publicId"], "pub-1");
        assert_eq!(value["createdByUserId"], "admin-1");
        assert!(value["createdAt"].is_string());
        assert_eq!(value["options"][0], json!({"id": "a", "text": "A"}));
    }

    #[test]
    fn spec_bounds() {
        assert!(SurveySpec::example().validate().is_ok());

        let mut spec = SurveySpec::example();
        spec.question = "Why".into();
        assert!(spec.validate().is_err());

        let mut spec = SurveySpec::example();
        spec.options = vec!["only one".into()];
        assert!(spec.validate().is_err());

        let mut spec = SurveySpec::example();
        spec.options = (0..11).map(|i| i.to_string()).collect();
        assert!(spec.validate().is_err());

        let mut spec = SurveySpec::example();
        spec.options.push(String::new());
        assert!(spec.validate().is_err());

        let mut spec = SurveySpec::example();
        spec.options.push("x".repeat(101));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn update_rejects_duplicate_explicit_ids() {
        let update = SurveyUpdate {
            question: "Still a question?".into(),
            options: vec![
                OptionSpec::ExistingOption {
                    id: Id::from("x"),
                    text: "one".into(),
                },
                OptionSpec::ExistingOption {
                    id: Id::from("x"),
                    text: "two".into(),
                },
            ],
        };
        assert!(matches!(update.validate(), Err(Error::BadRequest(_))));
    }
}
