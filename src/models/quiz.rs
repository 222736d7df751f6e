// src/models/quiz.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Question type tag as stored in quiz files.
/// A question saved without a tag is a single-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// Single choice. Kept as `multiple-choice` on the wire for compatibility.
    #[default]
    MultipleChoice,
    TrueFalse,
    MultipleAnswer,
    FillBlank,
    Matching,
    ShortAnswer,
}

impl QuestionType {
    /// Types whose options are labelled choices and may be reordered per participant.
    pub fn has_choices(self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice | QuestionType::TrueFalse | QuestionType::MultipleAnswer
        )
    }

    /// Types that can only be scored by a human reviewer.
    pub fn needs_manual_grading(self) -> bool {
        matches!(self, QuestionType::ShortAnswer)
    }
}

/// An answer value, either submitted by a participant or authored as an answer key.
///
/// Anything that is neither a string nor a list of strings is kept verbatim in
/// `Other` so it can be stored for audit and graded as incorrect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    List(Vec<String>),
    Other(serde_json::Value),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Answer::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Answer::List(values.into_iter().map(Into::into).collect())
    }
}

/// A single question of a canonical quiz.
/// Its position in `Quiz::questions` is its identity for coordinate mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The prompt shown to participants.
    pub question: String,

    #[serde(rename = "type", default)]
    pub question_type: QuestionType,

    /// Option label -> option text, e.g. `{"A": "Paris", "B": "Rome"}`.
    /// Labels are kept in lexicographic order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,

    /// Answer key. Shape depends on the question type.
    #[serde(default)]
    pub correct: Option<Answer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    /// Per-question time limit in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

/// Per-quiz randomization settings. A missing policy means no randomization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RandomizationPolicy {
    pub shuffle_questions: bool,
    pub shuffle_options: bool,
    pub use_question_pool: bool,
    pub pool_size: usize,
}

impl RandomizationPolicy {
    /// Whether a strict subset of `question_count` questions should be drawn.
    pub fn draws_pool(&self, question_count: usize) -> bool {
        self.use_question_pool && self.pool_size > 0 && self.pool_size < question_count
    }
}

/// A quiz record as kept in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Whole-quiz time limit in seconds.
    #[serde(default)]
    pub total_time_limit: Option<u32>,
    #[serde(default)]
    pub randomization: Option<RandomizationPolicy>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "Other".to_string()
}

fn default_difficulty() -> String {
    "Medium".to_string()
}

/// DTO for sending a question to participants (excludes answer key and explanation).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            question: q.question.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
            time_limit: q.time_limit,
        }
    }
}

/// DTO for the quiz a participant sits.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub session_id: String,
    pub id: String,
    pub name: String,
    pub description: String,
    pub total_time_limit: Option<u32>,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    #[validate(length(max = 50))]
    pub difficulty: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<Question>,
    pub total_time_limit: Option<u32>,
    pub randomization: Option<RandomizationPolicy>,
    #[serde(default)]
    pub is_template: bool,
}

/// DTO for updating a quiz. Present fields replace the stored ones.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
    #[validate(length(max = 50))]
    pub difficulty: Option<String>,
    #[validate(custom(function = validate_questions))]
    pub questions: Option<Vec<Question>>,
    /// `Some(None)` clears the stored limit.
    #[serde(default, deserialize_with = "nullable")]
    pub total_time_limit: Option<Option<u32>>,
    /// `Some(None)` turns randomization off.
    #[serde(default, deserialize_with = "nullable")]
    pub randomization: Option<Option<RandomizationPolicy>>,
    pub is_template: Option<bool>,
}

/// Missing field stays `None`, an explicit `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// DTO for duplicating a quiz under a new name.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateQuizRequest {
    pub quiz_id: String,
    #[validate(length(min = 1, max = 200))]
    pub new_name: String,
}

/// A question bank entry: a unique question plus where it is used.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub category: String,
    pub difficulty: String,
    pub quiz_count: usize,
}

fn validate_questions(questions: &[Question]) -> Result<(), validator::ValidationError> {
    if questions.len() > 500 {
        return Err(validator::ValidationError::new("too_many_questions"));
    }
    for q in questions {
        if q.question.trim().is_empty() {
            return Err(validator::ValidationError::new("question_text_cannot_be_empty"));
        }
        if q.question.len() > 5000 {
            return Err(validator::ValidationError::new("question_text_too_long"));
        }
        if let Some(options) = &q.options {
            if options.len() > 26 {
                return Err(validator::ValidationError::new("too_many_options"));
            }
        }
    }
    Ok(())
}
