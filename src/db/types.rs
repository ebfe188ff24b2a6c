use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Student,
    Teacher,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "accountstatus", rename_all = "lowercase")]
pub(crate) enum AccountStatus {
    Pending,
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "questiontype", rename_all = "kebab-case")]
pub(crate) enum QuestionType {
    SingleChoice,
    MultipleChoice,
    FreeText,
}

impl QuestionType {
    pub(crate) fn is_objective(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "submissionstatus", rename_all = "kebab-case")]
pub(crate) enum SubmissionStatus {
    InProgress,
    Submitted,
}

/// One entry of a choice question's ordered option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct QuestionOption {
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

/// Stored correct-answer reference: 0-based option indices for choice
/// questions, reference text for free-text ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum CorrectAnswer {
    Indices(Vec<usize>),
    Text(String),
}
