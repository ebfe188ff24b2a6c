use std::collections::{BTreeSet, HashMap};

use crate::db::models::{Question, StudentAnswer};
use crate::db::types::{CorrectAnswer, QuestionType};
use crate::services::question_bank::QuestionError;

/// Grading view of a question: each variant carries only what it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AnswerKey {
    SingleChoice { option_count: usize, correct: BTreeSet<usize> },
    MultipleChoice { option_count: usize, correct: BTreeSet<usize> },
    FreeText { reference: String },
}

impl AnswerKey {
    pub(crate) fn from_question(question: &Question) -> Result<Self, QuestionError> {
        let option_count = question.options.0.len();

        match (question.question_type, &question.correct_answer.0) {
            (QuestionType::FreeText, CorrectAnswer::Text(reference)) => {
                Ok(Self::FreeText { reference: reference.clone() })
            }
            (QuestionType::FreeText, CorrectAnswer::Indices(_)) => {
                Err(QuestionError::MalformedCorrectAnswer)
            }
            (kind, CorrectAnswer::Indices(indices)) => {
                let correct: BTreeSet<usize> = indices.iter().copied().collect();
                if let Some(&index) = correct.iter().find(|&&index| index >= option_count) {
                    return Err(QuestionError::IndexOutOfRange { index, option_count });
                }
                if kind == QuestionType::SingleChoice {
                    Ok(Self::SingleChoice { option_count, correct })
                } else {
                    Ok(Self::MultipleChoice { option_count, correct })
                }
            }
            (_, CorrectAnswer::Text(_)) => Err(QuestionError::MalformedCorrectAnswer),
        }
    }

    pub(crate) fn is_objective(&self) -> bool {
        !matches!(self, Self::FreeText { .. })
    }

    /// Display correctness. Choice answers need exact set equality, free text
    /// is compared case-insensitively after trimming.
    pub(crate) fn matches(&self, answer_text: &str) -> bool {
        match self {
            Self::SingleChoice { correct, .. } | Self::MultipleChoice { correct, .. } => {
                match parse_selection(answer_text) {
                    Some(selected) => !selected.is_empty() && &selected == correct,
                    None => false,
                }
            }
            Self::FreeText { reference } => {
                let answer = answer_text.trim();
                !answer.is_empty() && answer.to_lowercase() == reference.trim().to_lowercase()
            }
        }
    }
}

/// Parses a comma-joined list of option indices. Empty tokens are skipped;
/// any other non-numeric token makes the whole selection unparseable.
pub(crate) fn parse_selection(text: &str) -> Option<BTreeSet<usize>> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<usize>().ok())
        .collect()
}

pub(crate) fn join_selection(selection: &BTreeSet<usize>) -> String {
    selection.iter().map(usize::to_string).collect::<Vec<_>>().join(",")
}

pub(crate) fn is_correct(question: &Question, answer_text: &str) -> bool {
    AnswerKey::from_question(question).map(|key| key.matches(answer_text)).unwrap_or(false)
}

/// Percentage of objective questions answered exactly right. Free-text
/// questions never count; missing answers count as wrong.
pub(crate) fn calculate_score(questions: &[Question], answers: &[StudentAnswer]) -> f64 {
    let by_question: HashMap<&str, &str> = answers
        .iter()
        .map(|answer| (answer.question_id.as_str(), answer.answer_text.as_str()))
        .collect();

    let mut objective = 0_u32;
    let mut correct = 0_u32;

    for question in questions.iter().filter(|question| question.question_type.is_objective()) {
        objective += 1;

        let key = match AnswerKey::from_question(question) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(question_id = %question.id, error = %err, "unscorable question");
                continue;
            }
        };

        if by_question.get(question.id.as_str()).is_some_and(|text| key.matches(text)) {
            correct += 1;
        }
    }

    if objective == 0 {
        return 0.0;
    }

    100.0 * f64::from(correct) / f64::from(objective)
}
