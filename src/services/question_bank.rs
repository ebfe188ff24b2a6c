use std::collections::BTreeSet;

use thiserror::Error;

use crate::db::types::{CorrectAnswer, QuestionOption, QuestionType};
use crate::services::scoring::parse_selection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum QuestionError {
    #[error("Question text must not be empty")]
    BlankText,
    #[error("Unknown question type '{0}'")]
    UnknownType(String),
    #[error("Choice questions need at least 2 options")]
    TooFewOptions,
    #[error("Option texts must not be empty")]
    BlankOption,
    #[error("Single-choice questions need exactly one correct option")]
    SingleChoiceCorrectCount,
    #[error("Multiple-choice questions need at least one correct option")]
    NoCorrectOption,
    #[error("Free-text questions need a reference answer")]
    MissingReference,
    #[error("Free-text questions cannot have options")]
    OptionsNotAllowed,
    #[error("Option index {index} is out of range for {option_count} options")]
    IndexOutOfRange { index: usize, option_count: usize },
    #[error("Correct answer does not match the question type")]
    MalformedCorrectAnswer,
}

/// Validated options plus the stored correct-answer reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuestionDefinition {
    pub(crate) options: Vec<QuestionOption>,
    pub(crate) correct_answer: CorrectAnswer,
}

pub(crate) fn define(
    question_type: QuestionType,
    options: Vec<QuestionOption>,
    reference: Option<&str>,
) -> Result<QuestionDefinition, QuestionError> {
    match question_type {
        QuestionType::FreeText => {
            if !options.is_empty() {
                return Err(QuestionError::OptionsNotAllowed);
            }
            let reference = reference
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or(QuestionError::MissingReference)?;
            Ok(QuestionDefinition {
                options,
                correct_answer: CorrectAnswer::Text(reference.to_string()),
            })
        }
        QuestionType::SingleChoice | QuestionType::MultipleChoice => {
            if options.len() < 2 {
                return Err(QuestionError::TooFewOptions);
            }
            if options.iter().any(|option| option.text.trim().is_empty()) {
                return Err(QuestionError::BlankOption);
            }

            let correct: Vec<usize> = options
                .iter()
                .enumerate()
                .filter(|(_, option)| option.is_correct)
                .map(|(index, _)| index)
                .collect();

            match (question_type, correct.len()) {
                (QuestionType::SingleChoice, 1) => {}
                (QuestionType::SingleChoice, _) => {
                    return Err(QuestionError::SingleChoiceCorrectCount)
                }
                (_, 0) => return Err(QuestionError::NoCorrectOption),
                _ => {}
            }

            let options = options
                .into_iter()
                .map(|option| QuestionOption {
                    text: option.text.trim().to_string(),
                    is_correct: option.is_correct,
                })
                .collect();
            Ok(QuestionDefinition { options, correct_answer: CorrectAnswer::Indices(correct) })
        }
    }
}

/// One spreadsheet-style import row. Choice answers are 1-based option numbers.
#[derive(Debug, Clone, serde::Deserialize)]
pub(crate) struct ImportRow {
    pub(crate) question_text: String,
    pub(crate) question_type: String,
    #[serde(default)]
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportedQuestion {
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) definition: QuestionDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Row {row}: {source}")]
pub(crate) struct ImportError {
    pub(crate) row: usize,
    pub(crate) source: QuestionError,
}

pub(crate) fn parse_question_type(raw: &str) -> Result<QuestionType, QuestionError> {
    match raw.trim().to_lowercase().replace('_', "-").as_str() {
        "single-choice" | "single" => Ok(QuestionType::SingleChoice),
        "multiple-choice" | "multiple" => Ok(QuestionType::MultipleChoice),
        "free-text" | "text" => Ok(QuestionType::FreeText),
        other => Err(QuestionError::UnknownType(other.to_string())),
    }
}

pub(crate) fn convert_row(row: &ImportRow) -> Result<ImportedQuestion, QuestionError> {
    let question_text = row.question_text.trim();
    if question_text.is_empty() {
        return Err(QuestionError::BlankText);
    }
    let question_type = parse_question_type(&row.question_type)?;

    let definition = if question_type == QuestionType::FreeText {
        let options: Vec<QuestionOption> = row
            .options
            .iter()
            .filter(|text| !text.trim().is_empty())
            .map(|text| QuestionOption { text: text.clone(), is_correct: false })
            .collect();
        define(question_type, options, Some(&row.correct_answer))?
    } else {
        let numbers: BTreeSet<usize> =
            parse_selection(&row.correct_answer).ok_or(QuestionError::MalformedCorrectAnswer)?;
        let option_count = row.options.len();
        if let Some(&number) = numbers.iter().find(|&&number| number == 0 || number > option_count)
        {
            return Err(QuestionError::IndexOutOfRange {
                index: number.saturating_sub(1),
                option_count,
            });
        }

        let options = row
            .options
            .iter()
            .enumerate()
            .map(|(index, text)| QuestionOption {
                text: text.clone(),
                is_correct: numbers.contains(&(index + 1)),
            })
            .collect();
        define(question_type, options, None)?
    };

    Ok(ImportedQuestion { question_text: question_text.to_string(), question_type, definition })
}

/// Converts every row or reports the first bad one (1-based row number).
pub(crate) fn convert_rows(rows: &[ImportRow]) -> Result<Vec<ImportedQuestion>, ImportError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            convert_row(row).map_err(|source| ImportError { row: index + 1, source })
        })
        .collect()
}
