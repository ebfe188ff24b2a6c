use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use time::OffsetDateTime;

use crate::db::models::Question;
use crate::db::types::SubmissionStatus;
use crate::services::availability::{is_open, ExamWindow};
use crate::services::scoring::{join_selection, parse_selection, AnswerKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SessionError {
    #[error("Exam is not open")]
    NotOpen,
    #[error("Exam already submitted")]
    AlreadySubmitted,
    #[error("Question does not belong to this exam")]
    QuestionNotInExam,
    #[error("{0}")]
    MalformedAnswer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartDecision {
    Create,
    Resume,
}

/// absent -> in-progress needs an open window; an in-progress session is
/// handed back as-is so a client can still finish it.
pub(crate) fn start_decision(
    existing: Option<SubmissionStatus>,
    window: ExamWindow,
    now: OffsetDateTime,
) -> Result<StartDecision, SessionError> {
    match existing {
        Some(SubmissionStatus::Submitted) => Err(SessionError::AlreadySubmitted),
        Some(SubmissionStatus::InProgress) => Ok(StartDecision::Resume),
        None if is_open(window, now) => Ok(StartDecision::Create),
        None => Err(SessionError::NotOpen),
    }
}

pub(crate) fn ensure_can_record(
    status: SubmissionStatus,
    window: ExamWindow,
    now: OffsetDateTime,
) -> Result<(), SessionError> {
    if status == SubmissionStatus::Submitted {
        return Err(SessionError::AlreadySubmitted);
    }
    if !is_open(window, now) {
        return Err(SessionError::NotOpen);
    }
    Ok(())
}

pub(crate) fn ensure_can_submit(status: SubmissionStatus) -> Result<(), SessionError> {
    match status {
        SubmissionStatus::InProgress => Ok(()),
        SubmissionStatus::Submitted => Err(SessionError::AlreadySubmitted),
    }
}

/// Natural order is creation time, then id. Randomised exams get a fresh
/// permutation on every call.
pub(crate) fn order_questions<R>(
    mut questions: Vec<Question>,
    randomize: bool,
    rng: &mut R,
) -> Vec<Question>
where
    R: Rng + ?Sized,
{
    questions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    if randomize {
        questions.shuffle(rng);
    }
    questions
}

/// Checks an answer against its question and returns the text to store.
/// Choice answers are normalised to sorted, comma-joined indices; a blank
/// answer is kept blank and counts as unanswered.
pub(crate) fn validate_answer(
    question: &Question,
    exam_id: &str,
    answer_text: &str,
) -> Result<String, SessionError> {
    if question.exam_id != exam_id {
        return Err(SessionError::QuestionNotInExam);
    }

    let key = AnswerKey::from_question(question)
        .map_err(|err| SessionError::MalformedAnswer(err.to_string()))?;

    match key {
        AnswerKey::FreeText { .. } => Ok(answer_text.trim().to_string()),
        AnswerKey::SingleChoice { option_count, .. }
        | AnswerKey::MultipleChoice { option_count, .. } => {
            let selection = parse_selection(answer_text).ok_or_else(|| {
                SessionError::MalformedAnswer("Answer must be a list of option indices".to_string())
            })?;

            if let Some(index) = selection.iter().find(|&&index| index >= option_count) {
                return Err(SessionError::MalformedAnswer(format!(
                    "Option {index} does not exist"
                )));
            }
            if matches!(key, AnswerKey::SingleChoice { .. }) && selection.len() > 1 {
                return Err(SessionError::MalformedAnswer(
                    "Only one option may be selected".to_string(),
                ));
            }

            Ok(join_selection(&selection))
        }
    }
}
