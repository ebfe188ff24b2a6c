use crate::api::errors::ApiError;
use crate::services::availability::ExamWindow;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

/// An end without a start is rejected, as is an end before the start.
pub(crate) fn validate_exam_window(window: ExamWindow) -> Result<(), ApiError> {
    match (window.start, window.end) {
        (None, Some(_)) => {
            Err(ApiError::BadRequest("end_time requires a start_time".to_string()))
        }
        (Some(start), Some(end)) if end < start => {
            Err(ApiError::BadRequest("end_time must not be before start_time".to_string()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_password_len("ééééééé").is_err());
        assert!(validate_password_len("éééééééé").is_ok());
    }

    #[test]
    fn exam_window_rules() {
        let start = Some(datetime!(2025-03-01 10:00 +1));
        let end = Some(datetime!(2025-03-01 12:00 +1));

        assert!(validate_exam_window(ExamWindow { start: None, end: None }).is_ok());
        assert!(validate_exam_window(ExamWindow { start, end: None }).is_ok());
        assert!(validate_exam_window(ExamWindow { start, end }).is_ok());
        assert!(validate_exam_window(ExamWindow { start, end: start }).is_ok());
        assert!(validate_exam_window(ExamWindow { start: None, end }).is_err());
        assert!(validate_exam_window(ExamWindow { start: end, end: start }).is_err());
    }
}
