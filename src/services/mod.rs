pub(crate) mod analytics;
pub(crate) mod availability;
pub(crate) mod exam_session;
pub(crate) mod notifier;
pub(crate) mod password_reset;
pub(crate) mod question_bank;
pub(crate) mod scoring;
