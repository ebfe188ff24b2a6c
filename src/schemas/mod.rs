use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::core::time::parse_datetime_flexible;

pub(crate) mod analytics;
pub(crate) mod auth;
pub(crate) mod exam;
pub(crate) mod question;
pub(crate) mod submission;
pub(crate) mod user;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: &'static str,
    pub(crate) status: &'static str,
    pub(crate) components: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse {
    pub(crate) message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// RFC 3339 or naive local time; blank strings count as absent.
pub(crate) fn deserialize_option_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_datetime_flexible(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "deserialize_option_datetime")]
        at: Option<OffsetDateTime>,
    }

    #[test]
    fn optional_datetime_accepts_naive_blank_and_missing() {
        let naive: Probe = serde_json::from_str(r#"{"at":"2025-03-01T10:00"}"#).unwrap();
        assert_eq!(naive.at, Some(datetime!(2025-03-01 09:00 UTC)));

        let blank: Probe = serde_json::from_str(r#"{"at":""}"#).unwrap();
        assert_eq!(blank.at, None);

        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.at, None);

        assert!(serde_json::from_str::<Probe>(r#"{"at":"soon"}"#).is_err());
    }
}
