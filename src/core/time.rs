use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, offset};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Civil offset every comparison and formatted output is expressed in.
pub(crate) const CANONICAL_OFFSET: UtcOffset = offset!(+1);

pub(crate) trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(CANONICAL_OFFSET)
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedClock(pub(crate) OffsetDateTime);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0.to_offset(CANONICAL_OFFSET)
    }
}

pub(crate) fn to_canonical(value: OffsetDateTime) -> OffsetDateTime {
    value.to_offset(CANONICAL_OFFSET)
}

/// Naive values carry no zone; they are read as canonical civil time.
pub(crate) fn assume_canonical(value: PrimitiveDateTime) -> OffsetDateTime {
    value.assume_offset(CANONICAL_OFFSET)
}

/// Accepts RFC 3339 or a naive `YYYY-MM-DDTHH:MM[:SS]` (a space separator is tolerated).
pub(crate) fn parse_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(to_canonical(value));
    }

    let normalized = trimmed.replacen(' ', "T", 1);
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");

    PrimitiveDateTime::parse(&normalized, with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(&normalized, without_seconds))
        .ok()
        .map(assume_canonical)
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    let canonical = to_canonical(value);
    canonical.format(&Rfc3339).unwrap_or_else(|_| canonical.to_string())
}
