//! Date display for event start/end strings

use calfeed_core::DateFormatter;
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Default display pattern, e.g. `2024-05-01 09:30`
pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%d %H:%M";

/// Formats epoch seconds in a fixed local offset
#[derive(Debug, Clone)]
pub struct LocalDateFormatter {
    offset: FixedOffset,
    pattern: String,
}

impl LocalDateFormatter {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset, pattern: DEFAULT_DATE_PATTERN.to_string() }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Use a custom `strftime` pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }
}

impl DateFormatter for LocalDateFormatter {
    fn format(&self, epoch_secs: i64) -> String {
        match DateTime::<Utc>::from_timestamp(epoch_secs, 0) {
            Some(instant) => instant.with_timezone(&self.offset).format(&self.pattern).to_string(),
            None => epoch_secs.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_in_configured_offset() {
        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        let formatter = LocalDateFormatter::new(shanghai);
        // 2024-05-01T00:30:00Z
        assert_eq!(formatter.format(1_714_523_400), "2024-05-01 08:30");
        assert_eq!(LocalDateFormatter::utc().format(1_714_523_400), "2024-05-01 00:30");
    }

    #[test]
    fn custom_pattern() {
        let formatter = LocalDateFormatter::utc().with_pattern("%d/%m %H:%M");
        assert_eq!(formatter.format(0), "01/01 00:00");
    }
}
