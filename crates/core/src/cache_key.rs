//! Cache key derivation
//!
//! Keys have the shape `feed_id|name=value|name=value`. Separators inside
//! values are backslash-escaped, so two different parameter tuples can never
//! produce the same key.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};

/// A derived cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn builder(feed_id: &str) -> CacheKeyBuilder {
        CacheKeyBuilder { key: escape(feed_id) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder for [`CacheKey`]; parts are kept in insertion order
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    key: String,
}

impl CacheKeyBuilder {
    pub fn part(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.key.push('|');
        self.key.push_str(&escape(name));
        self.key.push('=');
        self.key.push_str(&escape(&value.to_string()));
        self
    }

    pub fn build(self) -> CacheKey {
        CacheKey(self.key)
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '|' | '=' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `YYYY-MM-DD` bucket for keys that roll over at local midnight
pub fn day_bucket(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `HH:00` or `HH:30` bucket for keys that roll over every half hour
pub fn half_hour_bucket(time: NaiveTime) -> String {
    let minute = if time.minute() < 30 { 0 } else { 30 };
    format!("{:02}:{:02}", time.hour(), minute)
}

/// Start of the next half-hour slot after `now`
pub fn next_half_hour<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let into_slot = (now.minute() % 30) as i64 * 60 + now.second() as i64;
    let slot_start = now.clone()
        - Duration::seconds(into_slot)
        - Duration::nanoseconds(now.nanosecond() as i64);
    slot_start + Duration::minutes(30)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;

    #[test]
    fn key_lists_parts_in_order() {
        let key = CacheKey::builder("github_notifications")
            .part("participating", false)
            .part("limit", 20)
            .build();
        assert_eq!(key.as_str(), "github_notifications|participating=false|limit=20");
    }

    #[test]
    fn separators_in_values_cannot_collide() {
        let a = CacheKey::builder("feed").part("a", "x|b=y").build();
        let b = CacheKey::builder("feed").part("a", "x").part("b", "y").build();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), r"feed|a=x\|b\=y");
    }

    #[test]
    fn changed_identity_changes_key() {
        let a = CacheKey::builder("bilibili").part("mid", "1").build();
        let b = CacheKey::builder("bilibili").part("mid", "2").build();
        assert_ne!(a, b);
    }

    #[test]
    fn half_hour_buckets() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(half_hour_bucket(t(9, 0)), "09:00");
        assert_eq!(half_hour_bucket(t(9, 29)), "09:00");
        assert_eq!(half_hour_bucket(t(9, 30)), "09:30");
        assert_eq!(half_hour_bucket(t(23, 59)), "23:30");
    }

    #[test]
    fn day_bucket_is_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(day_bucket(date), "2024-03-07");
    }

    #[test]
    fn next_half_hour_rounds_up_to_slot_boundary() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 5, 1, 9, 41, 12).unwrap();
        assert_eq!(next_half_hour(&now), tz.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());

        let on_boundary = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        assert_eq!(
            next_half_hour(&on_boundary),
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()
        );
    }
}
