//! Human readable resource ages

use chrono::{DateTime, Utc};

/// Age of something created at `start`, as seen at `now`.
///
/// Only the two most significant units are shown; days are the largest
/// unit since months and years vary in length. A `start` in the future
/// (clock skew) reads as `0s`.
pub fn age(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - start).num_seconds();
    if elapsed <= 0 {
        return "0s".to_string();
    }

    let seconds = elapsed % 60;
    let minutes = elapsed / 60;
    if minutes == 0 {
        return format!("{seconds}s");
    }

    let hours = minutes / 60;
    let minutes = minutes % 60;
    if hours == 0 {
        return format!("{minutes}m {seconds}s");
    }

    let days = hours / 24;
    let hours = hours % 24;
    if days == 0 {
        return format!("{hours}h {minutes}m");
    }

    format!("{days}d {hours}h")
}

/// Age of something created at `start`, as of now
pub fn age_since(start: DateTime<Utc>) -> String {
    age(start, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ago(seconds: i64) -> String {
        let now = Utc::now();
        age(now - Duration::seconds(seconds), now)
    }

    #[test]
    fn test_seconds() {
        assert_eq!(ago(0), "0s");
        assert_eq!(ago(45), "45s");
    }

    #[test]
    fn test_minutes_and_seconds() {
        assert_eq!(ago(125), "2m 5s");
        assert_eq!(ago(60), "1m 0s");
    }

    #[test]
    fn test_hours_and_minutes() {
        assert_eq!(ago(3 * 3600 + 7 * 60 + 59), "3h 7m");
    }

    #[test]
    fn test_days_and_hours() {
        assert_eq!(ago(40 * 86400 + 5 * 3600 + 1), "40d 5h");
    }

    #[test]
    fn test_future_start_is_zero() {
        assert_eq!(ago(-10), "0s");
    }

    #[test]
    fn test_subsecond_truncates() {
        let now = Utc::now();
        assert_eq!(age(now - Duration::milliseconds(999), now), "0s");
        assert_eq!(age(now - Duration::milliseconds(45_900), now), "45s");
    }

    #[test]
    fn test_age_since_past() {
        assert_eq!(age_since(Utc::now() + Duration::seconds(30)), "0s");
    }
}
