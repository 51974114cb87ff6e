use crate::model::{Category, Task};
use chrono::{DateTime, Local, NaiveDate, Utc};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("invalid date format (use YYYY-MM-DD): {0}")]
    Date(String),
    #[error("invalid month format (use YYYY-MM): {0}")]
    Month(String),
}

/// Current calendar date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_due_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let raw = input.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| DateParseError::Date(raw.to_string()))
}

pub fn is_due_on(task: &Task, date: NaiveDate) -> bool {
    task.due_date == Some(date)
}

/// A task is overdue when it is still open and its due date lies strictly
/// before `today`. Compared by calendar date only.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < today)
}

pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Age of a notification relative to `now`, e.g. "5m ago". Anything a week
/// or older falls back to the short date.
pub fn format_relative(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }
    format_short_date(timestamp.with_timezone(&Local).date_naive())
}

/// Category badge for a task. Dangling ids and the reserved "all" id have no
/// badge.
pub fn category_for<'a>(task: &Task, categories: &'a [Category]) -> Option<&'a Category> {
    categories
        .iter()
        .find(|c| !c.is_all() && c.id == task.category_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{demo_categories, demo_tasks, ALL_CATEGORY_ID};
    use chrono::{Duration, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_iso_due_dates() {
        assert_eq!(parse_due_date(" 2026-01-15 "), Ok(day(2026, 1, 15)));
        assert_eq!(
            parse_due_date("2026-02-30"),
            Err(DateParseError::Date("2026-02-30".into()))
        );
    }

    #[test]
    fn overdue_uses_calendar_dates_and_ignores_completed() {
        let mut task = demo_tasks().remove(1);
        task.due_date = Some(day(2026, 1, 14));
        assert!(!is_overdue(&task, day(2026, 1, 14)));
        assert!(is_overdue(&task, day(2026, 1, 15)));
        task.completed = true;
        assert!(!is_overdue(&task, day(2026, 1, 15)));
        task.due_date = None;
        task.completed = false;
        assert!(!is_overdue(&task, day(2026, 1, 15)));
    }

    #[test]
    fn short_date_has_no_padding() {
        assert_eq!(format_short_date(day(2026, 1, 5)), "Jan 5");
        assert_eq!(format_short_date(day(2026, 12, 25)), "Dec 25");
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap();
        assert_eq!(format_relative(now - Duration::seconds(30), now), "Just now");
        assert_eq!(format_relative(now + Duration::minutes(5), now), "Just now");
        assert_eq!(format_relative(now - Duration::minutes(42), now), "42m ago");
        assert_eq!(format_relative(now - Duration::hours(5), now), "5h ago");
        assert_eq!(format_relative(now - Duration::days(6), now), "6d ago");
        let old = format_relative(now - Duration::days(10), now);
        assert!(old.starts_with("Jan"), "got {old}");
    }

    #[test]
    fn category_lookup_tolerates_dangling_ids() {
        let categories = demo_categories();
        let mut task = demo_tasks().remove(0);
        assert_eq!(
            category_for(&task, &categories).map(|c| c.name.as_str()),
            Some("Design")
        );
        task.category_id = "missing".into();
        assert!(category_for(&task, &categories).is_none());
        task.category_id = ALL_CATEGORY_ID.into();
        assert!(category_for(&task, &categories).is_none());
    }
}
