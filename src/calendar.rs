//! Month grid layout, month navigation and the upcoming-tasks list.

use crate::dates::DateParseError;
use crate::model::{Priority, Task};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Tasks shown inside one day cell before the "+K more" indicator.
pub const MAX_TASKS_PER_CELL: usize = 2;
pub const UPCOMING_LIMIT: usize = 8;

/// A displayed year/month. Weeks start on Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthCursor {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell<'a> {
    pub day: u32,
    pub date: NaiveDate,
    pub is_today: bool,
    /// Every task due on `date`, in collection order.
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid<'a> {
    pub month: MonthCursor,
    /// Empty cells before day 1 (0 = month starts on Sunday).
    pub leading_blanks: u32,
    pub days: Vec<DayCell<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    Overdue,
    DueToday,
    Upcoming(Priority),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingTask<'a> {
    pub task: &'a Task,
    pub due: NaiveDate,
    pub status: DueStatus,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| MonthCursor { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        MonthCursor {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month before, or `self` at the earliest month chrono can represent.
    pub fn previous(self) -> Self {
        let (year, month) = if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        };
        MonthCursor::new(year, month).unwrap_or(self)
    }

    /// The month after, or `self` at the latest month chrono can represent.
    pub fn next(self) -> Self {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        MonthCursor::new(year, month).unwrap_or(self)
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn date(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn leading_blanks(self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }

    pub fn days_in_month(self) -> u32 {
        (28..=31)
            .rev()
            .find(|day| self.date(*day).is_some())
            .unwrap_or(28)
    }

    /// "January 2026".
    pub fn label(self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthCursor {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || DateParseError::Month(raw.to_string());
        let (year, month) = raw.rsplit_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        MonthCursor::new(year, month).ok_or_else(invalid)
    }
}

impl<'a> DayCell<'a> {
    pub fn visible_tasks(&self) -> &[&'a Task] {
        &self.tasks[..self.tasks.len().min(MAX_TASKS_PER_CELL)]
    }

    /// Number of tasks hidden behind the "+K more" indicator.
    pub fn overflow(&self) -> Option<usize> {
        self.tasks
            .len()
            .checked_sub(MAX_TASKS_PER_CELL)
            .filter(|hidden| *hidden > 0)
    }
}

impl<'a> CalendarGrid<'a> {
    pub fn build(month: MonthCursor, tasks: &'a [Task], today: NaiveDate) -> Self {
        let mut by_date: HashMap<NaiveDate, Vec<&'a Task>> = HashMap::new();
        for task in tasks {
            if let Some(due) = task.due_date.filter(|d| month.contains(*d)) {
                by_date.entry(due).or_default().push(task);
            }
        }
        let days = (1..=month.days_in_month())
            .filter_map(|day| month.date(day).map(|date| (day, date)))
            .map(|(day, date)| DayCell {
                day,
                date,
                is_today: date == today,
                tasks: by_date.remove(&date).unwrap_or_default(),
            })
            .collect();
        CalendarGrid {
            month,
            leading_blanks: month.leading_blanks(),
            days,
        }
    }

    pub fn cell(&self, day: u32) -> Option<&DayCell<'a>> {
        self.days.iter().find(|c| c.day == day)
    }

    pub fn today(&self) -> Option<&DayCell<'a>> {
        self.days.iter().find(|c| c.is_today)
    }

    /// Rows of seven slots, Sunday first. Blank slots pad both ends.
    pub fn weeks(&self) -> Vec<Vec<Option<&DayCell<'a>>>> {
        let mut slots: Vec<Option<&DayCell<'a>>> =
            (0..self.leading_blanks).map(|_| None).collect();
        slots.extend(self.days.iter().map(Some));
        while slots.len() % 7 != 0 {
            slots.push(None);
        }
        slots.chunks(7).map(<[_]>::to_vec).collect()
    }
}

impl DueStatus {
    pub fn classify(due: NaiveDate, today: NaiveDate, priority: Priority) -> Self {
        if due < today {
            DueStatus::Overdue
        } else if due == today {
            DueStatus::DueToday
        } else {
            DueStatus::Upcoming(priority)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DueStatus::Overdue => "Overdue",
            DueStatus::DueToday => "Today",
            DueStatus::Upcoming(priority) => priority.label(),
        }
    }
}

/// Open tasks with a due date, earliest first, capped at [`UPCOMING_LIMIT`].
pub fn upcoming_tasks(tasks: &[Task], today: NaiveDate) -> Vec<UpcomingTask<'_>> {
    let mut pending: Vec<(&Task, NaiveDate)> = tasks
        .iter()
        .filter(|t| !t.completed)
        .filter_map(|t| t.due_date.map(|due| (t, due)))
        .collect();
    pending.sort_by_key(|(_, due)| *due);
    pending
        .into_iter()
        .take(UPCOMING_LIMIT)
        .map(|(task, due)| UpcomingTask {
            task,
            due,
            status: DueStatus::classify(due, today, task.priority),
        })
        .collect()
}

/// Count behind the upcoming list's badge; not capped.
pub fn upcoming_total(tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter(|t| !t.completed && t.due_date.is_some())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::demo_tasks;
    use chrono::Duration;

    fn month(y: i32, m: u32) -> MonthCursor {
        MonthCursor::new(y, m).expect("valid month")
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn january_2026_starts_on_thursday() {
        let grid = CalendarGrid::build(month(2026, 1), &[], day(2026, 1, 14));
        assert_eq!(grid.leading_blanks, 4);
        assert_eq!(grid.days.len(), 31);
        assert_eq!(grid.weeks().len(), 5);
    }

    #[test]
    fn february_lengths_follow_leap_years() {
        assert_eq!(month(2026, 2).days_in_month(), 28);
        assert_eq!(month(2024, 2).days_in_month(), 29);
        assert_eq!(month(2100, 2).days_in_month(), 28);
        assert_eq!(month(2000, 2).days_in_month(), 29);
        let grid = CalendarGrid::build(month(2026, 2), &[], day(2026, 1, 1));
        assert_eq!(grid.days.len(), 28);
        assert_eq!(grid.leading_blanks, 0);
        assert_eq!(grid.weeks().len(), 4);
    }

    #[test]
    fn navigation_rolls_over_years_and_is_inverse() {
        assert_eq!(month(2026, 1).previous(), month(2025, 12));
        assert_eq!(month(2025, 12).next(), month(2026, 1));
        for m in 1..=12 {
            let cursor = month(2026, m);
            assert_eq!(cursor.previous().next(), cursor);
            assert_eq!(cursor.next().previous(), cursor);
        }
    }

    #[test]
    fn navigation_stops_at_representable_range() {
        let last = MonthCursor::containing(NaiveDate::MAX);
        assert_eq!(last.next(), last);
        assert_eq!(last.first_day(), NaiveDate::MAX.with_day(1).expect("first of month"));
        assert_eq!(last.days_in_month(), NaiveDate::MAX.day());
        assert_eq!(last.previous().next(), last);

        let first = MonthCursor::containing(NaiveDate::MIN);
        assert_eq!(first.previous(), first);
        assert_eq!(first.first_day(), NaiveDate::MIN.with_day(1).expect("first of month"));
        assert_eq!(first.next().previous(), first);
    }

    #[test]
    fn today_flag_only_in_current_month() {
        let today = day(2026, 1, 14);
        let grid = CalendarGrid::build(month(2026, 1), &[], today);
        let flagged: Vec<u32> = grid.days.iter().filter(|c| c.is_today).map(|c| c.day).collect();
        assert_eq!(flagged, vec![14]);
        assert_eq!(grid.today().map(|c| c.day), Some(14));

        let other = CalendarGrid::build(month(2026, 2), &[], today);
        assert!(other.today().is_none());
        let last_year = CalendarGrid::build(month(2025, 1), &[], today);
        assert!(last_year.today().is_none());
    }

    #[test]
    fn tasks_map_onto_due_dates_including_completed() {
        let mut tasks = demo_tasks();
        tasks[2].due_date = Some(day(2026, 1, 15));
        let grid = CalendarGrid::build(month(2026, 1), &tasks, day(2026, 1, 1));
        let cell = grid.cell(15).expect("day 15");
        let ids: Vec<&str> = cell.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(grid.cell(13).map(|c| c.tasks.len()), Some(1));
        assert_eq!(grid.cell(1).map(|c| c.tasks.len()), Some(0));
    }

    #[test]
    fn cells_cap_visible_tasks_but_keep_all() {
        let mut tasks = demo_tasks();
        for task in &mut tasks {
            task.due_date = Some(day(2026, 1, 20));
        }
        let grid = CalendarGrid::build(month(2026, 1), &tasks, day(2026, 1, 1));
        let cell = grid.cell(20).expect("day 20");
        assert_eq!(cell.tasks.len(), 5);
        assert_eq!(cell.visible_tasks().len(), MAX_TASKS_PER_CELL);
        assert_eq!(cell.overflow(), Some(3));

        let quiet = grid.cell(21).expect("day 21");
        assert_eq!(quiet.visible_tasks().len(), 0);
        assert_eq!(quiet.overflow(), None);
    }

    #[test]
    fn exactly_two_tasks_have_no_overflow() {
        let mut tasks = demo_tasks();
        tasks.truncate(2);
        for task in &mut tasks {
            task.due_date = Some(day(2026, 3, 3));
        }
        let grid = CalendarGrid::build(month(2026, 3), &tasks, day(2026, 3, 3));
        let cell = grid.cell(3).expect("day 3");
        assert_eq!(cell.visible_tasks().len(), 2);
        assert_eq!(cell.overflow(), None);
    }

    #[test]
    fn upcoming_classifies_relative_to_today() {
        let today = day(2026, 6, 10);
        let mut tasks = demo_tasks();
        tasks.truncate(3);
        tasks[0].due_date = Some(today + Duration::days(1));
        tasks[1].due_date = Some(today);
        tasks[2].due_date = Some(today - Duration::days(1));
        for task in &mut tasks {
            task.completed = false;
        }
        let upcoming = upcoming_tasks(&tasks, today);
        let statuses: Vec<DueStatus> = upcoming.iter().map(|u| u.status).collect();
        assert_eq!(
            statuses,
            vec![
                DueStatus::Overdue,
                DueStatus::DueToday,
                DueStatus::Upcoming(Priority::High),
            ]
        );
    }

    #[test]
    fn upcoming_skips_completed_and_undated_and_caps() {
        let base = demo_tasks().remove(0);
        let mut tasks: Vec<Task> = (0..12)
            .map(|i| {
                let mut task = base.clone();
                task.id = i.to_string();
                task.due_date = Some(day(2026, 2, 12 - i as u32));
                task
            })
            .collect();
        tasks[11].completed = true;
        tasks[10].due_date = None;
        let upcoming = upcoming_tasks(&tasks, day(2026, 1, 1));
        assert_eq!(upcoming.len(), UPCOMING_LIMIT);
        assert_eq!(upcoming_total(&tasks), 10);
        assert!(upcoming.windows(2).all(|w| w[0].due <= w[1].due));
        assert_eq!(upcoming[0].task.id, "9");
    }

    #[test]
    fn month_parses_and_labels() {
        let cursor: MonthCursor = "2026-01".parse().expect("parse");
        assert_eq!(cursor, month(2026, 1));
        assert_eq!(cursor.label(), "January 2026");
        assert_eq!(cursor.to_string(), "2026-01");
        assert!("2026-13".parse::<MonthCursor>().is_err());
        assert!("January".parse::<MonthCursor>().is_err());
    }
}
