//! Filtering, sorting and summary counts over a task collection.

use crate::dates;
use crate::model::{Category, Notification, Priority, Task, ALL_CATEGORY_ID};
use chrono::NaiveDate;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Newest first.
    #[default]
    Created,
    /// High before medium before low.
    Priority,
    /// Case-insensitive ascending.
    Title,
}

/// Filter criteria applied to a task collection. All active criteria combine
/// with logical AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub category: String,
    pub search: String,
    pub priority: PriorityFilter,
    pub sort: SortKey,
}

/// Filtered and sorted tasks, split by completion state. Both halves keep
/// the sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListing<'a> {
    pub active: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub due_today: usize,
    /// Rounded percentage, 0 for an empty collection.
    pub completion_rate: u8,
}

impl PriorityFilter {
    pub fn matches(self, priority: Priority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(wanted) => wanted == priority,
        }
    }

    /// All → High → Medium → Low → All.
    pub fn cycle(self) -> Self {
        match self {
            PriorityFilter::All => PriorityFilter::Only(Priority::High),
            PriorityFilter::Only(Priority::High) => PriorityFilter::Only(Priority::Medium),
            PriorityFilter::Only(Priority::Medium) => PriorityFilter::Only(Priority::Low),
            PriorityFilter::Only(Priority::Low) => PriorityFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriorityFilter::All => "All",
            PriorityFilter::Only(p) => p.label(),
        }
    }
}

impl SortKey {
    pub fn cycle(self) -> Self {
        match self {
            SortKey::Created => SortKey::Priority,
            SortKey::Priority => SortKey::Title,
            SortKey::Title => SortKey::Created,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Created => "Date",
            SortKey::Priority => "Priority",
            SortKey::Title => "Name",
        }
    }

    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::Created => b.created_at.cmp(&a.created_at),
            SortKey::Priority => b.priority.rank().cmp(&a.priority.rank()),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        }
    }
}

impl Default for TaskQuery {
    fn default() -> Self {
        TaskQuery {
            category: ALL_CATEGORY_ID.to_string(),
            search: String::new(),
            priority: PriorityFilter::All,
            sort: SortKey::Created,
        }
    }
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: PriorityFilter) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.matches_category(task)
            && self.matches_search(task)
            && self.priority.matches(task.priority)
    }

    fn matches_category(&self, task: &Task) -> bool {
        self.category == ALL_CATEGORY_ID || task.category_id == self.category
    }

    fn matches_search(&self, task: &Task) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        task.title.to_lowercase().contains(&needle)
            || task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> TaskListing<'a> {
        let mut matched: Vec<&Task> = tasks.iter().filter(|t| self.matches(t)).collect();
        // stable: ties keep their original relative order
        matched.sort_by(|a, b| self.sort.compare(a, b));
        let (completed, active): (Vec<&Task>, Vec<&Task>) =
            matched.into_iter().partition(|t| t.completed);
        TaskListing { active, completed }
    }
}

impl<'a> TaskListing<'a> {
    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Active tasks followed by completed ones.
    pub fn iter(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.active.iter().chain(self.completed.iter()).copied()
    }
}

impl TaskStats {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let due_today = tasks.iter().filter(|t| dates::is_due_on(t, today)).count();
        TaskStats {
            total,
            completed,
            pending: total - completed,
            due_today,
            completion_rate: completion_rate(completed, total),
        }
    }
}

/// `round(completed / total * 100)`, rounding halves up.
pub fn completion_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rate = (completed * 200 + total) / (total * 2);
    rate.min(100) as u8
}

/// Task count per category. The "all" pseudo-category counts everything.
pub fn category_counts<'a>(
    tasks: &[Task],
    categories: &'a [Category],
) -> Vec<(&'a Category, usize)> {
    categories
        .iter()
        .map(|category| {
            let count = if category.is_all() {
                tasks.len()
            } else {
                tasks.iter().filter(|t| t.category_id == category.id).count()
            };
            (category, count)
        })
        .collect()
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{demo_categories, demo_notifications, demo_tasks};
    use chrono::{Duration, Utc};

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn default_query_sorts_newest_first_and_partitions() {
        let tasks = demo_tasks();
        let listing = TaskQuery::new().apply(&tasks);
        assert_eq!(ids(&listing.active), vec!["5", "1", "2", "4"]);
        assert_eq!(ids(&listing.completed), vec!["3"]);
        assert_eq!(listing.len(), tasks.len());
    }

    #[test]
    fn every_filter_combination_partitions_cleanly() {
        let tasks = demo_tasks();
        let categories = ["all", "1", "2", "3", "4", "missing"];
        let searches = ["", "REVIEW", "planning", "zzz"];
        let priorities = [
            PriorityFilter::All,
            PriorityFilter::Only(Priority::Low),
            PriorityFilter::Only(Priority::Medium),
            PriorityFilter::Only(Priority::High),
        ];
        for category in categories {
            for search in searches {
                for priority in priorities {
                    let query = TaskQuery::new()
                        .with_category(category)
                        .with_search(search)
                        .with_priority(priority);
                    let listing = query.apply(&tasks);
                    let expected: Vec<&Task> = tasks.iter().filter(|t| query.matches(t)).collect();
                    assert_eq!(listing.len(), expected.len());
                    assert!(listing.active.iter().all(|t| !t.completed));
                    assert!(listing.completed.iter().all(|t| t.completed));
                    for task in expected {
                        let in_active = listing.active.iter().any(|t| t.id == task.id);
                        let in_completed = listing.completed.iter().any(|t| t.id == task.id);
                        assert!(in_active ^ in_completed);
                    }
                }
            }
        }
    }

    #[test]
    fn search_matches_title_or_description_case_insensitively() {
        let tasks = demo_tasks();
        let by_title = TaskQuery::new().with_search("LANDING").apply(&tasks);
        assert_eq!(ids(&by_title.active), vec!["1"]);
        let by_description = TaskQuery::new().with_search("quarterly").apply(&tasks);
        assert_eq!(ids(&by_description.active), vec!["5"]);
    }

    #[test]
    fn search_skips_missing_description() {
        let mut tasks = demo_tasks();
        tasks[0].description = None;
        let listing = TaskQuery::new().with_search("wireframes").apply(&tasks);
        assert!(listing.is_empty());
    }

    #[test]
    fn category_and_priority_compose() {
        let tasks = demo_tasks();
        let listing = TaskQuery::new()
            .with_category("1")
            .with_priority(PriorityFilter::Only(Priority::Medium))
            .apply(&tasks);
        assert_eq!(ids(&listing.active), vec!["2"]);
        assert!(listing.completed.is_empty());
    }

    #[test]
    fn priority_sort_is_stable() {
        let tasks = demo_tasks();
        let listing = TaskQuery::new().with_sort(SortKey::Priority).apply(&tasks);
        let ordered: Vec<String> = listing.iter().map(|t| t.id.clone()).collect();
        // high: 1, 5; medium: 2, 4; low: 3 (completed)
        assert_eq!(ordered, vec!["1", "5", "2", "4", "3"]);
    }

    #[test]
    fn title_sort_ignores_case() {
        let mut tasks = demo_tasks();
        tasks[0].title = "alpha".into();
        tasks[1].title = "Beta".into();
        tasks[3].title = "gamma".into();
        tasks[4].title = "Delta".into();
        let listing = TaskQuery::new().with_sort(SortKey::Title).apply(&tasks);
        let titles: Vec<&str> = listing.active.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["alpha", "Beta", "Delta", "gamma"]);
    }

    #[test]
    fn stats_count_due_today_and_round_rate() {
        let mut tasks = demo_tasks();
        tasks[1].completed = true;
        let stats = TaskStats::compute(&tasks, day(2026, 1, 14));
        assert_eq!(stats.total, 5);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.completion_rate, 40);
    }

    #[test]
    fn empty_collection_has_zero_stats() {
        let stats = TaskStats::compute(&[], day(2026, 1, 14));
        assert_eq!(stats, TaskStats::default());
    }

    #[test]
    fn completion_rate_rounds_halves_up() {
        assert_eq!(completion_rate(1, 8), 13);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(4, 4), 100);
    }

    #[test]
    fn category_counts_include_all() {
        let tasks = demo_tasks();
        let categories = demo_categories();
        let counts: Vec<(String, usize)> = category_counts(&tasks, &categories)
            .into_iter()
            .map(|(c, n)| (c.id.clone(), n))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("all".to_string(), 5),
                ("1".to_string(), 2),
                ("2".to_string(), 1),
                ("3".to_string(), 1),
                ("4".to_string(), 1),
            ]
        );
    }

    #[test]
    fn unread_notifications_are_counted() {
        let notifications = demo_notifications(Utc::now() - Duration::minutes(1));
        assert_eq!(unread_count(&notifications), 2);
    }

    #[test]
    fn filter_cycles_wrap_around() {
        let mut filter = PriorityFilter::All;
        let mut seen = Vec::new();
        for _ in 0..4 {
            filter = filter.cycle();
            seen.push(filter.label());
        }
        assert_eq!(seen, vec!["High", "Medium", "Low", "All"]);
        assert_eq!(SortKey::Title.cycle(), SortKey::Created);
    }
}
