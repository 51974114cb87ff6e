use crate::dates::{self, DateParseError};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type TaskId = String;

/// Reserved category id meaning "no filter". Never a real task category.
pub const ALL_CATEGORY_ID: &str = "all";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CategoryColor {
    Slate,
    Blue,
    Purple,
    Pink,
    Teal,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: CategoryColor,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub category_id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Everything a new task carries before the container assigns its id and
/// creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub category_id: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

/// Field-level partial update for a task. `None` leaves a field untouched;
/// the nested options on `description` and `due_date` distinguish "clear"
/// (`Some(None)`) from "keep".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub category_id: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Task,
    Reminder,
    Update,
    Success,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// The three notification toggles. Persisted as a JSON object with
/// camelCase keys.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub task_reminders: bool,
    pub email_notifications: bool,
    pub push_notifications: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub task_reminders: Option<bool>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    TaskReminders,
    EmailNotifications,
    PushNotifications,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown priority: {0} (use low, medium or high)")]
    UnknownPriority(String),
    #[error("name must not be empty")]
    EmptyName,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error(transparent)]
    Date(#[from] DateParseError),
}

/// Raw add-task form input.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub priority: Priority,
    pub due_date: String,
}

/// Raw edit-profile form input.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub name: String,
    pub email: String,
    pub avatar: String,
}

/// Collections loaded from a seed file. Omitted sections fall back to the
/// demo data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub user: Option<User>,
    pub categories: Option<Vec<Category>>,
    pub tasks: Option<Vec<Task>>,
    pub notifications: Option<Vec<Notification>>,
}

impl CategoryColor {
    pub fn label(self) -> &'static str {
        match self {
            CategoryColor::Slate => "slate",
            CategoryColor::Blue => "blue",
            CategoryColor::Purple => "purple",
            CategoryColor::Pink => "pink",
            CategoryColor::Teal => "teal",
        }
    }
}

impl Category {
    pub fn is_all(&self) -> bool {
        self.id == ALL_CATEGORY_ID
    }
}

impl Priority {
    /// Sort weight: high=3, medium=2, low=1.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

impl Task {
    pub fn from_new(id: TaskId, new: NewTask, created_at: DateTime<Utc>) -> Self {
        Task {
            id,
            title: new.title,
            description: new.description,
            completed: new.completed,
            category_id: new.category_id,
            priority: new.priority,
            due_date: new.due_date,
            created_at,
        }
    }
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.category_id.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Merges the patch into `task`. Returns whether any field changed.
    pub fn apply(self, task: &mut Task) -> bool {
        let before = task.clone();
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(category_id) = self.category_id {
            task.category_id = category_id;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        *task != before
    }
}

impl UserPatch {
    pub fn apply(self, user: &mut User) -> bool {
        let before = user.clone();
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
        *user != before
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            task_reminders: true,
            email_notifications: false,
            push_notifications: true,
        }
    }
}

impl NotificationSettings {
    pub fn get(&self, kind: SettingKind) -> bool {
        match kind {
            SettingKind::TaskReminders => self.task_reminders,
            SettingKind::EmailNotifications => self.email_notifications,
            SettingKind::PushNotifications => self.push_notifications,
        }
    }
}

impl SettingsPatch {
    /// Patch flipping a single flag relative to `current`.
    pub fn toggle(current: &NotificationSettings, kind: SettingKind) -> Self {
        let flipped = Some(!current.get(kind));
        match kind {
            SettingKind::TaskReminders => SettingsPatch {
                task_reminders: flipped,
                ..Default::default()
            },
            SettingKind::EmailNotifications => SettingsPatch {
                email_notifications: flipped,
                ..Default::default()
            },
            SettingKind::PushNotifications => SettingsPatch {
                push_notifications: flipped,
                ..Default::default()
            },
        }
    }

    pub fn apply(self, settings: &mut NotificationSettings) -> bool {
        let before = *settings;
        if let Some(v) = self.task_reminders {
            settings.task_reminders = v;
        }
        if let Some(v) = self.email_notifications {
            settings.email_notifications = v;
        }
        if let Some(v) = self.push_notifications {
            settings.push_notifications = v;
        }
        *settings != before
    }
}

impl SettingKind {
    pub const ALL: [SettingKind; 3] = [
        SettingKind::TaskReminders,
        SettingKind::EmailNotifications,
        SettingKind::PushNotifications,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingKind::TaskReminders => "Task reminders",
            SettingKind::EmailNotifications => "Email notifications",
            SettingKind::PushNotifications => "Push notifications",
        }
    }
}

impl NotificationKind {
    pub fn icon(self) -> &'static str {
        match self {
            NotificationKind::Task => "✓",
            NotificationKind::Reminder => "⏰",
            NotificationKind::Update => "🔔",
            NotificationKind::Success => "✨",
        }
    }
}

impl TaskDraft {
    /// Normalizes form input into a [`NewTask`]. The title and description are
    /// trimmed, an empty description becomes absent and the category must
    /// name a real category.
    pub fn validate(&self, categories: &[Category]) -> Result<NewTask, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let category_id = self.category_id.trim();
        if !categories
            .iter()
            .any(|c| !c.is_all() && c.id == category_id)
        {
            return Err(ValidationError::UnknownCategory(category_id.to_string()));
        }
        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let due_date = if self.due_date.trim().is_empty() {
            None
        } else {
            Some(dates::parse_due_date(&self.due_date)?)
        };
        Ok(NewTask {
            title: title.to_string(),
            description,
            completed: false,
            category_id: category_id.to_string(),
            priority: self.priority,
            due_date,
        })
    }
}

impl ProfileDraft {
    pub fn from_user(user: &User) -> Self {
        ProfileDraft {
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }

    pub fn validate(&self) -> Result<UserPatch, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        Ok(UserPatch {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            avatar: Some(self.avatar.trim().to_string()),
        })
    }
}

impl Seed {
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.categories.is_none()
            && self.tasks.is_none()
            && self.notifications.is_none()
    }
}

pub fn demo_user() -> User {
    User {
        name: "Sarah Anderson".into(),
        email: "sarah.anderson@email.com".into(),
        avatar: "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=100&h=100&fit=crop"
            .into(),
    }
}

pub fn demo_categories() -> Vec<Category> {
    let category = |id: &str, name: &str, color| Category {
        id: id.into(),
        name: name.into(),
        color,
    };
    vec![
        category(ALL_CATEGORY_ID, "All Tasks", CategoryColor::Slate),
        category("1", "Development", CategoryColor::Blue),
        category("2", "Design", CategoryColor::Purple),
        category("3", "Marketing", CategoryColor::Pink),
        category("4", "Personal", CategoryColor::Teal),
    ]
}

pub fn demo_tasks() -> Vec<Task> {
    let task = |id: &str,
                title: &str,
                description: &str,
                completed: bool,
                category_id: &str,
                priority: Priority,
                due: Option<(i32, u32, u32)>,
                created: (i32, u32, u32)| Task {
        id: id.into(),
        title: title.into(),
        description: Some(description.into()),
        completed,
        category_id: category_id.into(),
        priority,
        due_date: due.map(|(y, m, d)| seed_day(y, m, d)),
        created_at: Utc.from_utc_datetime(
            &seed_day(created.0, created.1, created.2).and_time(NaiveTime::MIN),
        ),
    };
    vec![
        task(
            "1",
            "Design new landing page",
            "Create wireframes and mockups for the new landing page",
            false,
            "2",
            Priority::High,
            Some((2026, 1, 15)),
            (2026, 1, 8),
        ),
        task(
            "2",
            "Review pull requests",
            "Check and merge pending PRs from the team",
            false,
            "1",
            Priority::Medium,
            Some((2026, 1, 14)),
            (2026, 1, 8),
        ),
        task(
            "3",
            "Update documentation",
            "Add API documentation for new endpoints",
            true,
            "1",
            Priority::Low,
            None,
            (2026, 1, 7),
        ),
        task(
            "4",
            "Prepare social media content",
            "Schedule posts for next week",
            false,
            "3",
            Priority::Medium,
            Some((2026, 1, 16)),
            (2026, 1, 8),
        ),
        task(
            "5",
            "Team meeting",
            "Quarterly planning session",
            false,
            "4",
            Priority::High,
            Some((2026, 1, 13)),
            (2026, 1, 9),
        ),
    ]
}

/// Demo notifications, timestamped relative to `now`.
pub fn demo_notifications(now: DateTime<Utc>) -> Vec<Notification> {
    let notification = |id: &str, kind, title: &str, message: &str, age: Duration, read| {
        Notification {
            id: id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp: now - age,
            read,
        }
    };
    vec![
        notification(
            "1",
            NotificationKind::Reminder,
            "Task Due Today",
            "Team meeting is scheduled for today at 2:00 PM",
            Duration::hours(2),
            false,
        ),
        notification(
            "2",
            NotificationKind::Task,
            "New Task Assigned",
            "You have been assigned to \"Design new landing page\"",
            Duration::hours(5),
            false,
        ),
        notification(
            "3",
            NotificationKind::Success,
            "Task Completed",
            "Great job! You completed \"Update documentation\"",
            Duration::days(1),
            true,
        ),
        notification(
            "4",
            NotificationKind::Update,
            "System Update",
            "TaskPro has been updated to version 1.0.1",
            Duration::days(2),
            true,
        ),
    ]
}

fn seed_day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        demo_tasks().remove(0)
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut task = sample_task();
        let changed = TaskPatch {
            title: Some("Ship landing page".into()),
            due_date: Some(None),
            ..Default::default()
        }
        .apply(&mut task);
        assert!(changed);
        assert_eq!(task.title, "Ship landing page");
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, Priority::High);
        assert!(task.description.is_some());
    }

    #[test]
    fn empty_patch_reports_no_change() {
        let mut task = sample_task();
        let patch = TaskPatch::default();
        assert!(patch.is_empty());
        assert!(!patch.apply(&mut task));
        assert_eq!(task, sample_task());
    }

    #[test]
    fn draft_trims_and_drops_blank_description() {
        let draft = TaskDraft {
            title: "  Write tests  ".into(),
            description: "   ".into(),
            category_id: "1".into(),
            priority: Priority::High,
            due_date: "2026-02-01".into(),
        };
        let new = draft.validate(&demo_categories()).expect("valid draft");
        assert_eq!(new.title, "Write tests");
        assert_eq!(new.description, None);
        assert!(!new.completed);
        assert_eq!(new.due_date, NaiveDate::from_ymd_opt(2026, 2, 1));
    }

    #[test]
    fn draft_rejects_blank_title_and_pseudo_category() {
        let categories = demo_categories();
        let blank = TaskDraft {
            title: "  ".into(),
            category_id: "1".into(),
            ..Default::default()
        };
        assert_eq!(blank.validate(&categories), Err(ValidationError::EmptyTitle));

        let all = TaskDraft {
            title: "Plan".into(),
            category_id: ALL_CATEGORY_ID.into(),
            ..Default::default()
        };
        assert_eq!(
            all.validate(&categories),
            Err(ValidationError::UnknownCategory("all".into()))
        );
    }

    #[test]
    fn draft_reports_bad_due_date() {
        let draft = TaskDraft {
            title: "Plan".into(),
            category_id: "2".into(),
            due_date: "15/01/2026".into(),
            ..Default::default()
        };
        assert!(matches!(
            draft.validate(&demo_categories()),
            Err(ValidationError::Date(_))
        ));
    }

    #[test]
    fn profile_draft_requires_name_and_email() {
        let mut draft = ProfileDraft::from_user(&demo_user());
        draft.email = " ".into();
        assert_eq!(draft.validate(), Err(ValidationError::EmptyEmail));
        draft.name = String::new();
        assert_eq!(draft.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn settings_toggle_flips_single_flag() {
        let mut settings = NotificationSettings::default();
        let patch = SettingsPatch::toggle(&settings, SettingKind::EmailNotifications);
        assert!(patch.apply(&mut settings));
        assert!(settings.email_notifications);
        assert!(settings.task_reminders);
        assert!(settings.push_notifications);
    }

    #[test]
    fn settings_serialize_with_camel_case_keys() {
        let json = serde_json::to_string(&NotificationSettings::default()).expect("serialize");
        assert_eq!(
            json,
            r#"{"taskReminders":true,"emailNotifications":false,"pushNotifications":true}"#
        );
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::High.rank() > Priority::Medium.rank());
    }

    #[test]
    fn task_deserializes_from_seed_yaml() {
        let yaml = r#"
id: "9"
title: Water plants
categoryId: "4"
priority: low
dueDate: 2026-03-01
createdAt: 2026-02-20T08:00:00Z
"#;
        let task: Task = serde_yaml::from_str(yaml).expect("parse task");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(!task.completed);
        assert_eq!(task.description, None);
    }
}
