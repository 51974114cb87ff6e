use crate::model::{
    self, Category, NewTask, Notification, NotificationSettings, Seed, SettingsPatch, Task, TaskId,
    TaskPatch, User, UserPatch,
};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::fmt;
use tracing::debug;

type SettingsHook = Box<dyn FnMut(&NotificationSettings)>;

/// Owns tasks, categories, the user profile, notifications and notification
/// settings. Every mutation is total: unknown ids leave the collections
/// untouched and the return value reports whether anything changed.
pub struct AppState {
    tasks: Vec<Task>,
    categories: Vec<Category>,
    user: User,
    notifications: Vec<Notification>,
    settings: NotificationSettings,
    settings_hook: Option<SettingsHook>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("tasks", &self.tasks.len())
            .field("categories", &self.categories.len())
            .field("user", &self.user.name)
            .field("notifications", &self.notifications.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(seed: Seed, settings: NotificationSettings, now: DateTime<Utc>) -> Self {
        AppState {
            tasks: seed.tasks.unwrap_or_else(model::demo_tasks),
            categories: seed.categories.unwrap_or_else(model::demo_categories),
            user: seed.user.unwrap_or_else(model::demo_user),
            notifications: seed
                .notifications
                .unwrap_or_else(|| model::demo_notifications(now)),
            settings,
            settings_hook: None,
        }
    }

    /// Demo workspace with default notification settings.
    #[cfg(test)]
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self::new(Seed::default(), NotificationSettings::default(), now)
    }

    /// Registers the callback run after every settings change.
    pub fn set_settings_hook(&mut self, hook: impl FnMut(&NotificationSettings) + 'static) {
        self.settings_hook = Some(Box::new(hook));
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Categories a task can belong to, without the "all" pseudo-category.
    pub fn assignable_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| !c.is_all())
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    /// Inserts a task at the front of the collection with a fresh id and the
    /// current time as its creation timestamp.
    pub fn add_task(&mut self, new: NewTask) -> TaskId {
        let id = self.fresh_task_id();
        let task = Task::from_new(id.clone(), new, Utc::now());
        debug!(task_id = %id, title = %task.title, "task added");
        self.tasks.insert(0, task);
        id
    }

    pub fn toggle_task(&mut self, id: &str) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                debug!(task_id = id, completed = task.completed, "task toggled");
                true
            }
            None => false,
        }
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            debug!(task_id = id, "task deleted");
        }
        removed
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> bool {
        let changed = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .map(|task| patch.apply(task))
            .unwrap_or(false);
        if changed {
            debug!(task_id = id, "task updated");
        }
        changed
    }

    pub fn update_user(&mut self, patch: UserPatch) -> bool {
        let changed = patch.apply(&mut self.user);
        if changed {
            debug!(name = %self.user.name, "profile updated");
        }
        changed
    }

    pub fn mark_notification_read(&mut self, id: &str) -> bool {
        match self
            .notifications
            .iter_mut()
            .find(|n| n.id == id && !n.read)
        {
            Some(notification) => {
                notification.read = true;
                debug!(notification_id = id, "notification read");
                true
            }
            None => false,
        }
    }

    pub fn mark_all_notifications_read(&mut self) -> bool {
        let mut changed = false;
        for notification in self.notifications.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed = true;
        }
        if changed {
            debug!("all notifications read");
        }
        changed
    }

    pub fn delete_notification(&mut self, id: &str) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        let removed = self.notifications.len() != before;
        if removed {
            debug!(notification_id = id, "notification deleted");
        }
        removed
    }

    /// Merges `patch` into the settings and, when a flag changed, runs the
    /// settings hook once with the new value.
    pub fn update_notification_settings(&mut self, patch: SettingsPatch) -> bool {
        if !patch.apply(&mut self.settings) {
            return false;
        }
        debug!(settings = ?self.settings, "notification settings changed");
        if let Some(hook) = self.settings_hook.as_mut() {
            hook(&self.settings);
        }
        true
    }

    fn fresh_task_id(&self) -> TaskId {
        loop {
            let id = generate_id();
            if self.task(&id).is_none() {
                return id;
            }
        }
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, SettingKind};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn state() -> AppState {
        AppState::seeded(Utc::now())
    }

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.into(),
            description: None,
            completed: false,
            category_id: "1".into(),
            priority: Priority::Low,
            due_date: None,
        }
    }

    #[test]
    fn add_prepends_with_fresh_ids() {
        let mut state = state();
        let before = Utc::now();
        let mut ids = HashSet::new();
        for i in 0..50 {
            let count = state.tasks().len();
            let id = state.add_task(new_task(&format!("task {i}")));
            assert_eq!(state.tasks().len(), count + 1);
            assert_eq!(state.tasks()[0].id, id);
            assert!(ids.insert(id));
        }
        let all: HashSet<&str> = state.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(all.len(), state.tasks().len());
        assert!(state.tasks()[0].created_at >= before);
    }

    #[test]
    fn toggle_flips_completion() {
        let mut state = state();
        assert!(state.toggle_task("3"));
        assert_eq!(state.task("3").map(|t| t.completed), Some(false));
        assert!(state.toggle_task("3"));
        assert_eq!(state.task("3").map(|t| t.completed), Some(true));
        assert!(!state.toggle_task("nope"));
    }

    #[test]
    fn delete_of_absent_id_is_a_no_op() {
        let mut state = state();
        let count = state.tasks().len();
        assert!(!state.delete_task("nope"));
        assert_eq!(state.tasks().len(), count);
        assert!(state.delete_task("2"));
        assert_eq!(state.tasks().len(), count - 1);
        assert!(state.task("2").is_none());
    }

    #[test]
    fn update_merges_fields() {
        let mut state = state();
        let changed = state.update_task(
            "1",
            TaskPatch {
                priority: Some(Priority::Low),
                description: Some(None),
                ..Default::default()
            },
        );
        assert!(changed);
        let task = state.task("1").expect("task 1");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.description, None);
        assert_eq!(task.title, "Design new landing page");
        assert!(!state.update_task("missing", TaskPatch::default()));
    }

    #[test]
    fn profile_patch_keeps_unset_fields() {
        let mut state = state();
        let avatar = state.user().avatar.clone();
        assert!(state.update_user(UserPatch {
            name: Some("Sam Lee".into()),
            ..Default::default()
        }));
        assert_eq!(state.user().name, "Sam Lee");
        assert_eq!(state.user().avatar, avatar);
    }

    #[test]
    fn notifications_read_and_delete() {
        let mut state = state();
        assert!(state.mark_notification_read("1"));
        assert!(!state.mark_notification_read("1"));
        assert!(!state.mark_notification_read("missing"));
        assert!(state.mark_all_notifications_read());
        assert!(state.notifications().iter().all(|n| n.read));
        assert!(!state.mark_all_notifications_read());
        assert!(state.delete_notification("4"));
        assert!(!state.delete_notification("4"));
        assert_eq!(state.notifications().len(), 3);
    }

    #[test]
    fn settings_hook_runs_once_per_change() {
        let mut state = state();
        let seen: Rc<RefCell<Vec<NotificationSettings>>> = Rc::default();
        let sink = Rc::clone(&seen);
        state.set_settings_hook(move |settings| sink.borrow_mut().push(*settings));

        let patch = SettingsPatch::toggle(state.settings(), SettingKind::PushNotifications);
        assert!(state.update_notification_settings(patch));
        assert!(!state.update_notification_settings(SettingsPatch {
            task_reminders: Some(true),
            ..Default::default()
        }));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].push_notifications);
        assert_eq!(seen[0], *state.settings());
    }

    #[test]
    fn seed_sections_override_demo_data() {
        let seed = Seed {
            tasks: Some(Vec::new()),
            ..Default::default()
        };
        let state = AppState::new(seed, NotificationSettings::default(), Utc::now());
        assert!(state.tasks().is_empty());
        assert_eq!(state.categories().len(), 5);
        assert_eq!(state.assignable_categories().count(), 4);
    }
}
