use crate::aggregate::{self, TaskQuery, TaskStats};
use crate::calendar::{self, CalendarGrid, MonthCursor};
use crate::cli::{GlobalArgs, SettingsAction};
use crate::dates;
use crate::model::{Category, NotificationSettings, Seed, SettingKind, Task, ALL_CATEGORY_ID};
use crate::state::AppState;
use crate::storage::{self, FileStore, KeyValueStore, MemoryStore};
use crate::ui;
use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

pub fn dashboard(global: &GlobalArgs, category: String) -> Result<()> {
    let state = open_state(global)?;
    let today = dates::today();
    ensure_category(&state, &category)?;
    let stats = TaskStats::compute(state.tasks(), today);
    println!("Dashboard for {}", state.user().name);
    println!(
        "  total {}  completed {} ({}%)  active {}  due today {}",
        stats.total, stats.completed, stats.completion_rate, stats.pending, stats.due_today
    );
    println!();
    for (cat, count) in aggregate::category_counts(state.tasks(), state.categories()) {
        let marker = if cat.id == category { '*' } else { ' ' };
        println!(" {} {:<14} {:>3}  [{}]", marker, cat.name, count, cat.color.label());
    }
    println!();
    let listing = TaskQuery::new().with_category(category).apply(state.tasks());
    print_section("Pending", &listing.active, state.categories(), today);
    print_section("Completed", &listing.completed, state.categories(), today);
    Ok(())
}

pub fn list(global: &GlobalArgs, query: TaskQuery) -> Result<()> {
    let state = open_state(global)?;
    let today = dates::today();
    ensure_category(&state, &query.category)?;
    let listing = query.apply(state.tasks());
    println!(
        "Priority: {}  Sort: {}{}",
        query.priority.label(),
        query.sort.label(),
        if query.search.is_empty() {
            String::new()
        } else {
            format!("  Search: {:?}", query.search)
        }
    );
    print_section("Active", &listing.active, state.categories(), today);
    print_section("Completed", &listing.completed, state.categories(), today);
    info!(shown = listing.len(), total = state.tasks().len(), "listed tasks");
    Ok(())
}

pub fn calendar(global: &GlobalArgs, month: Option<MonthCursor>) -> Result<()> {
    let state = open_state(global)?;
    let today = dates::today();
    let month = month.unwrap_or_else(|| MonthCursor::containing(today));
    let grid = CalendarGrid::build(month, state.tasks(), today);
    println!("{}", month.label());
    println!(" Sun   Mon   Tue   Wed   Thu   Fri   Sat");
    for week in grid.weeks() {
        let line: Vec<String> = week
            .iter()
            .map(|slot| match slot {
                None => "     ".to_string(),
                Some(cell) => {
                    let mark = if cell.is_today { '>' } else { ' ' };
                    if cell.tasks.is_empty() {
                        format!("{}{:>2}  ", mark, cell.day)
                    } else {
                        format!("{}{:>2}({})", mark, cell.day, cell.tasks.len())
                    }
                }
            })
            .collect();
        println!("{}", line.join(" ").trim_end());
    }
    println!();
    for cell in (1..=month.days_in_month())
        .filter_map(|day| grid.cell(day))
        .filter(|c| !c.tasks.is_empty())
    {
        let titles: Vec<&str> = cell.visible_tasks().iter().map(|t| t.title.as_str()).collect();
        let more = cell
            .overflow()
            .map(|k| format!(" +{} more", k))
            .unwrap_or_default();
        println!("  {}: {}{}", dates::format_short_date(cell.date), titles.join(", "), more);
    }
    Ok(())
}

pub fn upcoming(global: &GlobalArgs) -> Result<()> {
    let state = open_state(global)?;
    let today = dates::today();
    let upcoming = calendar::upcoming_tasks(state.tasks(), today);
    println!("Upcoming ({})", calendar::upcoming_total(state.tasks()));
    if upcoming.is_empty() {
        println!("  (nothing scheduled)");
    }
    for entry in upcoming {
        let category = dates::category_for(entry.task, state.categories())
            .map(|c| format!("  {}", c.name))
            .unwrap_or_default();
        println!(
            "  {:<7} {:<8} {}{}",
            dates::format_short_date(entry.due),
            entry.status.label(),
            entry.task.title,
            category
        );
    }
    Ok(())
}

pub fn notifications(global: &GlobalArgs) -> Result<()> {
    let state = open_state(global)?;
    let now = Utc::now();
    println!(
        "Notifications ({} unread)",
        aggregate::unread_count(state.notifications())
    );
    if state.notifications().is_empty() {
        println!("  (none)");
    }
    for n in state.notifications() {
        println!(
            "  {} {} {} - {}  [{}]",
            if n.read { ' ' } else { '•' },
            n.kind.icon(),
            n.title,
            n.message,
            dates::format_relative(n.timestamp, now)
        );
    }
    Ok(())
}

pub fn settings(global: &GlobalArgs, action: SettingsAction) -> Result<()> {
    let mut state = open_state(global)?;
    if let Some(patch) = action.patch() {
        if state.update_notification_settings(patch) {
            info!("notification settings updated");
        } else {
            println!("Settings unchanged");
        }
    }
    print_settings(state.settings());
    Ok(())
}

pub fn tui(global: &GlobalArgs) -> Result<()> {
    let state = open_state(global)?;
    ui::run(state)
}

/// Builds the state container from the seed (or demo data) and the stored
/// settings, wiring settings changes back to storage.
fn open_state(global: &GlobalArgs) -> Result<AppState> {
    let seed = match &global.seed {
        Some(path) => storage::load_seed(path)?,
        None => Default::default(),
    };
    if global.ephemeral {
        return Ok(wire_state(seed, MemoryStore::default()));
    }
    let dir = storage::data_dir(global.data_dir.as_deref())?;
    let store = FileStore::in_dir(&dir);
    debug!(path = %store.path().display(), "using settings storage");
    Ok(wire_state(seed, store))
}

fn wire_state<S: KeyValueStore + 'static>(seed: Seed, store: S) -> AppState {
    let settings = storage::load_notification_settings(&store);
    let mut state = AppState::new(seed, settings, Utc::now());
    state.set_settings_hook(storage::persist_settings_hook(store));
    state
}

/// The reserved "all" id means no filter, so it is valid even when the
/// category list does not carry it.
fn ensure_category(state: &AppState, category: &str) -> Result<()> {
    if category != ALL_CATEGORY_ID && !state.categories().iter().any(|c| c.id == category) {
        bail!("unknown category: {}", category);
    }
    Ok(())
}

fn print_section(title: &str, tasks: &[&Task], categories: &[Category], today: NaiveDate) {
    println!("{} ({})", title, tasks.len());
    if tasks.is_empty() {
        println!("  (empty)");
    }
    for task in tasks {
        print_task(task, categories, today);
    }
    println!();
}

fn print_task(task: &Task, categories: &[Category], today: NaiveDate) {
    let check = if task.completed { 'x' } else { ' ' };
    println!("  [{}] {}: {}", check, task.id, task.title);
    let mut facts = vec![task.priority.label().to_string()];
    if let Some(category) = dates::category_for(task, categories) {
        facts.push(category.name.clone());
    }
    if let Some(due) = task.due_date {
        facts.push(format!("due {}", dates::format_short_date(due)));
    }
    if dates::is_overdue(task, today) {
        facts.push("overdue".to_string());
    }
    println!("      {}", facts.join(" · "));
    if let Some(description) = &task.description {
        println!("      {}", description);
    }
}

fn print_settings(settings: &NotificationSettings) {
    for kind in SettingKind::ALL {
        println!(
            "  {:<20} {}",
            kind.label(),
            if settings.get(kind) { "on" } else { "off" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SettingsPatch;

    #[test]
    fn settings_changes_reach_the_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::in_dir(dir.path());
        let mut state = wire_state(Seed::default(), store.clone());
        assert!(state.update_notification_settings(SettingsPatch {
            push_notifications: Some(false),
            ..Default::default()
        }));
        let saved = storage::load_notification_settings(&store);
        assert!(!saved.push_notifications);
        assert_eq!(saved, *state.settings());

        let reopened = wire_state(Seed::default(), FileStore::in_dir(dir.path()));
        assert_eq!(reopened.settings(), state.settings());
    }

    #[test]
    fn ephemeral_state_starts_from_defaults() {
        let global = GlobalArgs {
            ephemeral: true,
            ..Default::default()
        };
        let state = open_state(&global).expect("state");
        assert_eq!(*state.settings(), NotificationSettings::default());
        assert_eq!(state.tasks().len(), 5);
    }

    #[test]
    fn seed_without_all_category_still_lists_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let seed = dir.path().join("seed.yml");
        std::fs::write(
            &seed,
            r#"
categories:
  - id: "1"
    name: Work
    color: blue
"#,
        )
        .expect("write seed");
        let global = GlobalArgs {
            seed: Some(seed),
            ephemeral: true,
            ..Default::default()
        };
        let state = open_state(&global).expect("state");
        assert!(state.categories().iter().all(|c| !c.is_all()));
        assert!(ensure_category(&state, ALL_CATEGORY_ID).is_ok());
        assert!(ensure_category(&state, "2").is_err());

        dashboard(&global, ALL_CATEGORY_ID.to_string()).expect("dashboard");
        list(&global, TaskQuery::new()).expect("list");
    }

    #[test]
    fn unknown_category_is_rejected() {
        let state = AppState::seeded(Utc::now());
        assert!(ensure_category(&state, "all").is_ok());
        assert!(ensure_category(&state, "3").is_ok());
        let err = ensure_category(&state, "9").expect_err("unknown");
        assert!(err.to_string().contains("unknown category"));
    }
}
