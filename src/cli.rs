use crate::aggregate::{PriorityFilter, SortKey};
use crate::calendar::MonthCursor;
use crate::model::{Priority, SettingsPatch, ALL_CATEGORY_ID};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "taskpro",
    version,
    about = "Task dashboard, task list and calendar for the terminal"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory holding the settings storage file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// YAML file with initial categories, tasks, notifications and user
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,
    /// Keep settings changes in memory for this run only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show task statistics, category counts and the task lists
    Dashboard {
        /// Category id to list (stats always cover every task)
        #[arg(long, default_value = ALL_CATEGORY_ID)]
        category: String,
    },
    /// List tasks with filters and sorting
    List {
        /// Filter by category id
        #[arg(long, default_value = ALL_CATEGORY_ID)]
        category: String,
        /// Case-insensitive text matched against title and description
        #[arg(long, short = 's')]
        search: Option<String>,
        /// Only show tasks with this priority
        #[arg(long, short = 'p', value_enum, default_value_t = PriorityArg::All)]
        priority: PriorityArg,
        /// Sort order
        #[arg(long, value_enum, default_value_t = SortArg::Date)]
        sort: SortArg,
    },
    /// Print a month grid with the tasks due on each day
    Calendar {
        /// Month in YYYY-MM format (defaults to the current month)
        #[arg(long)]
        month: Option<MonthCursor>,
    },
    /// List the next open tasks by due date
    Upcoming,
    /// List notifications
    Notifications,
    /// Show or change notification settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the current notification settings
    Show,
    /// Change one or more notification settings
    Set {
        #[arg(long, action = ArgAction::Set)]
        task_reminders: Option<bool>,
        #[arg(long, action = ArgAction::Set)]
        email_notifications: Option<bool>,
        #[arg(long, action = ArgAction::Set)]
        push_notifications: Option<bool>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityArg {
    All,
    Low,
    Medium,
    High,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    /// Newest first
    Date,
    /// High to low
    Priority,
    /// Alphabetical
    Name,
}

impl From<PriorityArg> for PriorityFilter {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::All => PriorityFilter::All,
            PriorityArg::Low => PriorityFilter::Only(Priority::Low),
            PriorityArg::Medium => PriorityFilter::Only(Priority::Medium),
            PriorityArg::High => PriorityFilter::Only(Priority::High),
        }
    }
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Date => SortKey::Created,
            SortArg::Priority => SortKey::Priority,
            SortArg::Name => SortKey::Title,
        }
    }
}

impl SettingsAction {
    pub fn patch(&self) -> Option<SettingsPatch> {
        match self {
            SettingsAction::Show => None,
            SettingsAction::Set {
                task_reminders,
                email_notifications,
                push_notifications,
            } => Some(SettingsPatch {
                task_reminders: *task_reminders,
                email_notifications: *email_notifications,
                push_notifications: *push_notifications,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_defaults_to_none() {
        let cli = Cli::parse_from(["taskpro"]);
        assert!(cli.command.is_none());
        assert!(cli.global.seed.is_none());
        assert!(!cli.global.ephemeral);
    }

    #[test]
    fn parses_list_filters() {
        let cli = Cli::parse_from([
            "taskpro", "list", "--category", "2", "-s", "page", "-p", "high", "--sort", "name",
        ]);
        match cli.command {
            Some(Command::List {
                category,
                search,
                priority,
                sort,
            }) => {
                assert_eq!(category, "2");
                assert_eq!(search.as_deref(), Some("page"));
                assert_eq!(PriorityFilter::from(priority), PriorityFilter::Only(Priority::High));
                assert_eq!(SortKey::from(sort), SortKey::Title);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_calendar_month_and_global_flags() {
        let cli = Cli::parse_from([
            "taskpro",
            "calendar",
            "--month",
            "2025-12",
            "--data-dir",
            "/tmp/tp",
            "--ephemeral",
        ]);
        assert_eq!(cli.global.data_dir, Some(PathBuf::from("/tmp/tp")));
        assert!(cli.global.ephemeral);
        match cli.command {
            Some(Command::Calendar { month }) => assert_eq!(month, MonthCursor::new(2025, 12)),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["taskpro", "calendar", "--month", "2025-13"]).is_err());
    }

    #[test]
    fn settings_set_builds_partial_patch() {
        let cli = Cli::parse_from(["taskpro", "settings", "set", "--email-notifications", "true"]);
        let Some(Command::Settings { action }) = cli.command else {
            panic!("expected settings command");
        };
        assert_eq!(
            action.patch(),
            Some(SettingsPatch {
                email_notifications: Some(true),
                ..Default::default()
            })
        );
    }
}
