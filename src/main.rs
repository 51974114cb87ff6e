mod aggregate;
mod calendar;
mod cli;
mod commands;
mod dates;
mod model;
mod state;
mod storage;
mod ui;

use aggregate::TaskQuery;
use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let Cli { global, command } = Cli::parse();
    install_tracing();
    match command.unwrap_or(Command::Tui) {
        Command::Dashboard { category } => commands::dashboard(&global, category),
        Command::List {
            category,
            search,
            priority,
            sort,
        } => {
            let query = TaskQuery::new()
                .with_category(category)
                .with_search(search.unwrap_or_default())
                .with_priority(priority.into())
                .with_sort(sort.into());
            commands::list(&global, query)
        }
        Command::Calendar { month } => commands::calendar(&global, month),
        Command::Upcoming => commands::upcoming(&global),
        Command::Notifications => commands::notifications(&global),
        Command::Settings { action } => commands::settings(&global, action),
        Command::Tui => commands::tui(&global),
    }
}

fn install_tracing() {
    // RUST_LOG overrides the INFO default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
