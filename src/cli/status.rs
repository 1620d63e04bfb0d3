use colored::Colorize;

use crate::error::Result;
use crate::fmt::money;
use crate::repository::Repository;
use crate::schema::TicketTable;
use crate::settings::{config_dir, load_settings, settings_file_exists, Settings, KEY_ENV, URL_ENV};
use crate::store::{RecordStore, SelectQuery};

use super::connect;

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    print_settings(&settings);

    match connect(&settings) {
        Ok(repo) => {
            println!();
            print_counts(&repo);
        }
        Err(e) => {
            println!();
            println!("{}", e.to_string().yellow());
        }
    }
    Ok(())
}

fn print_settings(settings: &Settings) {
    let file = config_dir().join("settings.json");
    println!(
        "Settings:   {}{}",
        file.display(),
        if settings_file_exists() { "" } else { " (missing)" }
    );
    println!("Title:      {}", settings.title);
    println!("Store URL:  {}", or_unset(&settings.store_url));
    println!(
        "API key:    {}",
        if settings.store_key.is_empty() { "(not set)" } else { "set" }
    );
    for name in [URL_ENV, KEY_ENV] {
        if std::env::var_os(name).is_some() {
            println!("            {name} is set and overrides the file");
        }
    }
    println!("Budget:     {}", money(settings.startup_budget));
    println!("Logs:       {}", config_dir().join("logs").display());
}

/// Row counts straight from the store; a failing table prints its error.
fn print_counts<S: RecordStore>(repo: &Repository<S>) {
    for table in [TicketTable::Badging, TicketTable::Live, TicketTable::Directory] {
        match repo.store().select(&SelectQuery::all(table)) {
            Ok(rows) => println!("{:<20} {} rows", table.name(), rows.len()),
            Err(e) => println!("{:<20} {}", table.name(), e.to_string().red()),
        }
    }
}
