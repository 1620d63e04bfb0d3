mod browser;
mod cache;
mod cli;
mod error;
mod fmt;
mod form;
mod grid;
mod logger;
mod models;
mod normalize;
mod reports;
mod repository;
mod schema;
mod settings;
mod store;
mod tui;

use std::io::IsTerminal;

use clap::Parser;

use cli::{BadgingCommands, Cli, Commands, LiveCommands};
use error::Result;
use form::FormKind;
use schema::TicketTable;
use settings::load_settings;

fn run(command: Option<Commands>) -> Result<()> {
    let Some(command) = command else {
        if std::io::stdout().is_terminal() {
            return cli::dashboard::run();
        }
        println!("{}", cli::dashboard::home_text(&load_settings()));
        return Ok(());
    };

    match command {
        Commands::Init { url, key, budget } => cli::init::run(&url, key.as_deref(), budget),
        Commands::Status => cli::status::run(),
        Commands::Dashboard => cli::dashboard::run(),
        Commands::Demo => cli::demo::run(),
        Commands::Report => {
            let settings = load_settings();
            let mut repo = cli::connect(&settings)?;
            cli::report::run_reporting(&mut repo, &settings)
        }
        Commands::Pnl { month } => {
            let mut repo = cli::connect(&load_settings())?;
            cli::report::run_pnl(&mut repo, month.as_deref())
        }
        Commands::Badging { command } => {
            let mut repo = cli::connect(&load_settings())?;
            match command {
                BadgingCommands::List => cli::tickets::list(&mut repo, TicketTable::Badging),
                BadgingCommands::Add {
                    date,
                    tech,
                    site,
                    hours,
                    base,
                    additional,
                } => cli::tickets::add(
                    &mut repo,
                    FormKind::Badging,
                    vec![
                        ("Date", date.as_deref()),
                        ("Tech", tech.as_deref()),
                        ("Site", site.as_deref()),
                        ("Hours", hours.as_deref()),
                        ("Base", base.as_deref()),
                        ("Additional", additional.as_deref()),
                    ],
                ),
                BadgingCommands::Edit(args) => cli::tickets::edit(&mut repo, TicketTable::Badging, &args),
            }
        }
        Commands::Live { command } => {
            let mut repo = cli::connect(&load_settings())?;
            match command {
                LiveCommands::List => cli::tickets::list(&mut repo, TicketTable::Live),
                LiveCommands::Add {
                    date,
                    tech,
                    sla,
                    site,
                    hours,
                    additional,
                } => cli::tickets::add(
                    &mut repo,
                    FormKind::Live,
                    vec![
                        ("Date", date.as_deref()),
                        ("Tech", tech.as_deref()),
                        ("SLA", sla.as_deref()),
                        ("Site", site.as_deref()),
                        ("Hours", hours.as_deref()),
                        ("Additional", additional.as_deref()),
                    ],
                ),
                LiveCommands::Edit(args) => cli::tickets::edit(&mut repo, TicketTable::Live, &args),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let interactive = match &cli.command {
        None
        | Some(Commands::Dashboard | Commands::Demo | Commands::Report | Commands::Pnl { .. }) => {
            std::io::stdout().is_terminal()
        }
        Some(_) => false,
    };
    if let Err(e) = logger::init_logging(interactive) {
        eprintln!("Warning: logging disabled: {e}");
    }

    if let Err(e) = run(cli.command) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
