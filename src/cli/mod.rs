pub mod dashboard;
pub mod demo;
pub mod form_view;
pub mod init;
pub mod report;
pub mod status;
pub mod tickets;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::error::{DeskError, Result};
use crate::repository::{Notice, NoticeLevel, Repository};
use crate::settings::Settings;
use crate::store::rest::RestStore;
use crate::store::RecordStore;

/// Store handle used by every command: REST in normal runs, in-memory for the demo.
pub type DynRepository = Repository<Box<dyn RecordStore>>;

pub fn connect(settings: &Settings) -> Result<DynRepository> {
    let credentials = settings.credentials()?;
    let store: Box<dyn RecordStore> = Box::new(RestStore::new(&credentials)?);
    Ok(Repository::new(store))
}

pub(crate) fn print_notices(notices: &[Notice]) {
    for n in notices {
        let line = match n.level {
            NoticeLevel::Info => n.message.cyan(),
            NoticeLevel::Success => n.message.green(),
            NoticeLevel::Warning => format!("Warning: {}", n.message).yellow(),
            NoticeLevel::Error => format!("Error: {}", n.message).red().bold(),
        };
        println!("{line}");
    }
}

/// Split `Column=Value` from `--set`.
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (column, value) = raw.split_once('=').ok_or_else(|| {
        DeskError::InvalidInput(format!("expected Column=Value, got '{raw}'"))
    })?;
    let column = column.trim();
    if column.is_empty() {
        return Err(DeskError::InvalidInput(format!("missing column name in '{raw}'")));
    }
    Ok((column.to_string(), value.to_string()))
}

#[derive(Parser)]
#[command(
    name = "dispatch-desk",
    version,
    about = "Dispatch ticket tracking and reporting over a hosted PostgREST store."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save store connection details and the startup budget.
    Init {
        /// Project URL, e.g. https://xyz.supabase.co
        #[arg(long)]
        url: String,
        /// API key (anon or service role)
        #[arg(long)]
        key: Option<String>,
        /// Startup budget used by the budget chart
        #[arg(long)]
        budget: Option<f64>,
    },
    /// Show configuration and table row counts.
    Status,
    /// Badging tickets.
    Badging {
        #[command(subcommand)]
        command: BadgingCommands,
    },
    /// Live dispatch tickets.
    Live {
        #[command(subcommand)]
        command: LiveCommands,
    },
    /// Budget allocation and badging progress.
    Report,
    /// Live dispatch SLA counts and monthly financials.
    Pnl {
        /// Month to report: YYYY-MM (default: most recent)
        #[arg(long)]
        month: Option<String>,
    },
    /// Open the interactive dashboard.
    Dashboard,
    /// Open the dashboard over bundled sample data, without a store.
    Demo,
}

#[derive(Args, Clone, Debug)]
pub struct EditArgs {
    /// Row id to update
    #[arg(long)]
    pub id: i64,
    /// Column assignment, repeatable: --set Hours=2.5
    #[arg(long = "set", value_name = "COLUMN=VALUE", required = true)]
    pub assignments: Vec<String>,
}

#[derive(Subcommand)]
pub enum BadgingCommands {
    /// List badging tickets.
    List,
    /// Add a badging ticket. Total is Base + Additional.
    Add {
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        tech: Option<String>,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        hours: Option<String>,
        #[arg(long)]
        base: Option<String>,
        #[arg(long)]
        additional: Option<String>,
    },
    /// Update cells of one badging ticket.
    Edit(EditArgs),
}

#[derive(Subcommand)]
pub enum LiveCommands {
    /// List live dispatches.
    List,
    /// Add a live dispatch. Pay columns are filled in by the store.
    Add {
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        tech: Option<String>,
        /// One of: 2 Hour, 4 Hour, 2 Day, 4 Day (default: 2 Hour)
        #[arg(long)]
        sla: Option<String>,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        hours: Option<String>,
        #[arg(long)]
        additional: Option<String>,
    },
    /// Update cells of one live dispatch.
    Edit(EditArgs),
}
