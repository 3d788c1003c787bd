use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mrportal_core::{Action, ReportKind, ReportPeriod};

mod app;
mod auth;
mod config;
mod render;
mod reports;
mod schedule;
mod state;

use app::App;
use reports::ReportRequest;

#[derive(Parser, Debug)]
#[command(
    name = "mrportal",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MRPORTAL_BUILD_SHA"), ")"),
    about = "MR Portal console: daily schedules, visit status, reports"
)]
struct Cli {
    /// Debug logging on stderr (MRPORTAL_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session under ~/.mrportal
    Login {
        #[arg(long, short)]
        username: String,

        /// Prompted when omitted
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Forget the stored session and cached MR list
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// Day schedule grouped into Planned / Completed / Cancelled
    Schedule {
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// MR to view (admins only; default: first MR)
        #[arg(long)]
        mr: Option<String>,
    },

    /// Mark a visit on today's schedule as done
    Complete(TransitionArgs),

    /// Put a completed visit back to planned
    Revert(TransitionArgs),

    /// Cancel a visit on today's schedule
    Cancel(TransitionArgs),

    /// Numbered stops and route for a day
    Map {
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        mr: Option<String>,

        /// Also write the route as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
    },

    /// Activity and performance reports
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Admin-only operations
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Manage ~/.mrportal/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Args, Debug)]
struct TransitionArgs {
    activity_id: String,

    #[arg(long)]
    mr: Option<String>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// MR filter (admins only; default: all)
    #[arg(long)]
    mr: Option<String>,

    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Export every row as CSV (default file: <kind>-report.csv)
    #[arg(long)]
    csv: Option<Option<PathBuf>>,
}

#[derive(Args, Debug)]
struct MonthArgs {
    #[arg(long)]
    month: u32,

    #[arg(long)]
    year: i32,

    #[command(flatten)]
    common: ReportArgs,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Visits in a date range
    Activity {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[command(flatten)]
        common: ReportArgs,
    },
    /// Planned vs completed visits for a month
    Compliance(MonthArgs),
    /// Visit patterns per customer for a month
    CustomerBehaviour(MonthArgs),
    /// Distance and travel time for a month
    Travel(MonthArgs),
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// List MRs (and refresh the cached roster)
    Mrs,

    /// Regenerate the master schedule server-side
    GenerateSchedule {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
    /// Print the effective configuration
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("MRPORTAL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

impl ReportCommand {
    fn into_request(self) -> Result<ReportRequest> {
        let (kind, period, common) = match self {
            ReportCommand::Activity { from, to, common } => {
                (ReportKind::Activity, reports::range(&from, &to)?, common)
            }
            ReportCommand::Compliance(m) => month(ReportKind::Compliance, m),
            ReportCommand::CustomerBehaviour(m) => month(ReportKind::CustomerBehaviour, m),
            ReportCommand::Travel(m) => month(ReportKind::Travel, m),
        };
        Ok(ReportRequest {
            kind,
            period,
            mr: common.mr,
            page: common.page,
            csv: common.csv,
        })
    }
}

fn month(kind: ReportKind, m: MonthArgs) -> (ReportKind, ReportPeriod, ReportArgs) {
    (
        kind,
        ReportPeriod::Month {
            month: m.month,
            year: m.year,
        },
        m.common,
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let app = App::load()?;

    match cli.command {
        Command::Login { username, password } => auth::login(&app, &username, password).await?,
        Command::Logout => auth::logout(&app)?,
        Command::Whoami => auth::whoami(&app)?,

        Command::Schedule { date, mr } => schedule::show(&app, date, mr).await?,
        Command::Complete(t) => schedule::transition(&app, &t.activity_id, Action::Complete, t.mr).await?,
        Command::Revert(t) => schedule::transition(&app, &t.activity_id, Action::Revert, t.mr).await?,
        Command::Cancel(t) => schedule::transition(&app, &t.activity_id, Action::Cancel, t.mr).await?,
        Command::Map { date, mr, geojson } => schedule::map(&app, date, mr, geojson.as_deref()).await?,

        Command::Report { command } => reports::run(&app, command.into_request()?).await?,

        Command::Admin { command } => match command {
            AdminCommand::Mrs => schedule::list_roster(&app).await?,
            AdminCommand::GenerateSchedule { yes } => reports::generate_schedule(&app, yes).await?,
        },

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(&app.state)?,
            ConfigCommand::Show => {
                println!("# {}", app.state.config_path().display());
                print!("{}", toml::to_string_pretty(&app.config)?);
            }
        },
    }

    Ok(())
}
