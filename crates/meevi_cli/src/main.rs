//! Operator CLI for a Meevi database.
//!
//! # Responsibility
//! - Verify `meevi_core` linkage (`ping`).
//! - Run the reminder check and print schedules without the app or server.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::info;
use meevi_core::db::migrations::latest_version;
use meevi_core::db::open_db;
use meevi_core::repo::dog_repo::SqliteDogRepository;
use meevi_core::repo::vaccine_repo::SqliteVaccineRepository;
use meevi_core::service::dog_service::DogService;
use meevi_core::service::vaccine_service::VaccineService;
use meevi_core::{ReminderClock, ReminderEvaluator};
use std::error::Error;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "meevi", about = "Meevi dog-care core tools")]
struct Cli {
    /// Database path (falls back to MEEVI_DB_PATH, then ./meevi.sqlite3)
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// Log level written to stderr
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print core ping and version
    Ping,
    /// Open the database, apply migrations and print the schema version
    Migrate,
    /// Run the reminder rules for one owner
    Notify {
        #[arg(long, value_name = "UUID")]
        owner: Uuid,
        /// Evaluate as of this date (YYYY-MM-DD) instead of today
        #[arg(long, value_name = "DATE")]
        today: Option<NaiveDate>,
    },
    /// Print the recommended vaccination schedule for one dog
    Schedule {
        #[arg(long, value_name = "UUID")]
        dog: Uuid,
        #[arg(long, value_name = "DATE")]
        today: Option<NaiveDate>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    meevi_core::init_console_logging(&cli.log_level)?;
    let db_path = resolve_db_path(cli.db);

    match cli.cmd {
        Cmd::Ping => {
            println!("meevi_core ping={}", meevi_core::ping());
            println!("meevi_core version={}", meevi_core::core_version());
        }
        Cmd::Migrate => {
            let conn = open_db(&db_path)?;
            let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            println!(
                "db={} schema_version={version} latest={}",
                db_path.display(),
                latest_version()
            );
        }
        Cmd::Notify { owner, today } => {
            let conn = open_db(&db_path)?;
            let clock = match today {
                Some(date) => ReminderClock::new(date, ReminderClock::system().now_ms),
                None => ReminderClock::system(),
            };
            let report = ReminderEvaluator::try_new(&conn)?.run(owner, clock)?;
            for notification in &report.created {
                println!("[{}] {}", notification.kind.as_str(), notification.message);
            }
            println!(
                "created={} skipped_duplicates={}",
                report.created.len(),
                report.skipped_duplicates
            );
        }
        Cmd::Schedule { dog, today } => {
            let conn = open_db(&db_path)?;
            let dog = DogService::new(SqliteDogRepository::try_new(&conn)?).get_dog(dog)?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let schedule = VaccineService::new(SqliteVaccineRepository::try_new(&conn)?)
                .schedule_for(&dog, today)?;
            for item in &schedule.items {
                let due = item
                    .due_date
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<18} {:>3} mo  due {:<10}  {:?}",
                    item.name, item.age_months, due, item.status
                );
            }
            println!(
                "completed={} overdue={} upcoming={}",
                schedule.summary.completed, schedule.summary.overdue, schedule.summary.upcoming
            );
        }
    }
    info!("event=cli_done module=cli status=ok");
    Ok(())
}

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| {
        std::env::var("MEEVI_DB_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    })
    .unwrap_or_else(|| PathBuf::from("meevi.sqlite3"))
}
