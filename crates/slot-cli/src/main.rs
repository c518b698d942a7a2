//! `slots` CLI: manage event types and availability, list free slots and
//! book meetings against a JSON data file.
//!
//! ## Usage
//!
//! ```sh
//! # Fill a fresh data file with demo event types and meetings
//! slots --data ./slots.json seed
//!
//! # Free slots of an event type on a date, rendered in a timezone
//! slots slots 30min-meeting --date 2026-03-16 --timezone America/New_York
//!
//! # Book one of them
//! slots book 1 --name "Ada Lovelace" --email ada@example.com --at 2026-03-16T13:00:00Z
//!
//! # Ask whether a start instant would be accepted, and why not
//! slots check 1 --at 2026-03-16T13:15:00Z
//!
//! # Upcoming meetings
//! slots meetings --upcoming
//! ```
//!
//! Every command prints JSON on stdout. Logs go to stderr and follow
//! `RUST_LOG`.

mod config;
mod datafile;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use slot_engine::catalog;
use slot_engine::seed::seed_demo;
use slot_engine::time::{parse_instant, parse_time_of_day};
use slot_engine::{
    AvailabilityRuleUpdate, BookingService, EventTypeUpdate, MeetingFilter, MeetingStatus,
    MemoryStore, NewAvailabilityRule, NewBooking, NewEventType, SchedulingStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::datafile::{load_store, save_store, DataLock};

#[derive(Parser)]
#[command(name = "slots", version, about = "Meeting slot scheduling CLI")]
struct Cli {
    /// Data file holding event types, rules and meetings
    /// (default: $SLOTS_DATA_PATH or ./slots.json)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the data file with demo event types, rules and meetings
    Seed,
    /// Manage event types
    EventTypes {
        #[command(subcommand)]
        command: EventTypeCommand,
    },
    /// Manage weekly availability rules
    Rules {
        #[command(subcommand)]
        command: RuleCommand,
    },
    /// List free slots of an event type on a date
    Slots {
        /// Event type slug
        slug: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// IANA timezone used to render the slots
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },
    /// Book a meeting
    Book {
        event_type_id: u64,
        /// Invitee name
        #[arg(long)]
        name: String,
        /// Invitee email
        #[arg(long)]
        email: String,
        /// Start instant (RFC 3339; no offset means UTC)
        #[arg(long, value_parser = parse_at)]
        at: DateTime<Utc>,
    },
    /// Cancel a scheduled meeting
    Cancel { meeting_id: u64 },
    /// List meetings, newest first (upcoming ones soonest first)
    Meetings {
        /// Only meetings with this status (scheduled, cancelled, completed)
        #[arg(long)]
        status: Option<MeetingStatus>,
        /// Only Scheduled meetings that have not started yet
        #[arg(long, conflicts_with = "past")]
        upcoming: bool,
        /// Only meetings whose start has passed
        #[arg(long)]
        past: bool,
    },
    /// Check whether a start instant can be booked
    Check {
        event_type_id: u64,
        /// Start instant (RFC 3339; no offset means UTC)
        #[arg(long, value_parser = parse_at)]
        at: DateTime<Utc>,
        /// Requested length in minutes (defaults to the event type's duration)
        #[arg(long)]
        duration: Option<u32>,
    },
}

impl Commands {
    /// Whether the command changes the data file.
    fn writes_data(&self) -> bool {
        match self {
            Commands::Seed | Commands::Book { .. } | Commands::Cancel { .. } => true,
            Commands::EventTypes { command } => !matches!(
                command,
                EventTypeCommand::List | EventTypeCommand::Show { .. }
            ),
            Commands::Rules { command } => !matches!(command, RuleCommand::List { .. }),
            Commands::Slots { .. } | Commands::Meetings { .. } | Commands::Check { .. } => false,
        }
    }
}

#[derive(Subcommand)]
enum EventTypeCommand {
    /// List all event types
    List,
    /// Show an event type and its rules, by id or slug
    Show { key: String },
    /// Create an event type
    Create {
        #[arg(long)]
        name: String,
        /// Slot length in minutes
        #[arg(long)]
        duration: u32,
        #[arg(long)]
        slug: String,
    },
    /// Update fields of an event type
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        slug: Option<String>,
    },
    /// Delete an event type with its rules and meetings
    Delete { id: u64 },
}

#[derive(Subcommand)]
enum RuleCommand {
    /// List the rules of an event type
    List { event_type_id: u64 },
    /// Add a weekly window to an event type
    Add {
        event_type_id: u64,
        /// Day of week, 0 = Monday .. 6 = Sunday
        #[arg(long)]
        day: u8,
        /// Window start as HH:MM
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// Window end as HH:MM
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// IANA timezone the window is read in
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },
    /// Update fields of a rule
    Update {
        rule_id: u64,
        #[arg(long)]
        day: Option<u8>,
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Delete one rule
    Delete { rule_id: u64 },
    /// Delete every rule of an event type
    Clear { event_type_id: u64 },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,slot_engine=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?.with_data_path(cli.data);
    run(cli.command, &config)
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let path = config.data_path.as_path();
    // Held until the command returns, covering load through save.
    let _lock = if command.writes_data() {
        Some(DataLock::acquire(path)?)
    } else {
        None
    };

    // Seeding replaces whatever the data file held.
    let store = match command {
        Commands::Seed => MemoryStore::new(),
        _ => load_store(path)?,
    };
    let service = BookingService::with_options(Arc::new(store), config.options);
    let store = service.store();
    let now = Utc::now();

    match command {
        Commands::Seed => {
            let event_types = seed_demo(store, now).context("Failed to seed demo data")?;
            save_store(path, store)?;
            print_json(&event_types)
        }
        Commands::EventTypes { command } => match command {
            EventTypeCommand::List => print_json(&store.list_event_types()?),
            EventTypeCommand::Show { key } => {
                let event_type = match key.parse::<u64>() {
                    Ok(id) => catalog::get_event_type(store, id)?,
                    Err(_) => catalog::get_event_type_by_slug(store, &key)?,
                };
                let rules = catalog::list_rules(store, event_type.id)?;
                print_json(&json!({
                    "event_type": event_type,
                    "availability_rules": rules,
                }))
            }
            EventTypeCommand::Create {
                name,
                duration,
                slug,
            } => {
                let created =
                    catalog::create_event_type(store, NewEventType::new(name, duration, slug))?;
                save_store(path, store)?;
                print_json(&created)
            }
            EventTypeCommand::Update {
                id,
                name,
                duration,
                slug,
            } => {
                let update = EventTypeUpdate {
                    name,
                    duration_minutes: duration,
                    slug,
                };
                let updated = catalog::update_event_type(store, id, update)?;
                save_store(path, store)?;
                print_json(&updated)
            }
            EventTypeCommand::Delete { id } => {
                service.delete_event_type(id)?;
                save_store(path, store)?;
                print_json(&json!({ "deleted": id }))
            }
        },
        Commands::Rules { command } => match command {
            RuleCommand::List { event_type_id } => {
                print_json(&catalog::list_rules(store, event_type_id)?)
            }
            RuleCommand::Add {
                event_type_id,
                day,
                start,
                end,
                timezone,
            } => {
                let rule = NewAvailabilityRule::new(event_type_id, day, start, end)
                    .in_timezone(timezone);
                let created = catalog::create_rule(store, rule)?;
                save_store(path, store)?;
                print_json(&created)
            }
            RuleCommand::Update {
                rule_id,
                day,
                start,
                end,
                timezone,
            } => {
                let update = AvailabilityRuleUpdate {
                    day_of_week: day,
                    start_time: start,
                    end_time: end,
                    timezone,
                };
                let updated = catalog::update_rule(store, rule_id, update)?;
                save_store(path, store)?;
                print_json(&updated)
            }
            RuleCommand::Delete { rule_id } => {
                catalog::delete_rule(store, rule_id)?;
                save_store(path, store)?;
                print_json(&json!({ "deleted": rule_id }))
            }
            RuleCommand::Clear { event_type_id } => {
                let deleted = catalog::clear_rules(store, event_type_id)?;
                save_store(path, store)?;
                print_json(&json!({ "deleted": deleted }))
            }
        },
        Commands::Slots {
            slug,
            date,
            timezone,
        } => print_json(&service.available_slots(&slug, date, &timezone)?),
        Commands::Book {
            event_type_id,
            name,
            email,
            at,
        } => {
            let meeting = service.book(NewBooking {
                event_type_id,
                invitee_name: name,
                invitee_email: email,
                scheduled_at: at,
            })?;
            save_store(path, store)?;
            print_json(&meeting)
        }
        Commands::Cancel { meeting_id } => {
            let meeting = service.cancel(meeting_id)?;
            save_store(path, store)?;
            print_json(&meeting)
        }
        Commands::Meetings {
            status,
            upcoming,
            past,
        } => {
            let filter = MeetingFilter {
                status,
                upcoming_only: upcoming,
                past_only: past,
            };
            print_json(&service.list_meetings(filter, now)?)
        }
        Commands::Check {
            event_type_id,
            at,
            duration,
        } => {
            let duration = match duration {
                Some(minutes) => minutes,
                None => catalog::get_event_type(store, event_type_id)?.duration_minutes,
            };
            print_json(&service.check(event_type_id, at, duration)?)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", pretty);
    Ok(())
}

fn parse_at(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_instant(s).map_err(|e| e.to_string())
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    parse_time_of_day(s).ok_or_else(|| format!("Invalid time: '{}'. Expected HH:MM", s))
}
