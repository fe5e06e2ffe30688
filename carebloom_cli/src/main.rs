use carebloom_core::cache::{cache_dir, cache_key};
use carebloom_core::schedule::{resolve_date, sort_by_start_time};
use carebloom_core::*;
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "carebloom")]
#[command(about = "Daily care calendar for memory-care patients", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Patient whose calendar to open (defaults to calendar.default_patient)
    #[arg(long, global = true)]
    patient: Option<String>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Work from the local cache only, never contact the backend
    #[arg(long, global = true)]
    offline: bool,

    /// Override the backend base URL
    #[arg(long, global = true)]
    remote_url: Option<String>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the schedule for a day (default)
    Today {
        /// Day to show: YYYY-MM-DD, today, yesterday or tomorrow
        #[arg(long)]
        date: Option<String>,

        /// List events by start time instead of stored order
        #[arg(long)]
        sorted: bool,
    },

    /// List events that are overdue right now
    Overdue,

    /// Add an event
    Add {
        #[arg(long)]
        title: String,

        /// Start time, HH:MM
        #[arg(long)]
        start: String,

        /// End time, HH:MM
        #[arg(long)]
        end: String,

        #[arg(long, default_value = "")]
        description: String,

        /// medication, appointment, activity or reminder
        #[arg(long = "type", default_value = "activity")]
        kind: String,

        /// low, medium, high or urgent
        #[arg(long, default_value = "medium")]
        priority: String,

        #[arg(long)]
        date: Option<String>,
    },

    /// Mark an event complete, or incomplete again
    Toggle {
        id: String,

        #[arg(long)]
        date: Option<String>,
    },

    /// Attach caregiver notes to an event (empty text clears them)
    Note {
        id: String,

        text: String,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete an event
    Delete {
        id: String,

        #[arg(long)]
        date: Option<String>,
    },

    /// Discard stored events and rebuild the daily routine
    Reset {
        #[arg(long)]
        date: Option<String>,
    },

    /// Export all of the patient's events to CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

type CliStore = EventStore<Box<dyn RemoteStore>, FileStore, ConfiguredTemplates>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        carebloom_core::logging::init_with_level("debug");
    } else {
        carebloom_core::logging::init();
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let patient = PatientId::new(
        cli.patient
            .clone()
            .unwrap_or_else(|| config.calendar.default_patient.clone()),
    );

    let store = EventStore::new(
        build_remote(&cli, &config)?,
        FileStore::new(cache_dir(&data_dir)),
        config.template_provider()?,
    );
    // Held for the whole command: load, modify and save run as one unit per patient
    let _lock = store.cache().store().lock(&cache_key(&patient))?;

    let now = Local::now().naive_local();
    let today = now.date();

    match cli.command {
        Some(Commands::Today { date, sorted }) => {
            cmd_today(&store, patient, pick_date(date, today)?, now, sorted)
        }
        Some(Commands::Overdue) => cmd_overdue(&store, patient, now),
        Some(Commands::Add {
            title,
            start,
            end,
            description,
            kind,
            priority,
            date,
        }) => {
            let draft = EventDraft {
                title,
                description,
                kind: kind.parse()?,
                start_time: start.parse()?,
                end_time: end.parse()?,
                priority: priority.parse()?,
            };
            cmd_add(&store, patient, pick_date(date, today)?, draft)
        }
        Some(Commands::Toggle { id, date }) => {
            cmd_toggle(&store, patient, pick_date(date, today)?, id.parse()?)
        }
        Some(Commands::Note { id, text, date }) => {
            cmd_note(&store, patient, pick_date(date, today)?, id.parse()?, &text)
        }
        Some(Commands::Delete { id, date }) => {
            cmd_delete(&store, patient, pick_date(date, today)?, id.parse()?)
        }
        Some(Commands::Reset { date }) => cmd_reset(&store, patient, pick_date(date, today)?),
        Some(Commands::Export { out }) => cmd_export(&store, patient, today, out),
        None => {
            // Default to "today" command
            cmd_today(&store, patient, today, now, false)
        }
    }
}

fn build_remote(cli: &Cli, config: &Config) -> Result<Box<dyn RemoteStore>> {
    if cli.offline || !config.remote.enabled {
        tracing::debug!("Remote sync disabled, using local cache only");
        return Ok(Box::new(OfflineRemote));
    }

    let base_url = cli
        .remote_url
        .clone()
        .unwrap_or_else(|| config.remote.base_url().to_string());
    tracing::debug!("Using remote calendar store at {}", base_url);
    Ok(Box::new(HttpRemote::new(&base_url, config.remote.timeout_secs)?))
}

fn pick_date(arg: Option<String>, today: NaiveDate) -> Result<NaiveDate> {
    match arg {
        Some(raw) => resolve_date(&raw, today),
        None => Ok(today),
    }
}

fn cmd_today(
    store: &CliStore,
    patient: PatientId,
    date: NaiveDate,
    now: NaiveDateTime,
    sorted: bool,
) -> Result<()> {
    let session = CalendarSession::open(store, patient, date)?;

    println!();
    println!("  {} - patient {}", date.format("%A, %B %-d, %Y"), session.patient());

    let mut events = session.today_events();
    if sorted {
        sort_by_start_time(&mut events);
    }
    println!("  {} events scheduled", events.len());
    println!();

    if events.is_empty() {
        println!("  No events scheduled for this day.");
    }
    for event in &events {
        print_event(event);
    }

    let overdue = session.overdue_events(now);
    if !overdue.is_empty() {
        println!();
        println!("  ! {} overdue", overdue.len());
        for event in &overdue {
            println!("    {} {} {} ({})", event.date, event.start_time, event.title, event.id);
        }
    }
    println!();
    Ok(())
}

fn cmd_overdue(store: &CliStore, patient: PatientId, now: NaiveDateTime) -> Result<()> {
    let session = CalendarSession::open(store, patient, now.date())?;
    let overdue = session.overdue_events(now);

    if overdue.is_empty() {
        println!("No overdue events.");
        return Ok(());
    }

    println!("Overdue events:");
    for event in overdue {
        println!(
            "  {} {} {} [{}] ({})",
            event.date,
            event.start_time,
            event.title,
            event.priority.as_str(),
            event.id
        );
    }
    Ok(())
}

fn cmd_add(store: &CliStore, patient: PatientId, date: NaiveDate, draft: EventDraft) -> Result<()> {
    let mut session = CalendarSession::open(store, patient, date)?;
    let created = session.add_event(draft)?;

    println!("✓ Added {} on {} at {}", created.title, created.date, created.start_time);
    println!("  id: {}", created.id);
    Ok(())
}

fn cmd_toggle(store: &CliStore, patient: PatientId, date: NaiveDate, id: EventId) -> Result<()> {
    let mut session = CalendarSession::open(store, patient, date)?;
    if session.find(&id).is_none() {
        println!("No event with id {} - nothing changed.", id);
        return Ok(());
    }

    session.toggle(&id)?;
    if let Some(event) = session.find(&id) {
        let state = if event.completed { "complete" } else { "not complete" };
        println!("✓ {} marked {}", event.title, state);
    }
    Ok(())
}

fn cmd_note(
    store: &CliStore,
    patient: PatientId,
    date: NaiveDate,
    id: EventId,
    text: &str,
) -> Result<()> {
    let mut session = CalendarSession::open(store, patient, date)?;
    if session.find(&id).is_none() {
        println!("No event with id {} - nothing changed.", id);
        return Ok(());
    }

    session.set_notes(&id, text)?;
    match session.find(&id).and_then(|e| e.caregiver_notes.as_deref()) {
        Some(notes) => println!("✓ Notes saved: {}", notes),
        None => println!("✓ Notes cleared"),
    }
    Ok(())
}

fn cmd_delete(store: &CliStore, patient: PatientId, date: NaiveDate, id: EventId) -> Result<()> {
    let mut session = CalendarSession::open(store, patient, date)?;
    let Some(title) = session.find(&id).map(|e| e.title.clone()) else {
        println!("No event with id {} - nothing changed.", id);
        return Ok(());
    };

    session.delete(&id)?;
    println!("✓ Deleted {}", title);
    Ok(())
}

fn cmd_reset(store: &CliStore, patient: PatientId, date: NaiveDate) -> Result<()> {
    let mut session = CalendarSession::open(store, patient, date)?;
    session.reset()?;
    println!(
        "✓ Reset events for patient {}: {} routine events on {}",
        session.patient(),
        session.events().len(),
        date
    );
    Ok(())
}

fn cmd_export(store: &CliStore, patient: PatientId, today: NaiveDate, out: PathBuf) -> Result<()> {
    let session = CalendarSession::open(store, patient, today)?;
    let count = export_events_csv(session.events(), &out)?;

    println!("✓ Exported {} events", count);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn print_event(event: &CareEvent) {
    let mark = if event.completed { "[x]" } else { "[ ]" };
    println!(
        "  {} {}-{}  {} ({}, {})",
        mark,
        event.start_time,
        event.end_time,
        event.title,
        event.kind.as_str(),
        event.priority.as_str()
    );
    if !event.description.is_empty() {
        println!("        {}", event.description);
    }
    if let Some(ref notes) = event.caregiver_notes {
        println!("        Note: {}", notes);
    }
    println!("        id: {}", event.id);
}
