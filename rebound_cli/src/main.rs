use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use rebound_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rebound")]
#[command(about = "Booking and equipment allocation for rebounding sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the store with demo members, schedules and equipment
    Seed,

    /// List upcoming occurrences of a schedule with availability
    Upcoming {
        /// Schedule id
        #[arg(long)]
        schedule: String,

        /// Number of occurrences to show
        #[arg(long, default_value_t = 4)]
        count: usize,
    },

    /// Book a member onto an occurrence
    Book {
        /// Member email
        #[arg(long)]
        member: String,

        /// Schedule id
        #[arg(long)]
        schedule: String,

        /// Occurrence date-time (RFC 3339); defaults to the next occurrence
        #[arg(long)]
        occurrence: Option<String>,
    },

    /// Cancel one of a member's future bookings
    Cancel {
        /// Member email
        #[arg(long)]
        member: String,

        /// Booking id
        #[arg(long)]
        booking: Uuid,
    },

    /// Show a member's session cards
    Cards {
        /// Member email
        #[arg(long)]
        member: String,
    },

    /// Charge past attended bookings against session cards
    Charge {
        /// Report what would be charged without touching any card
        #[arg(long)]
        dry_run: bool,
    },

    /// Export the attendance roster for an occurrence as CSV
    Roster {
        /// Schedule id
        #[arg(long)]
        schedule: String,

        /// Occurrence date-time (RFC 3339); defaults to the next occurrence
        #[arg(long)]
        occurrence: Option<String>,

        /// Output CSV path
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    rebound_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store_path = data_dir.join("store.json");

    match cli.command {
        Commands::Seed => cmd_seed(&store_path, &config),
        Commands::Upcoming { schedule, count } => cmd_upcoming(&store_path, &schedule, count),
        Commands::Book {
            member,
            schedule,
            occurrence,
        } => cmd_book(&store_path, &member, &schedule, occurrence.as_deref()),
        Commands::Cancel { member, booking } => cmd_cancel(&store_path, &member, booking),
        Commands::Cards { member } => cmd_cards(&store_path, &member),
        Commands::Charge { dry_run } => cmd_charge(&store_path, dry_run),
        Commands::Roster {
            schedule,
            occurrence,
            out,
        } => cmd_roster(&store_path, &schedule, occurrence.as_deref(), &out),
    }
}

/// Load the catalog after running its consistency checks
fn checked_catalog() -> Result<&'static Catalog> {
    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn parse_occurrence(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Config(format!("Invalid occurrence '{}': {}", raw, e)))
}

/// The explicit occurrence if given, otherwise the next one from today
fn resolve_occurrence(
    schedule: &ScheduleDefinition,
    raw: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => parse_occurrence(raw),
        None => next_occurrence(schedule, now.date_naive())
            .ok_or_else(|| Error::NotFound(format!("upcoming occurrence of '{}'", schedule.id))),
    }
}

fn cmd_seed(store_path: &PathBuf, config: &Config) -> Result<()> {
    let now = Utc::now();
    let mut store = MemoryStore::load(store_path)?;

    let schedule = ScheduleDefinition {
        id: "mon-1900".into(),
        title: "Jump Session".into(),
        description: "Weekly group rebounding session".into(),
        weekday: 0,
        start_time: chrono::NaiveTime::from_hms_opt(19, 0, 0)
            .ok_or_else(|| Error::Config("invalid seed time".into()))?,
        duration_minutes: 60,
        location: config.studio.location.clone(),
        max_capacity: Some(config.booking.default_capacity),
        opens_days_before: config.booking.opens_days_before,
        closes_hours_before: config.booking.closes_hours_before,
        start_date: now.date_naive() - Duration::days(365),
        end_date: None,
        active: true,
    };

    store.insert_member(Member {
        email: "jan@example.com".into(),
        first_name: "Jan".into(),
        last_name: "Peeters".into(),
        phone: "+32 470 00 00 01".into(),
        shoe_size: Some("44".into()),
        weight_kg: Some(90.0),
        override_category: None,
    });
    store.insert_member(Member {
        email: "an@example.com".into(),
        first_name: "An".into(),
        last_name: "Vermeulen".into(),
        phone: "+32 470 00 00 02".into(),
        shoe_size: Some("38".into()),
        weight_kg: Some(62.0),
        override_category: None,
    });

    let catalog = checked_catalog()?;
    for category in catalog.active_categories() {
        for i in 0..3 {
            store.equipment.push(EquipmentItem {
                id: format!("{}-{}", category.name.to_lowercase().replace(' ', "-"), i),
                name: format!("{} boots #{}", category.name, i),
                category: Some(category.name.clone()),
                status: EquipmentStatus::Available,
                purchase_date: Some(now.date_naive() - Duration::days(200)),
                last_maintenance: None,
                notes: String::new(),
            });
        }
    }

    let card = SessionCard {
        id: Uuid::new_v4(),
        member_email: "jan@example.com".into(),
        card_type: "10 Sessions".into(),
        trial: false,
        total_sessions: 10,
        sessions_used: 2,
        purchased_date: now.date_naive() - Duration::days(60),
        expiry_date: None,
        status: CardStatus::Active,
        notes: String::new(),
    };
    let card_id = card.id;
    store.insert_card(card);

    // One attended session last week, not yet charged, so a charge sweep
    // has something to pick up
    let last_week = next_occurrence(&schedule, now.date_naive())
        .ok_or_else(|| Error::NotFound("upcoming occurrence".into()))?
        - Duration::days(7);
    store.insert_booking(Booking {
        id: Uuid::new_v4(),
        schedule_id: schedule.id.clone(),
        title: schedule.title.clone(),
        occurrence: last_week,
        member_email: "jan@example.com".into(),
        category: Some("L HD".into()),
        location: schedule.location.clone(),
        card_id: Some(card_id),
        card_charged: false,
        was_present: true,
        booked_at: last_week - Duration::days(3),
    })?;

    store.insert_schedule(schedule);
    store.save(store_path)?;

    println!("✓ Seeded demo data");
    println!("  Members: jan@example.com, an@example.com");
    println!("  Schedule: mon-1900 (Jump Session, Mondays 19:00)");
    println!("  Equipment: 3 items per category");
    Ok(())
}

fn cmd_upcoming(store_path: &PathBuf, schedule_id: &str, count: usize) -> Result<()> {
    let store = MemoryStore::load(store_path)?;
    let catalog = checked_catalog()?;
    let schedule = store
        .schedule(schedule_id)
        .ok_or_else(|| Error::NotFound(format!("schedule {}", schedule_id)))?;

    let now = Utc::now();
    let occurrences = upcoming_occurrences(schedule, now.date_naive(), count);
    if occurrences.is_empty() {
        println!("No upcoming occurrences for '{}'", schedule.title);
        return Ok(());
    }

    println!("{} at {}", schedule.title, schedule.location);
    for occurrence in occurrences {
        let total = aggregate_availability(&store, catalog, schedule, occurrence);
        let state = match window_state(schedule, occurrence, now) {
            WindowState::Open => "open",
            WindowState::NotYetOpen => "not open yet",
            WindowState::Closed => "closed",
        };
        println!("\n  {} ({} spots, booking {})", occurrence, total, state);
        for (category, free) in availability_breakdown(&store, catalog, schedule, occurrence) {
            println!("    {:12} {}", category, free);
        }
    }
    Ok(())
}

fn cmd_book(
    store_path: &PathBuf,
    member: &str,
    schedule_id: &str,
    occurrence: Option<&str>,
) -> Result<()> {
    let catalog = checked_catalog()?;
    let now = Utc::now();

    let mut booked = None;
    MemoryStore::update(store_path, |store| {
        let schedule = store
            .schedule(schedule_id)
            .ok_or_else(|| Error::NotFound(format!("schedule {}", schedule_id)))?;
        let occurrence = resolve_occurrence(schedule, occurrence, now)?;

        let request = BookingRequest {
            member_email: member.to_string(),
            schedule_id: schedule_id.to_string(),
            occurrence,
        };
        booked = Some(book_session(store, catalog, &request, now)?);
        Ok(())
    })?;

    if let Some(booking) = booked {
        println!("✓ Booked {} for {}", booking.title, booking.member_email);
        println!("  When:     {}", booking.occurrence);
        println!("  Where:    {}", booking.location);
        println!(
            "  Category: {}",
            booking.category.as_deref().unwrap_or("unassigned")
        );
        match booking.card_id {
            Some(card_id) => println!("  Card:     {} (charged after the session)", card_id),
            None => println!("  Card:     none on file"),
        }
        println!("  Booking:  {}", booking.id);
    }
    Ok(())
}

fn cmd_cancel(store_path: &PathBuf, member: &str, booking_id: Uuid) -> Result<()> {
    let now = Utc::now();
    let mut cancelled = None;
    MemoryStore::update(store_path, |store| {
        cancelled = Some(cancel_booking(store, member, booking_id, now)?);
        Ok(())
    })?;

    if let Some(booking) = cancelled {
        println!("✓ Cancelled booking for {}", booking.occurrence);
        if booking.card_charged {
            println!("  Session returned to card");
        }
    }
    Ok(())
}

fn cmd_cards(store_path: &PathBuf, member: &str) -> Result<()> {
    let store = MemoryStore::load(store_path)?;
    let cards: Vec<&SessionCard> = store
        .cards
        .iter()
        .filter(|c| c.member_email.eq_ignore_ascii_case(member))
        .collect();

    if cards.is_empty() {
        println!("No cards for {}", member);
        return Ok(());
    }

    for card in cards {
        println!(
            "{}  {}  {}/{} used ({:?})",
            card.id,
            card.card_type,
            card.sessions_used,
            card.total_sessions,
            card.status
        );
    }
    Ok(())
}

fn cmd_charge(store_path: &PathBuf, dry_run: bool) -> Result<()> {
    let now = Utc::now();
    let mut report = ChargeReport::default();

    if dry_run {
        let mut store = MemoryStore::load(store_path)?;
        report = charge_past_sessions(&mut store, now, true);
        // Not saved: a dry run must leave the store untouched
    } else {
        MemoryStore::update(store_path, |store| {
            report = charge_past_sessions(store, now, false);
            Ok(())
        })?;
    }

    let label = if dry_run { "would charge" } else { "charged" };
    println!("✓ {} {} booking(s)", label, report.charged.len());
    for id in &report.charged {
        println!("  {}", id);
    }
    if !report.skipped.is_empty() {
        println!("  Skipped {}:", report.skipped.len());
        for (id, reason) in &report.skipped {
            println!("    {} ({})", id, reason);
        }
    }
    Ok(())
}

fn cmd_roster(
    store_path: &PathBuf,
    schedule_id: &str,
    occurrence: Option<&str>,
    out: &PathBuf,
) -> Result<()> {
    let store = MemoryStore::load(store_path)?;
    let schedule = store
        .schedule(schedule_id)
        .ok_or_else(|| Error::NotFound(format!("schedule {}", schedule_id)))?;
    let occurrence = resolve_occurrence(schedule, occurrence, Utc::now())?;

    let count = write_roster(&store, occurrence, &schedule.title, out)?;
    println!("✓ Wrote roster for {} ({} attendees)", occurrence, count);
    println!("  CSV: {}", out.display());
    Ok(())
}
