//! `booking` CLI: query table availability and place reservations against a
//! booking API from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Which tables are free on 10 Feb at 19:00 for an hour and a half?
//! booking availability --date 2024-02-10 --hour 19:00 --duration 1.5 --tables 1,2,3
//!
//! # Dump the occupancy index for one date
//! booking occupancy --date 2024-02-10
//!
//! # Reserve table 3
//! booking reserve --date 2024-02-10 --hour 19:00 --table 3 --people 2 \
//!     --phone 555-0100 --address "Main Street 1" --option water
//!
//! # Point at another API and read settings from a file
//! booking --config booking.toml --base-url http://localhost:3131 occupancy --date 2024-02-10
//! ```
//!
//! Log output goes to stderr and is controlled with `RUST_LOG`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use booking_engine::slot::duration_slots_from_hours;
use booking_engine::{
    AvailabilityLoader, AvailabilityStore, BookingBackend, BookingConfig, BookingParams,
    ConflictSpan, ContactDetails, DateWindow, HttpBackend, ReservationSubmitter, ResourceId,
    SelectionController, Slot,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "booking",
    version,
    about = "Table availability and reservations for a booking API"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (defaults are used for missing keys)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the booking API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which tables are free for a date, start time and duration
    Availability {
        #[arg(long)]
        date: NaiveDate,
        /// Start time, e.g. 19:00 or 19:30
        #[arg(long)]
        hour: Slot,
        /// Duration in hours, in half-hour steps
        #[arg(long, default_value_t = 1.0)]
        duration: f64,
        /// Comma-separated table identifiers to check
        #[arg(long, value_delimiter = ',', required = true)]
        tables: Vec<String>,
        /// Check every slot of the duration instead of only the start slot
        #[arg(long)]
        full_duration: bool,
    },
    /// Print the occupied tables of every slot on a date
    Occupancy {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Reserve a table
    Reserve {
        #[arg(long)]
        date: NaiveDate,
        /// Start time, e.g. 19:00 or 19:30
        #[arg(long)]
        hour: Slot,
        #[arg(long)]
        table: String,
        /// Duration in hours, in half-hour steps
        #[arg(long, default_value_t = 1.0)]
        duration: f64,
        #[arg(long, default_value_t = 2)]
        people: u8,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
        /// Extra to add to the order; repeat for several
        #[arg(long = "option")]
        options: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => BookingConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => BookingConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
        config.validate().context("Invalid --base-url")?;
    }

    match cli.command {
        Commands::Availability {
            date,
            hour,
            duration,
            tables,
            full_duration,
        } => {
            if full_duration {
                config.conflict_span = ConflictSpan::FullDuration;
            }
            let tables = parse_tables(&tables)?;
            let duration_slots = parse_duration(duration)?;
            let session = Session::load(config, date).await?;
            let controller = session.controller(BookingParams {
                date,
                slot: hour,
                duration_slots,
                people: session.config.min_people,
            });

            println!("{} {} for {}h", date, hour, duration);
            for (table, free) in controller.availability(&tables) {
                let state = if free { "free" } else { "occupied" };
                println!("table {}: {}", table, state);
            }
        }
        Commands::Occupancy { date } => {
            let session = Session::load(config, date).await?;
            let index = session.store.current();
            let mut any = false;
            for (slot, occupants) in index.slots_on(date) {
                let tables: Vec<String> = occupants.iter().map(ToString::to_string).collect();
                println!("{}  {}", slot, tables.join(", "));
                any = true;
            }
            if !any {
                println!("{}: no occupied slots", date);
            }
        }
        Commands::Reserve {
            date,
            hour,
            table,
            duration,
            people,
            phone,
            address,
            options,
        } => {
            let table: ResourceId = table.parse().context("Invalid --table")?;
            let duration_slots = parse_duration(duration)?;
            let session = Session::load(config, date).await?;
            let mut controller = session.controller(BookingParams {
                date,
                slot: hour,
                duration_slots,
                people,
            });
            controller.pick(table).context("Table cannot be selected")?;

            let contact = ContactDetails {
                address,
                phone,
                selected_options: options,
            };
            let record = session
                .submitter()
                .submit(&mut controller, &contact)
                .await
                .context("Reservation failed")?;
            println!(
                "Reserved table {} on {} from {} to {}",
                record.resource,
                record.date,
                record.start,
                record.end()
            );
        }
    }

    Ok(())
}

/// A loaded index for one date plus the pieces needed to act on it.
struct Session {
    config: BookingConfig,
    backend: Arc<dyn BookingBackend>,
    store: Arc<AvailabilityStore>,
}

impl Session {
    async fn load(config: BookingConfig, date: NaiveDate) -> Result<Self> {
        let backend: Arc<dyn BookingBackend> =
            Arc::new(HttpBackend::new(&config).context("Failed to build HTTP client")?);
        let store = Arc::new(AvailabilityStore::new(config.event_capacity));
        let loader =
            AvailabilityLoader::new(Arc::clone(&backend), Arc::clone(&store), config.clone());

        let window = DateWindow::new(date, date)?;
        let outcome = loader
            .load(window)
            .await
            .context("Failed to load availability")?;
        if !outcome.is_published() {
            bail!("Availability load was superseded");
        }

        Ok(Session {
            config,
            backend,
            store,
        })
    }

    fn controller(&self, params: BookingParams) -> SelectionController {
        SelectionController::new(Arc::clone(&self.store), &self.config, params)
    }

    fn submitter(&self) -> ReservationSubmitter {
        ReservationSubmitter::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.store),
            self.config.clone(),
        )
    }
}

fn parse_duration(hours: f64) -> Result<u16> {
    match duration_slots_from_hours(hours) {
        Some(slots) => Ok(slots),
        None => bail!(
            "Invalid duration: {} (expected a positive multiple of 0.5 hours)",
            hours
        ),
    }
}

fn parse_tables(raw: &[String]) -> Result<Vec<ResourceId>> {
    raw.iter()
        .map(|table| {
            table
                .parse()
                .with_context(|| format!("Invalid table: '{}'", table))
        })
        .collect()
}
