mod catalog;
mod checkout;

use std::sync::Arc;

use bookline_api::{ApiClient, BookingApi, ClientConfig, JsonFileCache};
use bookline_core::{AppConfig, PaymentMethod};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bookline")]
#[command(about = "Bookline booking and checkout client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List providers (served from the local cache when offline)
    Providers {
        /// Only providers in this category; repeatable
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// List your bookings (served from the local cache when offline)
    Bookings,
    /// List current offers (served from the local cache when offline)
    Offers,
    /// Show the transport fee for a trip distance
    Fee {
        /// Distance in kilometres
        km: f64,
    },
    /// Book a service and pay for it
    Checkout(CheckoutArgs),
    /// Refund a paid booking
    Refund {
        #[arg(long)]
        booking: String,
        #[arg(long)]
        payment_intent: String,
        /// Partial amount; refunds in full when omitted
        #[arg(long)]
        amount: Option<Decimal>,
    },
}

#[derive(Debug, clap::Args)]
struct CheckoutArgs {
    #[arg(long)]
    provider: String,
    /// Service id; repeat to book several services in one visit
    #[arg(long = "service", required = true)]
    services: Vec<String>,
    /// Appointment date (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,
    /// Start time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    start: NaiveTime,
    /// End time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    end: NaiveTime,
    #[arg(long)]
    address: String,
    #[arg(long)]
    notes: Option<String>,
    /// card or cash (cash pays a deposit now)
    #[arg(long, default_value = "card")]
    method: PaymentMethod,
    /// Trip distance already known, in kilometres
    #[arg(long)]
    distance_km: Option<f64>,
    /// How the terminal payment sheet answers
    #[arg(long, value_enum, default_value_t = SheetMode::Prompt)]
    payment: SheetMode,
}

/// Answer given by the terminal payment sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SheetMode {
    /// Ask on stdin
    Prompt,
    Succeed,
    Fail,
    Cancel,
}

fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM, got {raw:?}: {e}"))
}

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn build_api(config: &AppConfig) -> anyhow::Result<BookingApi> {
    let client = ApiClient::new(ClientConfig::from_app_config(config))?;
    let cache = JsonFileCache::open(&config.cache_dir)?;
    Ok(BookingApi::new(client, Arc::new(cache)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("bookline: run with --help to see available commands");
        return Ok(());
    };

    // Pure computation; usable without backend configuration.
    if let Commands::Fee { km } = command {
        init_tracing("warn")?;
        return catalog::run_fee(km);
    }

    let config = bookline_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    let api = build_api(&config)?;

    match command {
        Commands::Providers { categories } => catalog::run_providers(&api, &categories).await?,
        Commands::Bookings => catalog::run_bookings(&api).await?,
        Commands::Offers => catalog::run_offers(&api).await?,
        Commands::Checkout(args) => checkout::run_checkout(&config, api, args).await?,
        Commands::Refund {
            booking,
            payment_intent,
            amount,
        } => checkout::run_refund(api, &booking, &payment_intent, amount).await?,
        Commands::Fee { .. } => {}
    }

    Ok(())
}
