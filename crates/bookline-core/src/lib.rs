//! Shared configuration, domain types, and pure pricing rules for the
//! bookline client transaction layer.
//!
//! Nothing in this crate performs I/O apart from [`load_app_config`], which
//! reads the process environment.

pub mod amount;
pub mod app_config;
pub mod config;
pub mod error;
pub mod fee;
pub mod geo;
pub mod types;

pub use amount::{amount_due, round_currency, AmountBreakdown, CASH_DEPOSIT_RATE};
pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use fee::{fee_for, is_valid_distance, quote_transport, TransportQuote};
pub use geo::{distance_km, Coordinate};
pub use types::{Booking, BookingStatus, Offer, PaymentMethod, Provider, ServiceOffering};
