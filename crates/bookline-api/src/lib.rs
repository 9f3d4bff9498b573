//! Typed HTTP client for the bookline backend.
//!
//! - [`endpoint`] maps symbolic operations to a verb and path template.
//! - [`client::ApiClient`] executes requests, merges headers, logs traffic,
//!   and classifies every outcome into [`ApiError`].
//! - [`cache`] and [`fallback`] implement the "network first, cache second"
//!   policy used by every collection load.
//! - [`booking_api::BookingApi`] is the typed surface the checkout consumes.

pub mod booking_api;
pub mod cache;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod fallback;
mod log;
pub mod request;

pub use booking_api::{
    BookingApi, CreateBookingRequest, CreateBookingResponse, PaymentIntentRequest,
    PaymentIntentResponse, RefundRequest, RefundResponse,
};
pub use cache::{CacheStore, JsonFileCache, MemoryCache, ResourceKind};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use endpoint::{Endpoint, TimeoutClass};
pub use error::{classify, ApiError, CacheError, TransportFailure};
pub use fallback::{load_with_fallback, DataOrigin, Loaded, OFFLINE_NOTICE};
pub use request::{ApiRequest, QueryValue};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
