//! Test doubles for the checkout collaborators.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bookline_api::{ApiClient, BookingApi, ClientConfig, MemoryCache};
use bookline_checkout::{
    AnalyticsSink, BookingDraft, CheckoutOrchestrator, GeocodeError, Geocoder,
    NotificationSink, PaymentOutcome, PaymentSheet, UiEvent,
};
use bookline_core::{Coordinate, PaymentMethod, Provider, ServiceOffering};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct FixedGeocoder {
    result: Result<Coordinate, GeocodeError>,
    calls: AtomicUsize,
}

impl FixedGeocoder {
    pub fn found(lat: f64, lng: f64) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Coordinate::new(lat, lng)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Err(GeocodeError::Unavailable("connection refused".into())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Coordinate, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub struct ScriptedSheet {
    outcome: PaymentOutcome,
    secrets: Mutex<Vec<String>>,
}

impl ScriptedSheet {
    pub fn new(outcome: PaymentOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            secrets: Mutex::new(Vec::new()),
        })
    }

    pub fn secrets(&self) -> Vec<String> {
        self.secrets.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentSheet for ScriptedSheet {
    async fn confirm(&self, client_secret: &str) -> PaymentOutcome {
        self.secrets.lock().unwrap().push(client_secret.to_string());
        self.outcome.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PaymentSuccess(String, Decimal),
    PaymentFailed(String),
    RefundProcessed(String, Option<Decimal>),
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify_payment_success(&self, booking_id: &str, amount: Decimal) {
        self.sent
            .lock()
            .unwrap()
            .push(Notification::PaymentSuccess(booking_id.to_string(), amount));
    }

    fn notify_payment_failed(&self, booking_id: &str) {
        self.sent
            .lock()
            .unwrap()
            .push(Notification::PaymentFailed(booking_id.to_string()));
    }

    fn notify_refund_processed(&self, booking_id: &str, amount: Option<Decimal>) {
        self.sent
            .lock()
            .unwrap()
            .push(Notification::RefundProcessed(booking_id.to_string(), amount));
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<String>>,
    errors: Mutex<Vec<Vec<(String, String)>>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<Vec<(String, String)>> {
        self.errors.lock().unwrap().clone()
    }

    /// `action` tags of all recorded errors, in order.
    pub fn error_actions(&self) -> Vec<String> {
        self.errors()
            .into_iter()
            .filter_map(|ctx| ctx.into_iter().find(|(k, _)| k == "action").map(|(_, v)| v))
            .collect()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn log_event(&self, name: &str, _params: &[(&str, String)]) {
        self.events.lock().unwrap().push(name.to_string());
    }

    fn record_error(
        &self,
        _error: &(dyn std::error::Error + Send + Sync),
        context: &[(&str, String)],
    ) {
        self.errors.lock().unwrap().push(
            context
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
        );
    }
}

pub struct Harness {
    pub orchestrator: CheckoutOrchestrator,
    pub api: BookingApi,
    pub cache: Arc<MemoryCache>,
    pub geocoder: Arc<FixedGeocoder>,
    pub sheet: Arc<ScriptedSheet>,
    pub notifier: Arc<RecordingNotifier>,
    pub analytics: Arc<RecordingAnalytics>,
    pub ui: UnboundedReceiver<UiEvent>,
}

impl Harness {
    pub fn new(base_url: &str, geocoder: Arc<FixedGeocoder>, outcome: PaymentOutcome) -> Self {
        let cache = Arc::new(MemoryCache::new());
        let client = ApiClient::new(ClientConfig::new(base_url).expect("valid base url"))
            .expect("client construction should not fail");
        let api = BookingApi::new(client, cache.clone());
        let sheet = ScriptedSheet::new(outcome);
        let notifier = Arc::new(RecordingNotifier::default());
        let analytics = Arc::new(RecordingAnalytics::default());
        let (dispatcher, ui) = bookline_checkout::ui_channel();
        let orchestrator =
            CheckoutOrchestrator::new(api.clone(), geocoder.clone(), sheet.clone(), dispatcher)
                .with_notifier(notifier.clone())
                .with_analytics(analytics.clone())
                .with_currency("EUR");
        Self {
            orchestrator,
            api,
            cache,
            geocoder,
            sheet,
            notifier,
            analytics,
            ui,
        }
    }

    /// Every UI event posted so far.
    pub fn ui_events(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.ui.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn provider(mobile: bool, location: Option<Coordinate>) -> Provider {
    Provider {
        id: "prov-1".into(),
        name: "Atelier Nova".into(),
        offers_mobile_service: mobile,
        location,
        address: None,
        services: Vec::new(),
        rating: None,
    }
}

pub fn draft(provider: &Provider, price: i64, method: PaymentMethod) -> BookingDraft {
    BookingDraft::for_provider(
        provider,
        ServiceOffering {
            id: "svc-1".into(),
            name: "Haircut".into(),
            price: Decimal::from(price),
            duration_minutes: Some(60),
        },
        NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        "12 Rue des Lilas, Paris",
        method,
    )
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}
