//! Typed backend operations used by the storefront and the checkout.

use std::sync::Arc;

use bookline_core::{Booking, Coordinate, Offer, PaymentMethod, Provider, ServiceOffering};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheStore, ResourceKind};
use crate::client::ApiClient;
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::fallback::{load_with_fallback, Loaded};
use crate::request::ApiRequest;

/// Payload for `POST bookings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub provider_id: String,
    pub service_id: String,
    pub service_ids: Vec<String>,
    pub date: chrono::NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub service_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_due: Decimal,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deposit_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_distance_km: Option<f64>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub transport_fee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_location: Option<Coordinate>,
}

/// Response of `POST bookings`. The backend may create the payment intent
/// in the same call, in which case `client_secret` is present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub booking: Booking,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// Payload for `POST payments/intent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    pub booking_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// Payload for `POST payments/{id}/refund`. `amount = None` refunds in full.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub payment_intent_id: String,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    #[serde(default)]
    pub refund_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Collections arrive either bare or wrapped in `{"data": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListPayload<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListPayload::Bare(items) | ListPayload::Wrapped { data: items } => items,
        }
    }
}

/// Backend surface over an [`ApiClient`] and a shared [`CacheStore`].
#[derive(Clone)]
pub struct BookingApi {
    client: ApiClient,
    cache: Arc<dyn CacheStore>,
}

impl BookingApi {
    #[must_use]
    pub fn new(client: ApiClient, cache: Arc<dyn CacheStore>) -> Self {
        Self { client, cache }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Providers, optionally filtered by category, with cache fallback.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the network call fails and no providers
    /// are cached.
    pub async fn list_providers(&self, categories: &[String]) -> Result<Loaded<Provider>, ApiError> {
        let mut request = ApiRequest::new(Endpoint::Providers);
        if !categories.is_empty() {
            request = request.query("category", categories.to_vec());
        }
        self.load_collection(ResourceKind::Providers, request).await
    }

    /// The signed-in customer's bookings, with cache fallback.
    ///
    /// # Errors
    ///
    /// See [`BookingApi::list_providers`].
    pub async fn list_bookings(&self) -> Result<Loaded<Booking>, ApiError> {
        self.load_collection(ResourceKind::Bookings, ApiRequest::new(Endpoint::Bookings))
            .await
    }

    /// Current offers, with cache fallback.
    ///
    /// # Errors
    ///
    /// See [`BookingApi::list_providers`].
    pub async fn list_offers(&self) -> Result<Loaded<Offer>, ApiError> {
        self.load_collection(ResourceKind::Offers, ApiRequest::new(Endpoint::Offers))
            .await
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the call.
    pub async fn provider(&self, id: &str) -> Result<Provider, ApiError> {
        self.client
            .call(ApiRequest::new(Endpoint::Provider { id: id.to_string() }))
            .await
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the call.
    pub async fn provider_services(&self, provider_id: &str) -> Result<Vec<ServiceOffering>, ApiError> {
        let payload: ListPayload<ServiceOffering> = self
            .client
            .call(ApiRequest::new(Endpoint::ProviderServices {
                provider_id: provider_id.to_string(),
            }))
            .await?;
        Ok(payload.into_items())
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the call.
    pub async fn booking(&self, id: &str) -> Result<Booking, ApiError> {
        self.client
            .call(ApiRequest::new(Endpoint::Booking { id: id.to_string() }))
            .await
    }

    /// Provider entry from the last cached provider list, if any.
    #[must_use]
    pub fn cached_provider(&self, id: &str) -> Option<Provider> {
        let value = self.cache.get(ResourceKind::Providers)?;
        let providers: Vec<Provider> = serde_json::from_value(value).ok()?;
        providers.into_iter().find(|p| p.id == id)
    }

    /// Creates the booking. `idempotency_key` is sent as `Idempotency-Key`
    /// so a resubmitted draft is recognised server-side.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`] from the call, including [`ApiError::Cancelled`]
    /// when `cancel` fires first.
    pub async fn create_booking(
        &self,
        payload: &CreateBookingRequest,
        idempotency_key: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<CreateBookingResponse, ApiError> {
        let request = ApiRequest::new(Endpoint::CreateBooking)
            .json(payload)?
            .header("Idempotency-Key", idempotency_key);
        self.send(request, cancel).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the call.
    pub async fn cancel_booking(&self, id: &str) -> Result<Booking, ApiError> {
        self.client
            .call(ApiRequest::new(Endpoint::CancelBooking { id: id.to_string() }))
            .await
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the call, including [`ApiError::Cancelled`].
    pub async fn create_payment_intent(
        &self,
        payload: &PaymentIntentRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<PaymentIntentResponse, ApiError> {
        let request = ApiRequest::new(Endpoint::CreatePaymentIntent).json(payload)?;
        self.send(request, cancel).await
    }

    /// # Errors
    ///
    /// Any [`ApiError`] from the call.
    pub async fn refund_payment(&self, payload: &RefundRequest) -> Result<RefundResponse, ApiError> {
        let request = ApiRequest::new(Endpoint::RefundPayment {
            payment_intent_id: payload.payment_intent_id.clone(),
        })
        .json(payload)?;
        self.client.call(request).await
    }

    async fn load_collection<T>(
        &self,
        kind: ResourceKind,
        request: ApiRequest,
    ) -> Result<Loaded<T>, ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        load_with_fallback(self.cache.as_ref(), kind, move || async move {
            let payload: ListPayload<T> = self.client.call(request).await?;
            Ok(payload.into_items())
        })
        .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<T, ApiError> {
        match cancel {
            Some(token) => self.client.call_cancellable(request, token).await,
            None => self.client.call(request).await,
        }
    }
}

impl std::fmt::Debug for BookingApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingApi")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
