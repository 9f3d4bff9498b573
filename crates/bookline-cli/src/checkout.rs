//! `checkout` and `refund` commands.
//!
//! The transaction runs on a spawned task while the main task drains the UI
//! channel and renders each event, so all terminal output about the
//! transaction comes from one place.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bookline_api::{BookingApi, CancellationToken};
use bookline_checkout::{
    ui_channel, BookingDraft, CheckoutOrchestrator, HttpGeocoder, NoopNotifier, PaymentOutcome,
    PaymentSheet, RefundFlow, TracingAnalytics, UiEvent,
};
use bookline_core::{AppConfig, Provider, ServiceOffering};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{CheckoutArgs, SheetMode};

/// Payment sheet that asks on the terminal, or answers a fixed outcome.
struct TerminalPaymentSheet {
    mode: SheetMode,
}

pub(crate) fn outcome_for_answer(answer: &str) -> PaymentOutcome {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => PaymentOutcome::Succeeded,
        "n" | "no" => PaymentOutcome::Failed("payment declined at the terminal".to_string()),
        _ => PaymentOutcome::Canceled,
    }
}

#[async_trait]
impl PaymentSheet for TerminalPaymentSheet {
    async fn confirm(&self, client_secret: &str) -> PaymentOutcome {
        match self.mode {
            SheetMode::Succeed => return PaymentOutcome::Succeeded,
            SheetMode::Fail => {
                return PaymentOutcome::Failed("payment declined by --payment fail".to_string())
            }
            SheetMode::Cancel => return PaymentOutcome::Canceled,
            SheetMode::Prompt => {}
        }

        println!("payment sheet ready ({client_secret})");
        println!("confirm payment? [y]es / [n]o (decline) / anything else cancels");
        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut line).await {
            Ok(_) => outcome_for_answer(&line),
            Err(err) => {
                tracing::warn!(error = %err, "could not read payment answer");
                PaymentOutcome::Canceled
            }
        }
    }
}

/// Terminal text for one UI event; `None` when nothing is printed.
pub(crate) fn render(event: &UiEvent) -> Option<String> {
    match event {
        UiEvent::ProcessingStarted => Some("processing...".to_string()),
        UiEvent::ProcessingFinished => None,
        UiEvent::ShowError(err) => Some(format!("error: {}", err.message())),
        UiEvent::ShowNotice(notice) => Some(notice.clone()),
        UiEvent::NavigateToConfirmation(c) => {
            let mut lines = vec![
                format!("booking confirmed: {}", c.booking_id),
                format!("  provider: {}", c.provider_name),
                format!("  service:  {}", c.service_name),
                format!(
                    "  when:     {} {}-{}",
                    c.date.format("%Y-%m-%d"),
                    c.start_time.format("%H:%M"),
                    c.end_time.format("%H:%M")
                ),
                format!("  where:    {}", c.address),
            ];
            if !c.transport_fee.is_zero() {
                lines.push(format!("  transport fee: {}", c.transport_fee));
            }
            lines.push(format!("  total: {}", c.total_price));
            lines.push(format!("  paid now ({}): {}", c.payment_method, c.amount_paid));
            Some(lines.join("\n"))
        }
    }
}

async fn drain(mut events: UnboundedReceiver<UiEvent>) {
    while let Some(event) = events.recv().await {
        let Some(text) = render(&event) else { continue };
        if matches!(event, UiEvent::ShowError(_)) {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }
}

/// Services named on the command line, in the order given.
pub(crate) fn pick_services(
    available: &[ServiceOffering],
    wanted: &[String],
) -> anyhow::Result<Vec<ServiceOffering>> {
    wanted
        .iter()
        .map(|id| {
            available
                .iter()
                .find(|s| &s.id == id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("service '{id}' is not offered by this provider"))
        })
        .collect()
}

async fn resolve_provider(api: &BookingApi, id: &str) -> anyhow::Result<Provider> {
    match api.provider(id).await {
        Ok(provider) => Ok(provider),
        Err(err) => api
            .cached_provider(id)
            .ok_or(err)
            .with_context(|| format!("provider '{id}' could not be loaded")),
    }
}

/// # Errors
///
/// Returns an error if the provider or its services cannot be loaded, or if
/// the checkout ends without a confirmed payment.
pub(crate) async fn run_checkout(
    config: &AppConfig,
    api: BookingApi,
    args: CheckoutArgs,
) -> anyhow::Result<()> {
    let provider = resolve_provider(&api, &args.provider).await?;
    let available = if provider.services.is_empty() {
        api.provider_services(&provider.id).await?
    } else {
        provider.services.clone()
    };
    let services = pick_services(&available, &args.services)?;

    let draft = BookingDraft {
        provider_id: provider.id.clone(),
        provider_name: provider.name.clone(),
        services,
        date: args.date,
        start_time: args.start,
        end_time: args.end,
        address: args.address,
        notes: args.notes,
        payment_method: args.method,
        mobile_service: provider.offers_mobile_service,
        provider_location: provider.location,
        transport_distance_km: args.distance_km,
        customer_location: None,
    };

    let (ui, events) = ui_channel();
    let orchestrator = CheckoutOrchestrator::new(
        api,
        Arc::new(HttpGeocoder::from_app_config(config)?),
        Arc::new(TerminalPaymentSheet { mode: args.payment }),
        ui,
    )
    .with_notifier(Arc::new(NoopNotifier))
    .with_analytics(Arc::new(TracingAnalytics))
    .with_currency(config.currency.clone());

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let run = tokio::spawn(async move { orchestrator.pay_now_cancellable(draft, token).await });
    drain(events).await;
    let report = run.await.context("checkout task failed")?;

    tracing::debug!(trail = ?report.trail, "checkout finished");
    match report.result {
        Ok(_) => Ok(()),
        Err(err) if err.is_superseded() => {
            println!("checkout abandoned");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// # Errors
///
/// Returns an error if the refund is rejected or cannot be sent.
pub(crate) async fn run_refund(
    api: BookingApi,
    booking_id: &str,
    payment_intent_id: &str,
    amount: Option<Decimal>,
) -> anyhow::Result<()> {
    let (ui, events) = ui_channel();
    let flow = RefundFlow::new(api, Arc::new(NoopNotifier), ui)
        .with_analytics(Arc::new(TracingAnalytics));
    let booking_id = booking_id.to_string();
    let payment_intent_id = payment_intent_id.to_string();
    let run = tokio::spawn(async move { flow.refund(&booking_id, &payment_intent_id, amount).await });
    drain(events).await;
    run.await.context("refund task failed")??;
    Ok(())
}
