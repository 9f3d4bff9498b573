//! Read-only listing commands.
//!
//! Each list goes through the cache fallback policy; when the network is
//! unavailable the last cached copy is printed under an offline notice.

use bookline_api::{BookingApi, Loaded};
use bookline_core::{fee_for, is_valid_distance, Booking, Offer, Provider};

const NONE: &str = "-";

fn print_offline_notice<T>(loaded: &Loaded<T>) {
    if let Some(notice) = loaded.offline_notice() {
        eprintln!("{notice}");
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

pub(crate) fn provider_row(provider: &Provider) -> String {
    let rating = provider
        .rating
        .map_or_else(|| NONE.to_string(), |r| format!("{r:.1}"));
    format!(
        "{:<14}{:<32}{:<8}{:<8}{}",
        provider.id,
        truncate(&provider.name, 28),
        if provider.offers_mobile_service { "yes" } else { "no" },
        rating,
        provider.services.len()
    )
}

pub(crate) fn booking_row(booking: &Booking) -> String {
    let date = booking
        .date
        .map_or_else(|| NONE.to_string(), |d| d.format("%Y-%m-%d").to_string());
    let window = match (&booking.start_time, &booking.end_time) {
        (Some(start), Some(end)) => format!("{start}-{end}"),
        (Some(start), None) => start.clone(),
        _ => NONE.to_string(),
    };
    format!(
        "{:<14}{:<12}{:<13}{:<11}{}",
        booking.id,
        date,
        window,
        format!("{:?}", booking.status).to_lowercase(),
        booking.provider_name.as_deref().unwrap_or(NONE)
    )
}

pub(crate) fn offer_row(offer: &Offer) -> String {
    let discount = offer
        .discount_percent
        .map_or_else(|| NONE.to_string(), |d| format!("{d}%"));
    let until = offer
        .valid_until
        .map_or_else(|| NONE.to_string(), |d| d.format("%Y-%m-%d").to_string());
    format!(
        "{:<14}{:<10}{:<12}{}",
        offer.id,
        discount,
        until,
        truncate(&offer.title, 50)
    )
}

/// # Errors
///
/// Returns an error if the fetch fails and nothing is cached.
pub(crate) async fn run_providers(api: &BookingApi, categories: &[String]) -> anyhow::Result<()> {
    let loaded = api.list_providers(categories).await?;
    print_offline_notice(&loaded);
    if loaded.items.is_empty() {
        println!("no providers found");
        return Ok(());
    }
    println!(
        "{:<14}{:<32}{:<8}{:<8}SERVICES",
        "ID", "NAME", "MOBILE", "RATING"
    );
    for provider in &loaded.items {
        println!("{}", provider_row(provider));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the fetch fails and nothing is cached.
pub(crate) async fn run_bookings(api: &BookingApi) -> anyhow::Result<()> {
    let loaded = api.list_bookings().await?;
    print_offline_notice(&loaded);
    if loaded.items.is_empty() {
        println!("no bookings yet");
        return Ok(());
    }
    println!(
        "{:<14}{:<12}{:<13}{:<11}PROVIDER",
        "ID", "DATE", "TIME", "STATUS"
    );
    for booking in &loaded.items {
        println!("{}", booking_row(booking));
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if the fetch fails and nothing is cached.
pub(crate) async fn run_offers(api: &BookingApi) -> anyhow::Result<()> {
    let loaded = api.list_offers().await?;
    print_offline_notice(&loaded);
    if loaded.items.is_empty() {
        println!("no current offers");
        return Ok(());
    }
    println!("{:<14}{:<10}{:<12}TITLE", "ID", "DISCOUNT", "VALID UNTIL");
    for offer in &loaded.items {
        println!("{}", offer_row(offer));
    }
    Ok(())
}

pub(crate) fn fee_line(km: f64) -> anyhow::Result<String> {
    anyhow::ensure!(
        is_valid_distance(km),
        "distance must be a non-negative number of kilometres, got {km}"
    );
    Ok(format!("transport fee for {km:.1} km: {}", fee_for(km)))
}

pub(crate) fn run_fee(km: f64) -> anyhow::Result<()> {
    println!("{}", fee_line(km)?);
    Ok(())
}
