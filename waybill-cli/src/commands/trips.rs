//! Trips command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use waybill_core::TripScope;

use crate::utils::{approved_profile, trip_service};
use crate::StoreArgs;

/// Execute the trips command.
pub async fn execute(
    stores: StoreArgs,
    viewer: Option<String>,
    admin: bool,
    json: bool,
) -> Result<()> {
    let scope = match (admin, viewer) {
        (true, _) => TripScope::All,
        (false, Some(id)) => TripScope::for_viewer(&approved_profile(&stores, &id).await?, false),
        (false, None) => anyhow::bail!("Either --viewer or --admin is required"),
    };

    let trips = trip_service(&stores)
        .list_visible(&scope)
        .await
        .with_context(|| format!("Failed to read trips from {}", stores.store.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&trips)?);
        return Ok(());
    }

    if trips.is_empty() {
        println!("{}", "No trips".dimmed());
        return Ok(());
    }

    for trip in &trips {
        println!(
            "{} {} {} -> {} {:>12} {} {} {}",
            trip.date,
            trip.driver_name.bold(),
            trip.origin,
            trip.destination,
            trip.value_cents.to_string(),
            trip.platform,
            trip.segment,
            trip.id.dimmed()
        );
    }
    println!("{}", format!("{} trip(s)", trips.len()).dimmed());

    Ok(())
}
