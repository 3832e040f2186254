//! Submit command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use tracing::info;
use waybill_core::{Amount, Platform, Segment, Submitter, TripSubmission};

use crate::utils::{approved_profile, read_proof, trip_service};
use crate::StoreArgs;

/// Trip fields supplied on the command line
pub struct SubmitArgs {
    pub driver: String,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub value: Amount,
    pub platform: Platform,
    pub segment: Segment,
    pub initial: PathBuf,
    pub final_proof: PathBuf,
}

/// Execute the submit command.
pub async fn execute(stores: StoreArgs, args: SubmitArgs, json: bool, quiet: bool) -> Result<()> {
    let profile = approved_profile(&stores, &args.driver).await?;

    let submission = TripSubmission {
        origin: args.origin,
        destination: args.destination,
        date: args.date,
        value: args.value,
        platform: args.platform,
        segment: args.segment,
        initial_proof: Some(read_proof(&args.initial)?),
        final_proof: Some(read_proof(&args.final_proof)?),
    };

    let trip = trip_service(&stores)
        .submit_trip(&Submitter::from(&profile), submission)
        .await
        .context("Trip rejected")?;

    info!(trip_id = %trip.id, store = %stores.store.display(), "Trip stored");

    if json {
        println!("{}", serde_json::to_string_pretty(&trip)?);
    } else if !quiet {
        println!();
        println!("{}", "Trip recorded!".green().bold());
        println!();
        println!("   {} {}", "Trip id:".dimmed(), trip.id);
        println!(
            "   {} {} -> {} on {}",
            "Route:".dimmed(),
            trip.origin,
            trip.destination,
            trip.date
        );
        println!(
            "   {} {} ({} {})",
            "Value:".dimmed(),
            trip.value_cents,
            trip.platform,
            trip.segment
        );
        println!(
            "   {} {}",
            "Initial proof:".dimmed(),
            trip.initial_fingerprint.short()
        );
        println!(
            "   {} {}",
            "Final proof:".dimmed(),
            trip.final_fingerprint.short()
        );
    }

    Ok(())
}
