//! Ranking command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use waybill_core::{
    JsonFileProfileRepository, JsonFileTripRepository, MemorySnapshotRepository, Platform,
    RankAxis, RankingQuery, RankingService, Segment,
};

use crate::StoreArgs;

/// Execute the ranking command.
pub async fn execute(
    stores: StoreArgs,
    axis: RankAxis,
    platform: Platform,
    segment: Segment,
    search: String,
    json: bool,
) -> Result<()> {
    let service = RankingService::new(
        Arc::new(JsonFileTripRepository::new(stores.store.clone())),
        Arc::new(JsonFileProfileRepository::new(stores.profiles.clone())),
        Arc::new(MemorySnapshotRepository::new()),
    );

    let query = RankingQuery::new(axis, platform, segment).with_search(search);
    let entries = service
        .get_ranking(&query)
        .await
        .context("Failed to compute ranking")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("{} ranking, {} / {}", query.axis, query.platform, query.segment).bold()
    );
    if entries.is_empty() {
        println!("   {}", "No ranked entries".dimmed());
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        let position = format!("{:>3}.", i + 1);
        let position = match i {
            0 => position.yellow().bold(),
            1 | 2 => position.bold(),
            _ => position.normal(),
        };
        println!(
            "{} {:<32} {:>14} {:>5} trips",
            position,
            entry.display_name,
            entry.total_value_cents.to_string(),
            entry.trip_count
        );
    }

    Ok(())
}
