//! Leaderboard aggregation.
//!
//! Rankings are derived on every request from the full trip and profile
//! collections and never cached. Nothing here mutates its inputs.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaybillError};
use crate::model::{Amount, Platform, ProfileRecord, Segment, TripRecord, UserCategory};

/// Ranking dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RankAxis {
    /// Individual drivers
    Driver,
    /// Companies, grouped by company name
    Entrepreneur,
    Grouping,
    Autonomous,
}

impl RankAxis {
    pub fn category(self) -> UserCategory {
        match self {
            Self::Driver => UserCategory::Driver,
            Self::Entrepreneur => UserCategory::Entrepreneur,
            Self::Grouping => UserCategory::Grouping,
            Self::Autonomous => UserCategory::Autonomous,
        }
    }
}

impl fmt::Display for RankAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category().code())
    }
}

impl FromStr for RankAxis {
    type Err = WaybillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRIVER" => Ok(Self::Driver),
            "ENTREPRENEUR" | "COMPANY" => Ok(Self::Entrepreneur),
            "GROUPING" => Ok(Self::Grouping),
            "AUTONOMOUS" => Ok(Self::Autonomous),
            _ => Err(WaybillError::validation(format!(
                "Unknown ranking axis '{}'",
                s
            ))),
        }
    }
}

/// Filter set of one ranking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingQuery {
    pub axis: RankAxis,
    /// Exact match
    pub platform: Platform,
    /// `BOTH` matches every segment
    pub segment: Segment,
    /// Case-insensitive substring over name or company name
    #[serde(default)]
    pub search: String,
}

impl RankingQuery {
    pub fn new(axis: RankAxis, platform: Platform, segment: Segment) -> Self {
        Self {
            axis,
            platform,
            segment,
            search: String::new(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    fn includes_trip(&self, trip: &TripRecord) -> bool {
        trip.platform == self.platform && trip.segment.matches_filter(self.segment)
    }
}

/// One leaderboard row: a profile, or a company aggregate on the
/// entrepreneur axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    /// Profile the row was built from
    pub entity_id: String,
    /// Company name on the entrepreneur axis, profile name otherwise
    pub display_name: String,
    pub profile_name: String,
    pub category: UserCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub total_value_cents: Amount,
    pub trip_count: u64,
}

impl RankEntry {
    fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.profile_name.to_lowercase().contains(needle)
            || self
                .company_name
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total: Amount,
    count: u64,
}

impl Tally {
    fn add(&mut self, trip: &TripRecord) {
        self.total = self.total + trip.value_cents;
        self.count += 1;
    }
}

/// Compute an ordered leaderboard.
///
/// Sorted by total value descending, then trip count descending; rows that
/// tie on both keep their encounter order. Empty inputs give an empty
/// ranking.
pub fn compute_ranking(
    profiles: &[ProfileRecord],
    trips: &[TripRecord],
    query: &RankingQuery,
) -> Vec<RankEntry> {
    let matching: Vec<&TripRecord> = trips.iter().filter(|t| query.includes_trip(t)).collect();

    let entries = match query.axis {
        RankAxis::Entrepreneur => rank_companies(profiles, &matching),
        axis => rank_members(profiles, &matching, axis),
    };

    let needle = query.search.to_lowercase();
    let mut ranked: Vec<RankEntry> = entries
        .into_iter()
        .filter(|e| e.matches_search(&needle))
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| {
        b.total_value_cents
            .cmp(&a.total_value_cents)
            .then_with(|| b.trip_count.cmp(&a.trip_count))
    });

    tracing::debug!(
        axis = %query.axis,
        platform = %query.platform,
        segment = %query.segment,
        trips = matching.len(),
        entries = ranked.len(),
        "Computed ranking"
    );

    ranked
}

fn rank_members(
    profiles: &[ProfileRecord],
    trips: &[&TripRecord],
    axis: RankAxis,
) -> Vec<RankEntry> {
    let mut by_driver: HashMap<&str, Tally> = HashMap::new();
    for trip in trips {
        by_driver.entry(trip.driver_id.as_str()).or_default().add(trip);
    }

    profiles
        .iter()
        .filter(|p| p.is_approved())
        // The driver axis attributes trips to every approved profile, then
        // keeps those with trips plus every driver-category profile.
        .filter(|p| axis == RankAxis::Driver || p.category == axis.category())
        .map(|p| {
            let tally = by_driver.get(p.id.as_str()).copied().unwrap_or_default();
            member_entry(p, tally)
        })
        .filter(|e| {
            axis != RankAxis::Driver || e.trip_count > 0 || e.category == UserCategory::Driver
        })
        .collect()
}

fn rank_companies(profiles: &[ProfileRecord], trips: &[&TripRecord]) -> Vec<RankEntry> {
    let mut by_company: HashMap<&str, Tally> = HashMap::new();
    for trip in trips {
        if let Some(company) = trip.company_name.as_deref().filter(|c| !c.is_empty()) {
            by_company.entry(company).or_default().add(trip);
        }
    }

    // One row per company name. A later profile with the same company name
    // replaces the earlier row's contents but keeps its position.
    let mut entries: Vec<RankEntry> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for profile in profiles
        .iter()
        .filter(|p| p.is_approved() && p.category == UserCategory::Entrepreneur)
    {
        let Some(company) = profile.company() else {
            continue;
        };
        let tally = by_company.get(company).copied().unwrap_or_default();
        let entry = company_entry(profile, company, tally);

        match slots.get(company) {
            Some(&slot) => entries[slot] = entry,
            None => {
                slots.insert(company, entries.len());
                entries.push(entry);
            }
        }
    }

    entries
}

fn member_entry(profile: &ProfileRecord, tally: Tally) -> RankEntry {
    RankEntry {
        entity_id: profile.id.clone(),
        display_name: profile.name.clone(),
        profile_name: profile.name.clone(),
        category: profile.category,
        company_name: profile.company().map(str::to_string),
        image_ref: first_present([
            Some(profile.photo_url.as_str()),
            profile.logo_url.as_deref(),
            profile.flag_url.as_deref(),
        ]),
        total_value_cents: tally.total,
        trip_count: tally.count,
    }
}

fn company_entry(profile: &ProfileRecord, company: &str, tally: Tally) -> RankEntry {
    RankEntry {
        entity_id: profile.id.clone(),
        display_name: company.to_string(),
        profile_name: profile.name.clone(),
        category: profile.category,
        company_name: Some(company.to_string()),
        image_ref: first_present([
            profile.logo_url.as_deref(),
            profile.flag_url.as_deref(),
            Some(profile.photo_url.as_str()),
        ]),
        total_value_cents: tally.total,
        trip_count: tally.count,
    }
}

fn first_present(candidates: [Option<&str>; 3]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
