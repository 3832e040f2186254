//! Point-in-time copies of a leaderboard.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::ranking::{RankEntry, RankingQuery};

/// A frozen ranking, labelled with the month it was taken in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingSnapshot {
    pub id: String,
    /// `M/YYYY`
    pub period: String,
    pub query: RankingQuery,
    pub entries: Vec<RankEntry>,
    pub created_at: DateTime<Utc>,
}

impl RankingSnapshot {
    pub fn new(
        id: impl Into<String>,
        query: RankingQuery,
        entries: Vec<RankEntry>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            period: period_label(created_at),
            query,
            entries,
            created_at,
        }
    }
}

pub fn period_label(at: DateTime<Utc>) -> String {
    format!("{}/{}", at.month(), at.year())
}
