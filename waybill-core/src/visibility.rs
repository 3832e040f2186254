//! Which trips a viewer may list.

use crate::model::{ProfileRecord, TripRecord, UserCategory};

/// Slice of the trip history visible to one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripScope {
    /// Every trip (administrators)
    All,
    /// Trips recorded under a company name
    Company(String),
    /// Trips of a single driver
    Driver(String),
}

impl TripScope {
    /// Administrators see everything. Company owners and groupings see the
    /// trips of their company; everyone else sees only their own trips.
    pub fn for_viewer(viewer: &ProfileRecord, is_admin: bool) -> Self {
        if is_admin {
            return Self::All;
        }
        match (viewer.category, viewer.company()) {
            (UserCategory::Entrepreneur | UserCategory::Grouping, Some(company)) => {
                Self::Company(company.to_string())
            }
            _ => Self::Driver(viewer.id.clone()),
        }
    }

    pub fn includes(&self, trip: &TripRecord) -> bool {
        match self {
            Self::All => true,
            Self::Company(company) => trip.company_name.as_deref() == Some(company.as_str()),
            Self::Driver(id) => trip.driver_id == *id,
        }
    }
}

/// Trips in `scope`, newest first.
pub fn visible_trips(trips: Vec<TripRecord>, scope: &TripScope) -> Vec<TripRecord> {
    let mut visible: Vec<TripRecord> = trips.into_iter().filter(|t| scope.includes(t)).collect();
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    visible
}
