//! Record types shared by the trip store, the detector and the ranking.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaybillError};
use crate::fingerprint::Fingerprint;

/// Simulator titles a trip can be driven on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Wtds,
    Wbds,
    Gto,
    Toe3,
    Ets2,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Wtds,
        Platform::Wbds,
        Platform::Gto,
        Platform::Toe3,
        Platform::Ets2,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Wtds => "WTDS",
            Self::Wbds => "WBDS",
            Self::Gto => "GTO",
            Self::Toe3 => "TOE3",
            Self::Ets2 => "ETS2",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Wtds => "World Truck Driving Simulator",
            Self::Wbds => "World Bus Driving Simulator",
            Self::Gto => "Global Truck Online",
            Self::Toe3 => "Truckers of Europe 3",
            Self::Ets2 => "Euro Truck Simulator 2",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Platform {
    type Err = WaybillError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WaybillError::validation(format!("Unknown platform '{}'", s)))
    }
}

/// Vehicle segment of a trip. As a ranking filter, `Both` matches every segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Segment {
    #[default]
    Truck,
    Bus,
    Both,
}

impl Segment {
    /// Whether a trip of this segment passes `filter`.
    pub fn matches_filter(self, filter: Segment) -> bool {
        filter == Segment::Both || self == filter
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Truck => "TRUCK",
            Self::Bus => "BUS",
            Self::Both => "BOTH",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Segment {
    type Err = WaybillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRUCK" => Ok(Self::Truck),
            "BUS" => Ok(Self::Bus),
            "BOTH" => Ok(Self::Both),
            _ => Err(WaybillError::validation(format!("Unknown segment '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserCategory {
    Driver,
    Entrepreneur,
    Autonomous,
    Grouping,
}

impl UserCategory {
    pub fn code(self) -> &'static str {
        match self {
            Self::Driver => "DRIVER",
            Self::Entrepreneur => "ENTREPRENEUR",
            Self::Autonomous => "AUTONOMOUS",
            Self::Grouping => "GROUPING",
        }
    }
}

impl fmt::Display for UserCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Pending,
    Approved,
    Rejected,
    Banned,
}

/// Non-negative monetary amount in hundredths of the (unspecified) currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Parse a user-typed amount.
    ///
    /// Accepts `1500`, `1500.00`, `1500,00`, `1.500,00` and `1.500`. When a
    /// comma is present it is the decimal separator and dots are digit
    /// grouping. Without a comma, dots followed by groups of exactly three
    /// digits are grouping too.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(WaybillError::validation("Amount is required"));
        }
        if raw.starts_with('-') {
            return Err(WaybillError::validation(format!(
                "Amount must not be negative: '{}'",
                input
            )));
        }

        let (integer, fraction) = if let Some((int, frac)) = raw.rsplit_once(',') {
            (int.replace('.', ""), frac.to_string())
        } else if let Some((int, frac)) = raw.split_once('.') {
            if frac.len() <= 2 && !frac.contains('.') {
                (int.to_string(), frac.to_string())
            } else if is_digit_grouping(raw) {
                (raw.replace('.', ""), String::new())
            } else {
                return Err(WaybillError::validation(format!(
                    "Malformed amount '{}', use 1500.00 or 1.500,00",
                    input
                )));
            }
        } else {
            (raw.to_string(), String::new())
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if integer.is_empty() || !all_digits(&integer) || !all_digits(&fraction) {
            return Err(WaybillError::validation(format!(
                "Malformed amount '{}'",
                input
            )));
        }
        if fraction.len() > 2 {
            return Err(WaybillError::validation(format!(
                "Amount '{}' has more than two decimal places",
                input
            )));
        }

        let units: u64 = integer
            .parse()
            .map_err(|_| WaybillError::validation(format!("Amount '{}' is too large", input)))?;
        let hundredths: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().unwrap_or(0) * 10,
            _ => fraction.parse::<u64>().unwrap_or(0),
        };

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(hundredths))
            .map(Self)
            .ok_or_else(|| WaybillError::validation(format!("Amount '{}' is too large", input)))
    }
}

/// `1.500` or `12.345.678`: a leading group of one to three digits, then
/// dot-separated groups of exactly three.
fn is_digit_grouping(raw: &str) -> bool {
    let mut groups = raw.split('.');
    let lead_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    lead_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Amount {
    type Err = WaybillError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

/// One completed delivery claimed by a driver.
///
/// Created once after passing the duplicate check and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: String,
    pub driver_id: String,
    pub driver_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub value_cents: Amount,
    pub platform: Platform,
    pub segment: Segment,
    pub initial_fingerprint: Fingerprint,
    pub final_fingerprint: Fingerprint,
    #[serde(default)]
    pub initial_proof_ref: String,
    #[serde(default)]
    pub final_proof_ref: String,
    pub created_at: DateTime<Utc>,
}

impl TripRecord {
    /// Both proof fingerprints, initial first.
    pub fn fingerprints(&self) -> [&Fingerprint; 2] {
        [&self.initial_fingerprint, &self.final_fingerprint]
    }

    /// Whether `fingerprint` is used by this trip in either role.
    pub fn uses_fingerprint(&self, fingerprint: &Fingerprint) -> bool {
        self.initial_fingerprint == *fingerprint || self.final_fingerprint == *fingerprint
    }
}

/// Community member as supplied by the profile collaborator (read-only here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    pub name: String,
    pub status: UserStatus,
    pub category: UserCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub segment: Segment,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_url: Option<String>,
}

impl ProfileRecord {
    pub fn is_approved(&self) -> bool {
        self.status == UserStatus::Approved
    }

    /// Company name, treating an empty string as absent.
    pub fn company(&self) -> Option<&str> {
        self.company_name.as_deref().filter(|c| !c.is_empty())
    }
}
