//! Price observations: raw submissions, validated entries, and the
//! accept/reject outcome that connects them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Portion size of a poutine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeBucket {
    Small,
    Regular,
    Large,
}

impl SizeBucket {
    pub const ALL: [SizeBucket; 3] = [SizeBucket::Small, SizeBucket::Regular, SizeBucket::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeBucket::Small => "small",
            SizeBucket::Regular => "regular",
            SizeBucket::Large => "large",
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prices per size, each nullable.
///
/// Missing keys deserialize to `None` and always serialize back as `null`,
/// so every written entry carries all three sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSet {
    #[serde(default)]
    pub small: Option<f64>,
    #[serde(default)]
    pub regular: Option<f64>,
    #[serde(default)]
    pub large: Option<f64>,
}

impl PriceSet {
    pub fn get(&self, size: SizeBucket) -> Option<f64> {
        match size {
            SizeBucket::Small => self.small,
            SizeBucket::Regular => self.regular,
            SizeBucket::Large => self.large,
        }
    }

    /// Sizes that carry a value, in small/regular/large order
    pub fn present(&self) -> impl Iterator<Item = (SizeBucket, f64)> + '_ {
        SizeBucket::ALL
            .into_iter()
            .filter_map(|size| self.get(size).map(|price| (size, price)))
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }
}

/// Self-reported reliability of a price observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            _ => Err(format!("'{}' is not one of high/medium/low", s)),
        }
    }
}

/// A human- or tool-submitted price observation, as written in the raw file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceEntry {
    pub city: String,
    pub restaurant_name: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub extraction_date: String,
    pub prices: PriceSet,
    #[serde(default)]
    pub notes: Option<String>,
    pub confidence: String,
}

/// A raw entry that passed every rule, normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPriceEntry {
    pub city: String,
    pub restaurant_name: String,
    pub source_url: Option<String>,
    pub extraction_date: NaiveDate,
    pub prices: PriceSet,
    pub notes: Option<String>,
    pub confidence: Confidence,
}

/// Why an entry was rejected. The first failing rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    UnknownCity,
    Blocklisted,
    NoPriceData,
    PriceOutOfRange,
    InvalidConfidence,
    InvalidExtractionDate,
    InvalidSourceUrl,
    InvalidRestaurantName,
    DuplicateEntry,
    FlaggedStrict,
}

impl RejectionReason {
    /// Rule order
    pub const ALL: [RejectionReason; 10] = [
        RejectionReason::UnknownCity,
        RejectionReason::Blocklisted,
        RejectionReason::NoPriceData,
        RejectionReason::PriceOutOfRange,
        RejectionReason::InvalidConfidence,
        RejectionReason::InvalidExtractionDate,
        RejectionReason::InvalidSourceUrl,
        RejectionReason::InvalidRestaurantName,
        RejectionReason::DuplicateEntry,
        RejectionReason::FlaggedStrict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::UnknownCity => "unknown_city",
            RejectionReason::Blocklisted => "blocklisted",
            RejectionReason::NoPriceData => "no_price_data",
            RejectionReason::PriceOutOfRange => "price_out_of_range",
            RejectionReason::InvalidConfidence => "invalid_confidence",
            RejectionReason::InvalidExtractionDate => "invalid_extraction_date",
            RejectionReason::InvalidSourceUrl => "invalid_source_url",
            RejectionReason::InvalidRestaurantName => "invalid_restaurant_name",
            RejectionReason::DuplicateEntry => "duplicate_entry",
            RejectionReason::FlaggedStrict => "flagged_strict",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected entry, kept verbatim for human review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub detail: String,
    pub entry: RawPriceEntry,
}

/// Result of screening one raw entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Accepted(ValidatedPriceEntry),
    Rejected(Rejection),
}

/// Non-fatal observation about an accepted entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    MissingRegular,
    AtypicalPrice,
    SizeOrder,
    Stale,
    Outlier,
    UnknownRestaurant,
}

impl FlagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagKind::MissingRegular => "missing_regular",
            FlagKind::AtypicalPrice => "atypical_price",
            FlagKind::SizeOrder => "size_order",
            FlagKind::Stale => "stale",
            FlagKind::Outlier => "outlier",
            FlagKind::UnknownRestaurant => "unknown_restaurant",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub kind: FlagKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedEntry {
    pub city: String,
    pub restaurant_name: String,
    pub flags: Vec<Flag>,
}

/// Validator output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPriceDocument {
    pub validation_date: NaiveDate,
    pub prices: Vec<ValidatedPriceEntry>,
}

/// Rejection report written next to the validated file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionReport {
    pub validation_date: NaiveDate,
    pub total: usize,
    pub accepted: usize,
    pub rejected_count: usize,
    /// Counts per reason, in rule order, zero counts omitted
    pub by_reason: BTreeMap<RejectionReason, usize>,
    pub rejected: Vec<Rejection>,
    pub flagged: Vec<FlaggedEntry>,
}
