//! Per-city aggregate consumed by the map renderer.
//!
//! Field names and nesting here are an external contract: the renderer
//! reads `prices.<size>.mean`, `sample_size`, `minimum_wage`, and
//! `affordability_index` directly.

use crate::models::SizeBucket;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Version of the aggregate document layout
pub const DATA_VERSION: &str = "1.0.0";

/// Statistics for one size bucket. All values are full precision;
/// rounding belongs to presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

impl BucketStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBuckets {
    pub small: BucketStats,
    pub regular: BucketStats,
    pub large: BucketStats,
}

impl PriceBuckets {
    pub fn get_mut(&mut self, size: SizeBucket) -> &mut BucketStats {
        match size {
            SizeBucket::Small => &mut self.small,
            SizeBucket::Regular => &mut self.regular,
            SizeBucket::Large => &mut self.large,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySummary {
    pub city: String,
    pub province: String,
    pub lat: f64,
    pub lon: f64,
    pub prices: PriceBuckets,
    /// Distinct restaurants contributing at least one price
    pub sample_size: usize,
    pub minimum_wage: f64,
    /// Minutes of minimum-wage work for one regular poutine
    pub affordability_index: Option<f64>,
}

/// Aggregator output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDocument {
    pub last_updated: NaiveDate,
    pub data_version: String,
    pub cities: Vec<CitySummary>,
}
