//! Static reference data: target cities, provincial minimum wages, and the
//! fast-food blocklist.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

/// Canada bounding box
pub const CANADA_LAT_MIN: f64 = 41.0;
pub const CANADA_LAT_MAX: f64 = 84.0;
pub const CANADA_LON_MIN: f64 = -141.0;
pub const CANADA_LON_MAX: f64 = -52.0;

/// Canadian province and territory codes
pub const PROVINCE_CODES: [&str; 13] = [
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

fn validate_province(province: &str) -> Result<(), ValidationError> {
    if PROVINCE_CODES.contains(&province) {
        Ok(())
    } else {
        let mut err = ValidationError::new("province_code");
        err.message = Some(format!("'{}' is not a Canadian province code", province).into());
        Err(err)
    }
}

/// One target city (census metropolitan area)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CityReference {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(custom(function = "validate_province"))]
    pub province: String,

    #[validate(range(min = CANADA_LAT_MIN, max = CANADA_LAT_MAX))]
    pub lat: f64,

    #[validate(range(min = CANADA_LON_MIN, max = CANADA_LON_MAX))]
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityList {
    pub cities: Vec<CityReference>,
}

/// Provincial minimum wage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MinimumWage {
    /// Currency per hour
    #[validate(range(exclusive_min = 0.0))]
    pub hourly_wage: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Minimum wages keyed by province code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinimumWageTable {
    pub wages: BTreeMap<String, MinimumWage>,
}

impl MinimumWageTable {
    pub fn hourly_wage(&self, province: &str) -> Option<f64> {
        self.wages.get(province).map(|w| w.hourly_wage)
    }
}

/// Blocklist file as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlocklistDocument {
    pub chains: Vec<String>,
}

/// Fast-food chain patterns, matched case-insensitively as substrings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blocklist {
    patterns: Vec<String>,
}

impl Blocklist {
    pub fn new<I, S>(chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = chains
            .into_iter()
            .map(|chain| chain.as_ref().trim().to_lowercase())
            .filter(|chain| !chain.is_empty())
            .collect();
        Self { patterns }
    }

    /// The pattern the name matches, if any
    pub fn matching(&self, restaurant_name: &str) -> Option<&str> {
        let name = restaurant_name.to_lowercase();
        self.patterns
            .iter()
            .find(|pattern| name.contains(pattern.as_str()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl From<BlocklistDocument> for Blocklist {
    fn from(doc: BlocklistDocument) -> Self {
        Blocklist::new(doc.chains)
    }
}
