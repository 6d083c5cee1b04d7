//! Restaurant candidates produced by the places fetch step

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub name: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
}

impl RestaurantRecord {
    /// Lookup key shared with price entries: trimmed, lower-cased city and name
    pub fn key(&self) -> (String, String) {
        restaurant_key(&self.city, &self.name)
    }
}

pub fn restaurant_key(city: &str, name: &str) -> (String, String) {
    (city.trim().to_lowercase(), name.trim().to_lowercase())
}
