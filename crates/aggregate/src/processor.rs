//! Aggregation processor
//!
//! Groups validated entries by city and size bucket, computes bucket
//! statistics and the affordability index, and writes the per-city
//! document the map renderer reads.

use crate::errors::AggregateError;
use crate::stats::bucket_stats;
use chrono::NaiveDate;
use poutine_common::config::AppConfig;
use poutine_common::errors::AppError;
use poutine_common::files::{load_entries, write_json};
use poutine_common::models::{
    AggregateDocument, CitySummary, PriceBuckets, SizeBucket, ValidatedPriceEntry, DATA_VERSION,
};
use poutine_common::{ReferenceData, SchemaKind, SchemaSet};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

/// Minutes of minimum-wage work needed to buy one regular poutine
pub fn affordability_index(regular_mean: Option<f64>, hourly_wage: f64) -> Option<f64> {
    match regular_mean {
        Some(mean) if hourly_wage > 0.0 => Some(mean / hourly_wage * 60.0),
        _ => None,
    }
}

/// Build one summary per configured city, in configured order.
///
/// Pure apart from logging. Cities without entries still appear with empty
/// buckets. A city whose province has no minimum wage aborts the whole run.
pub fn aggregate(
    entries: &[ValidatedPriceEntry],
    reference: &ReferenceData,
    last_updated: NaiveDate,
) -> Result<AggregateDocument, AppError> {
    let mut names = HashSet::with_capacity(reference.cities.len());
    for city in &reference.cities {
        if !names.insert(city.name.as_str()) {
            return Err(AppError::DuplicateCity {
                city: city.name.clone(),
            });
        }
    }

    let mut by_city: HashMap<&str, Vec<&ValidatedPriceEntry>> = HashMap::new();
    for entry in entries {
        if names.contains(entry.city.as_str()) {
            by_city.entry(entry.city.as_str()).or_default().push(entry);
        } else {
            warn!(
                city = %entry.city,
                restaurant = %entry.restaurant_name,
                "Ignoring entry for a city outside the city list"
            );
        }
    }

    let mut cities = Vec::with_capacity(reference.cities.len());
    for city in &reference.cities {
        let minimum_wage = reference.wages.hourly_wage(&city.province).ok_or_else(|| {
            AppError::MissingMinimumWage {
                city: city.name.clone(),
                province: city.province.clone(),
            }
        })?;

        let city_entries = by_city.get(city.name.as_str()).map(Vec::as_slice).unwrap_or(&[]);

        let mut prices = PriceBuckets::default();
        for size in SizeBucket::ALL {
            let values: Vec<f64> = city_entries.iter().filter_map(|e| e.prices.get(size)).collect();
            *prices.get_mut(size) = bucket_stats(&values);
        }

        let sample_size = city_entries
            .iter()
            .filter(|e| !e.prices.is_empty())
            .map(|e| e.restaurant_name.trim().to_lowercase())
            .collect::<HashSet<_>>()
            .len();

        cities.push(CitySummary {
            city: city.name.clone(),
            province: city.province.clone(),
            lat: city.lat,
            lon: city.lon,
            affordability_index: affordability_index(prices.regular.mean, minimum_wage),
            prices,
            sample_size,
            minimum_wage,
        });
    }

    Ok(AggregateDocument {
        last_updated,
        data_version: DATA_VERSION.to_string(),
        cities,
    })
}

/// Schema violations in a document about to be written
fn check_output(document: &AggregateDocument, schemas: &SchemaSet) -> Result<(), AggregateError> {
    let value = serde_json::to_value(document).map_err(AppError::from)?;
    let violations = schemas.violations(SchemaKind::CityFinal, &value, "(root)");
    if violations.is_empty() {
        Ok(())
    } else {
        Err(AggregateError::OutputContract { violations })
    }
}

fn log_summary(document: &AggregateDocument) {
    let with_data: Vec<&CitySummary> = document.cities.iter().filter(|c| c.sample_size > 0).collect();
    let total_samples: usize = document.cities.iter().map(|c| c.sample_size).sum();

    let range = |values: Vec<f64>| {
        let min = values.iter().copied().reduce(f64::min);
        let max = values.iter().copied().reduce(f64::max);
        min.zip(max)
            .map(|(min, max)| format!("{:.2}-{:.2}", min, max))
            .unwrap_or_else(|| "n/a".to_string())
    };
    let regular = range(document.cities.iter().filter_map(|c| c.prices.regular.mean).collect());
    let affordability = range(document.cities.iter().filter_map(|c| c.affordability_index).collect());

    for city in &document.cities {
        if city.sample_size == 0 {
            warn!(city = %city.city, "No validated prices for city");
        }
    }

    info!(
        cities = document.cities.len(),
        cities_with_data = with_data.len(),
        total_samples,
        regular_price_range = %regular,
        affordability_minutes = %affordability,
        "Aggregation complete"
    );
}

/// Load the validated prices, aggregate, and write the final document
#[instrument(skip(config), fields(input = %config.paths.prices_validated.display()))]
pub fn run(config: &AppConfig, last_updated: NaiveDate) -> Result<AggregateDocument, AggregateError> {
    let paths = &config.paths;
    let schemas = SchemaSet::load(paths.schemas_dir.as_deref())?;
    let reference = ReferenceData::load(paths, &schemas)?;

    if !paths.prices_validated.exists() {
        return Err(AggregateError::NoValidatedInput {
            path: paths.prices_validated.clone(),
        });
    }
    let entries: Vec<ValidatedPriceEntry> = load_entries(
        &paths.prices_validated,
        "prices",
        SchemaKind::ValidatedPriceEntry,
        &schemas,
    )?;
    info!(entries = entries.len(), "Loaded validated price entries");

    let document = aggregate(&entries, &reference, last_updated)?;
    check_output(&document, &schemas)?;
    write_json(&paths.cities_final, &document)?;

    log_summary(&document);
    Ok(document)
}
