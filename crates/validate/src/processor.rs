//! Validation processor
//!
//! Core logic for screening raw price entries: rule chain, duplicate
//! detection, warning flags, strict mode, and the file-level run.

use crate::errors::ValidateError;
use crate::rules::{entry_flags, outlier_flags, screen, RuleContext};
use chrono::NaiveDate;
use poutine_common::config::{AppConfig, ValidationSettings};
use poutine_common::files::{load_entries, write_json};
use poutine_common::models::{
    restaurant_key, EntryOutcome, Flag, FlaggedEntry, RawPriceEntry, Rejection,
    RejectionReason, RejectionReport, RestaurantRecord, ValidatedPriceDocument,
    ValidatedPriceEntry,
};
use poutine_common::{ReferenceData, SchemaKind, SchemaSet};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Accepted and rejected entries are disjoint and together cover the input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub accepted: Vec<ValidatedPriceEntry>,
    pub rejected: Vec<Rejection>,
    /// Entries that carried warnings, whether or not they were accepted
    pub flagged: Vec<FlaggedEntry>,
}

impl ValidationOutcome {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    /// Rejection counts per reason, in rule order
    pub fn by_reason(&self) -> BTreeMap<RejectionReason, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejected {
            *counts.entry(rejection.reason).or_insert(0) += 1;
        }
        counts
    }

    pub fn report(&self, validation_date: NaiveDate) -> RejectionReport {
        RejectionReport {
            validation_date,
            total: self.total(),
            accepted: self.accepted.len(),
            rejected_count: self.rejected.len(),
            by_reason: self.by_reason(),
            rejected: self.rejected.clone(),
            flagged: self.flagged.clone(),
        }
    }
}

/// Screen every raw entry. Pure: the same inputs give the same outcome.
///
/// Each entry ends up either accepted or rejected with exactly one reason.
/// A (city, restaurant) pair that was already accepted earlier in the file
/// is rejected as a duplicate; an earlier entry rejected for any reason
/// (strict mode included) does not block a later one.
pub fn validate_entries(
    raw: &[RawPriceEntry],
    restaurants: &[RestaurantRecord],
    reference: &ReferenceData,
    settings: &ValidationSettings,
    today: NaiveDate,
) -> ValidationOutcome {
    let ctx = RuleContext {
        reference,
        settings,
        today,
    };

    let screened: Vec<EntryOutcome> = raw
        .iter()
        .map(|entry| match screen(entry, &ctx) {
            Ok(validated) => EntryOutcome::Accepted(validated),
            Err(rejection) => EntryOutcome::Rejected(rejection),
        })
        .collect();

    // Outliers are measured over the first screened entry of each pair
    let mut first_seen = HashSet::new();
    let population = screened.iter().enumerate().filter_map(|(index, outcome)| match outcome {
        EntryOutcome::Accepted(entry)
            if first_seen.insert(restaurant_key(&entry.city, &entry.restaurant_name)) =>
        {
            Some((index, entry))
        }
        _ => None,
    });
    let mut outliers: HashMap<usize, Vec<Flag>> = HashMap::new();
    for (index, flag) in outlier_flags(population, settings.outlier_z) {
        outliers.entry(index).or_default().push(flag);
    }

    let known: HashSet<(String, String)> = restaurants.iter().map(RestaurantRecord::key).collect();
    let mut accepted_keys = HashSet::new();
    let mut result = ValidationOutcome::default();

    for (index, (outcome, raw_entry)) in screened.into_iter().zip(raw).enumerate() {
        let entry = match outcome {
            EntryOutcome::Rejected(rejection) => {
                result.rejected.push(rejection);
                continue;
            }
            EntryOutcome::Accepted(entry) => entry,
        };

        let key = restaurant_key(&entry.city, &entry.restaurant_name);
        if accepted_keys.contains(&key) {
            result.rejected.push(Rejection {
                reason: RejectionReason::DuplicateEntry,
                detail: format!(
                    "{} / {} already has an accepted entry",
                    entry.city, entry.restaurant_name
                ),
                entry: raw_entry.clone(),
            });
            continue;
        }

        let mut flags = entry_flags(&entry, &ctx, &known);
        flags.extend(outliers.remove(&index).unwrap_or_default());

        if !flags.is_empty() {
            let kinds: Vec<&str> = flags.iter().map(|f| f.kind.as_str()).collect();
            let detail = format!("strict mode: {}", kinds.join(", "));
            result.flagged.push(FlaggedEntry {
                city: entry.city.clone(),
                restaurant_name: entry.restaurant_name.clone(),
                flags,
            });

            if settings.strict {
                result.rejected.push(Rejection {
                    reason: RejectionReason::FlaggedStrict,
                    detail,
                    entry: raw_entry.clone(),
                });
                continue;
            }
        }

        accepted_keys.insert(key);
        result.accepted.push(entry);
    }

    result
}

/// Counts from one run, for the caller's summary line
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub flagged: usize,
}

/// Load inputs, validate, and write the validated file and rejection report
#[instrument(skip(config), fields(input = %config.paths.prices_raw.display()))]
pub fn run(config: &AppConfig, today: NaiveDate) -> Result<RunSummary, ValidateError> {
    let paths = &config.paths;
    let schemas = SchemaSet::load(paths.schemas_dir.as_deref())?;
    let reference = ReferenceData::load(paths, &schemas)?;

    if !paths.prices_raw.exists() {
        return Err(ValidateError::MissingInput {
            path: paths.prices_raw.clone(),
        });
    }
    let raw: Vec<RawPriceEntry> =
        load_entries(&paths.prices_raw, "prices", SchemaKind::RawPriceEntry, &schemas)?;
    info!(entries = raw.len(), "Loaded raw price entries");

    let restaurants: Vec<RestaurantRecord> = if paths.restaurants.exists() {
        load_entries(&paths.restaurants, "restaurants", SchemaKind::Restaurant, &schemas)?
    } else {
        warn!(
            path = %paths.restaurants.display(),
            "Restaurant list not found, skipping restaurant cross-reference"
        );
        Vec::new()
    };

    let outcome = validate_entries(&raw, &restaurants, &reference, &config.validation, today);

    for rejection in &outcome.rejected {
        warn!(
            city = %rejection.entry.city,
            restaurant = %rejection.entry.restaurant_name,
            reason = %rejection.reason,
            "{}",
            rejection.detail
        );
    }
    for flagged in &outcome.flagged {
        for flag in &flagged.flags {
            debug!(
                city = %flagged.city,
                restaurant = %flagged.restaurant_name,
                flag = %flag.kind,
                "{}",
                flag.detail
            );
        }
    }

    let document = ValidatedPriceDocument {
        validation_date: today,
        prices: outcome.accepted.clone(),
    };
    write_json(&paths.prices_validated, &document)?;
    write_json(&paths.rejection_report, &outcome.report(today))?;

    for (reason, count) in outcome.by_reason() {
        info!(reason = %reason, count, "Rejections");
    }
    info!(
        total = outcome.total(),
        accepted = outcome.accepted.len(),
        rejected = outcome.rejected.len(),
        flagged = outcome.flagged.len(),
        strict = config.validation.strict,
        output = %paths.prices_validated.display(),
        "Validation complete"
    );

    Ok(RunSummary {
        total: outcome.total(),
        accepted: outcome.accepted.len(),
        rejected: outcome.rejected.len(),
        flagged: outcome.flagged.len(),
    })
}
