//! Per-entry validation rules and warning flags
//!
//! Rules run in a fixed order and the first failure decides the rejection
//! reason. Flags never reject on their own; they are reported for review
//! and only matter in strict mode.

use chrono::NaiveDate;
use poutine_common::config::ValidationSettings;
use poutine_common::models::{
    restaurant_key, Confidence, Flag, FlagKind, RawPriceEntry, Rejection,
    RejectionReason, SizeBucket, ValidatedPriceEntry,
};
use poutine_common::ReferenceData;
use std::collections::{BTreeMap, HashSet};

/// Everything a rule may consult
pub struct RuleContext<'a> {
    pub reference: &'a ReferenceData,
    pub settings: &'a ValidationSettings,
    /// Run date; extraction dates after it are rejected
    pub today: NaiveDate,
}

/// Apply every per-entry rule, in order, to one entry
pub fn screen(entry: &RawPriceEntry, ctx: &RuleContext<'_>) -> Result<ValidatedPriceEntry, Rejection> {
    let reject = |reason: RejectionReason, detail: String| Rejection {
        reason,
        detail,
        entry: entry.clone(),
    };

    let city = entry.city.trim();
    if !ctx.reference.is_target_city(city) {
        return Err(reject(
            RejectionReason::UnknownCity,
            format!("'{}' is not a target city", entry.city),
        ));
    }

    if let Some(pattern) = ctx.reference.blocklist.matching(&entry.restaurant_name) {
        return Err(reject(
            RejectionReason::Blocklisted,
            format!("name matches blocklisted chain '{}'", pattern),
        ));
    }

    if !entry.prices.present().any(|(_, price)| price >= 0.0) {
        return Err(reject(
            RejectionReason::NoPriceData,
            "no size has a non-negative price".to_string(),
        ));
    }

    let ceiling = ctx.settings.price_ceiling;
    if let Some((size, price)) = entry
        .prices
        .present()
        .find(|(_, price)| !(0.0..=ceiling).contains(price))
    {
        return Err(reject(
            RejectionReason::PriceOutOfRange,
            format!("{} price {:.2} is outside 0.00-{:.2}", size, price, ceiling),
        ));
    }

    let confidence: Confidence = entry
        .confidence
        .parse()
        .map_err(|detail| reject(RejectionReason::InvalidConfidence, detail))?;

    let extraction_date = parse_iso_date(entry.extraction_date.trim()).ok_or_else(|| {
        reject(
            RejectionReason::InvalidExtractionDate,
            format!("'{}' is not a YYYY-MM-DD date", entry.extraction_date),
        )
    })?;
    if extraction_date > ctx.today {
        return Err(reject(
            RejectionReason::InvalidExtractionDate,
            format!("{} is in the future", extraction_date),
        ));
    }

    if let Some(url) = entry.source_url.as_deref() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(reject(
                RejectionReason::InvalidSourceUrl,
                format!("'{}' must start with http:// or https://", url),
            ));
        }
    }

    let restaurant_name = entry.restaurant_name.trim();
    if restaurant_name.is_empty() {
        return Err(reject(
            RejectionReason::InvalidRestaurantName,
            "restaurant name is blank".to_string(),
        ));
    }

    Ok(ValidatedPriceEntry {
        city: city.to_string(),
        restaurant_name: restaurant_name.to_string(),
        source_url: entry.source_url.clone(),
        extraction_date,
        prices: entry.prices,
        notes: entry.notes.clone(),
        confidence,
    })
}

/// Strict `YYYY-MM-DD`: unsigned four-digit year, zero-padded month and day
fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let shaped = text.len() == 10
        && text.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Flags that depend on the entry alone (plus the restaurant list)
pub fn entry_flags(
    entry: &ValidatedPriceEntry,
    ctx: &RuleContext<'_>,
    known_restaurants: &HashSet<(String, String)>,
) -> Vec<Flag> {
    let settings = ctx.settings;
    let prices = &entry.prices;
    let mut flags = Vec::new();

    if prices.regular.is_none() {
        flags.push(Flag {
            kind: FlagKind::MissingRegular,
            detail: "no regular size price".to_string(),
        });
    }

    for (size, price) in prices.present() {
        if price < settings.typical_min || price > settings.typical_max {
            flags.push(Flag {
                kind: FlagKind::AtypicalPrice,
                detail: format!(
                    "{} price {:.2} is outside the typical {:.2}-{:.2}",
                    size, price, settings.typical_min, settings.typical_max
                ),
            });
        }
    }

    for (smaller, larger) in [
        (SizeBucket::Small, SizeBucket::Regular),
        (SizeBucket::Regular, SizeBucket::Large),
    ] {
        if let (Some(a), Some(b)) = (prices.get(smaller), prices.get(larger)) {
            if a >= b {
                flags.push(Flag {
                    kind: FlagKind::SizeOrder,
                    detail: format!("{} ({:.2}) >= {} ({:.2})", smaller, a, larger, b),
                });
            }
        }
    }

    let age_days = (ctx.today - entry.extraction_date).num_days();
    if age_days > i64::from(settings.stale_days) {
        flags.push(Flag {
            kind: FlagKind::Stale,
            detail: format!(
                "extracted {} ({} days ago, limit {})",
                entry.extraction_date, age_days, settings.stale_days
            ),
        });
    }

    if !known_restaurants.is_empty()
        && !known_restaurants.contains(&restaurant_key(&entry.city, &entry.restaurant_name))
    {
        flags.push(Flag {
            kind: FlagKind::UnknownRestaurant,
            detail: "not in the restaurant list for this city".to_string(),
        });
    }

    flags
}

/// Regular prices further than `z` sample standard deviations from their
/// city's mean. Takes (index, entry) pairs and returns (index, flag).
pub fn outlier_flags<'e, I>(entries: I, z: f64) -> Vec<(usize, Flag)>
where
    I: IntoIterator<Item = (usize, &'e ValidatedPriceEntry)>,
{
    let mut by_city: BTreeMap<&str, Vec<(usize, f64)>> = BTreeMap::new();
    for (index, entry) in entries {
        if let Some(regular) = entry.prices.regular {
            by_city.entry(entry.city.as_str()).or_default().push((index, regular));
        }
    }

    let mut flags = Vec::new();
    for (city, prices) in by_city {
        if prices.len() < 3 {
            continue;
        }

        let values: Vec<f64> = prices.iter().map(|(_, p)| *p).collect();
        let mean = mean(&values);
        let stdev = sample_stdev(&values, mean);
        if stdev == 0.0 {
            continue;
        }

        for (index, price) in prices {
            let score = (price - mean).abs() / stdev;
            if score > z {
                flags.push((
                    index,
                    Flag {
                        kind: FlagKind::Outlier,
                        detail: format!(
                            "regular {:.2} is {:.1} std devs from the {} mean {:.2}",
                            price, score, city, mean
                        ),
                    },
                ));
            }
        }
    }

    flags.sort_by_key(|(index, _)| *index);
    flags
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_stdev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use poutine_common::models::{Blocklist, CityReference, MinimumWageTable, PriceSet};

    fn reference() -> ReferenceData {
        ReferenceData {
            cities: vec![CityReference {
                name: "Montreal".to_string(),
                province: "QC".to_string(),
                lat: 45.5017,
                lon: -73.5673,
            }],
            wages: MinimumWageTable::default(),
            blocklist: Blocklist::new(["mcdonald's", "smoke's poutinerie"]),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    fn raw(name: &str, prices: PriceSet) -> RawPriceEntry {
        RawPriceEntry {
            city: "Montreal".to_string(),
            restaurant_name: name.to_string(),
            source_url: Some("https://example.ca/menu".to_string()),
            extraction_date: "2026-10-01".to_string(),
            prices,
            notes: None,
            confidence: "high".to_string(),
        }
    }

    fn regular(price: f64) -> PriceSet {
        PriceSet {
            small: None,
            regular: Some(price),
            large: None,
        }
    }

    fn reason_for(entry: &RawPriceEntry) -> Option<RejectionReason> {
        let reference = reference();
        let settings = ValidationSettings::default();
        let ctx = RuleContext {
            reference: &reference,
            settings: &settings,
            today: today(),
        };
        screen(entry, &ctx).err().map(|r| r.reason)
    }

    #[test]
    fn test_valid_entry_is_normalized() {
        let reference = reference();
        let settings = ValidationSettings::default();
        let ctx = RuleContext {
            reference: &reference,
            settings: &settings,
            today: today(),
        };
        let mut entry = raw("  La Banquise ", regular(14.5));
        entry.confidence = "HIGH".to_string();

        let validated = screen(&entry, &ctx).unwrap();
        assert_eq!(validated.restaurant_name, "La Banquise");
        assert_eq!(validated.confidence, Confidence::High);
        assert_eq!(validated.extraction_date, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(validated.prices.small, None);
    }

    #[test]
    fn test_unknown_city() {
        let mut entry = raw("La Banquise", regular(14.5));
        entry.city = "Paris".to_string();
        assert_eq!(reason_for(&entry), Some(RejectionReason::UnknownCity));
    }

    #[test]
    fn test_blocklisted_case_insensitive() {
        let entry = raw("SMOKE'S POUTINERIE Downtown", regular(12.99));
        assert_eq!(reason_for(&entry), Some(RejectionReason::Blocklisted));
    }

    #[test]
    fn test_all_null_prices_is_no_price_data() {
        let entry = raw("La Banquise", PriceSet::default());
        assert_eq!(reason_for(&entry), Some(RejectionReason::NoPriceData));
    }

    #[test]
    fn test_only_negative_prices_is_no_price_data() {
        let entry = raw("La Banquise", regular(-3.0));
        assert_eq!(reason_for(&entry), Some(RejectionReason::NoPriceData));
    }

    #[test]
    fn test_negative_beside_valid_price_is_out_of_range() {
        let prices = PriceSet {
            small: Some(-1.0),
            regular: Some(12.0),
            large: None,
        };
        assert_eq!(
            reason_for(&raw("La Banquise", prices)),
            Some(RejectionReason::PriceOutOfRange)
        );
    }

    #[test]
    fn test_price_above_ceiling() {
        let entry = raw("La Banquise", regular(120.0));
        assert_eq!(reason_for(&entry), Some(RejectionReason::PriceOutOfRange));
        // Ceiling itself is allowed
        let entry = raw("La Banquise", regular(50.0));
        assert_eq!(reason_for(&entry), None);
    }

    #[test]
    fn test_invalid_confidence() {
        let mut entry = raw("La Banquise", regular(14.5));
        entry.confidence = "certain".to_string();
        assert_eq!(reason_for(&entry), Some(RejectionReason::InvalidConfidence));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        // Blocklisted, no prices, and bad confidence all at once
        let mut entry = raw("McDonald's", PriceSet::default());
        entry.confidence = "certain".to_string();
        assert_eq!(reason_for(&entry), Some(RejectionReason::Blocklisted));
    }

    #[test]
    fn test_extraction_date_rules() {
        let mut entry = raw("La Banquise", regular(14.5));
        entry.extraction_date = "30/09/2026".to_string();
        assert_eq!(reason_for(&entry), Some(RejectionReason::InvalidExtractionDate));

        entry.extraction_date = "2026-12-01".to_string();
        assert_eq!(reason_for(&entry), Some(RejectionReason::InvalidExtractionDate));

        // Signed and unpadded forms parse in chrono but break the output format
        for text in ["-0001-01-01", "+2026-09-30", "2026-9-30", "202-09-30"] {
            entry.extraction_date = text.to_string();
            assert_eq!(
                reason_for(&entry),
                Some(RejectionReason::InvalidExtractionDate),
                "{text}"
            );
        }

        entry.extraction_date = " 2026-09-30 ".to_string();
        assert_eq!(reason_for(&entry), None);
    }

    #[test]
    fn test_blank_restaurant_name() {
        let entry = raw("   ", regular(14.5));
        assert_eq!(reason_for(&entry), Some(RejectionReason::InvalidRestaurantName));
    }

    #[test]
    fn test_source_url_scheme() {
        let mut entry = raw("La Banquise", regular(14.5));
        entry.source_url = Some("labanquise.com/menu".to_string());
        assert_eq!(reason_for(&entry), Some(RejectionReason::InvalidSourceUrl));

        entry.source_url = None;
        assert_eq!(reason_for(&entry), None);
    }

    #[test]
    fn test_entry_flags() {
        let reference = reference();
        let settings = ValidationSettings::default();
        let ctx = RuleContext {
            reference: &reference,
            settings: &settings,
            today: today(),
        };
        let entry = ValidatedPriceEntry {
            city: "Montreal".to_string(),
            restaurant_name: "Chez Claudette".to_string(),
            source_url: None,
            extraction_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            prices: PriceSet {
                small: Some(4.0),
                regular: None,
                large: Some(3.5),
            },
            notes: None,
            confidence: Confidence::Low,
        };
        let known: HashSet<(String, String)> = [restaurant_key("Montreal", "La Banquise")].into_iter().collect();

        let kinds: Vec<FlagKind> = entry_flags(&entry, &ctx, &known).into_iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&FlagKind::MissingRegular));
        assert!(kinds.contains(&FlagKind::AtypicalPrice));
        assert!(kinds.contains(&FlagKind::Stale));
        assert!(kinds.contains(&FlagKind::UnknownRestaurant));
        // small and large are not adjacent sizes
        assert!(!kinds.contains(&FlagKind::SizeOrder));
    }

    #[test]
    fn test_empty_restaurant_list_skips_cross_reference() {
        let reference = reference();
        let settings = ValidationSettings::default();
        let ctx = RuleContext {
            reference: &reference,
            settings: &settings,
            today: today(),
        };
        let entry = screen(&raw("La Banquise", regular(14.5)), &ctx).unwrap();
        assert!(entry_flags(&entry, &ctx, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_outlier_flags() {
        let accepted = |price: f64| ValidatedPriceEntry {
            city: "Montreal".to_string(),
            restaurant_name: format!("Resto {}", price),
            source_url: None,
            extraction_date: today(),
            prices: regular(price),
            notes: None,
            confidence: Confidence::High,
        };
        let entries: Vec<ValidatedPriceEntry> = [12.0, 12.5, 13.0, 12.0, 12.5, 13.0, 24.0]
            .into_iter()
            .map(accepted)
            .collect();

        let flags = outlier_flags(entries.iter().enumerate(), 2.0);
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].0, 6);
        assert_eq!(flags[0].1.kind, FlagKind::Outlier);
    }

    #[test]
    fn test_outliers_need_three_prices() {
        let solo = ValidatedPriceEntry {
            city: "Montreal".to_string(),
            restaurant_name: "Solo".to_string(),
            source_url: None,
            extraction_date: today(),
            prices: regular(40.0),
            notes: None,
            confidence: Confidence::High,
        };
        assert!(outlier_flags([(0, &solo)], 2.0).is_empty());
    }
}
