//! Poutine Index Schema Check
//!
//! Checks every configured data file that exists against its JSON Schema
//! and prints the violations found. Exits non-zero if any file fails.

use clap::Parser;
use poutine_common::config::{ObservabilityConfig, PathsConfig};
use poutine_common::errors::{AppError, SchemaViolation};
use poutine_common::files::{extract_entries, read_json};
use poutine_common::telemetry::init_tracing;
use poutine_common::{AppConfig, SchemaKind, SchemaSet, VERSION};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

/// Violations printed per file before the rest are summarised
const MAX_SHOWN: usize = 10;

#[derive(Parser)]
#[command(name = "check-schemas")]
#[command(about = "Check pipeline data files against their JSON Schemas")]
#[command(version)]
struct Cli {
    /// Extra TOML configuration file layered over config/
    #[arg(long, env = "POUTINE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of schema files (overrides paths.schemas_dir)
    #[arg(long)]
    schemas_dir: Option<PathBuf>,
}

/// One data file and how to check it
#[derive(Debug, Clone, PartialEq)]
struct Target {
    path: PathBuf,
    kind: SchemaKind,
    /// Key of the entry array for list files; `None` checks the whole document
    entries_key: Option<&'static str>,
}

fn targets(paths: &PathsConfig) -> Vec<Target> {
    let document = |path: &Path, kind| Target {
        path: path.to_path_buf(),
        kind,
        entries_key: None,
    };
    let entries = |path: &Path, kind, key| Target {
        path: path.to_path_buf(),
        kind,
        entries_key: Some(key),
    };

    vec![
        document(&paths.cities, SchemaKind::CityList),
        document(&paths.minimum_wages, SchemaKind::MinimumWageTable),
        document(&paths.blocklist, SchemaKind::Blocklist),
        entries(&paths.restaurants, SchemaKind::Restaurant, "restaurants"),
        entries(&paths.prices_raw, SchemaKind::RawPriceEntry, "prices"),
        entries(&paths.prices_validated, SchemaKind::ValidatedPriceEntry, "prices"),
        document(&paths.cities_final, SchemaKind::CityFinal),
    ]
}

/// Violations in one file. Unreadable or unparseable files are errors.
fn check_target(target: &Target, schemas: &SchemaSet) -> Result<Vec<SchemaViolation>, AppError> {
    let value = read_json(&target.path)?;

    let outcome = match target.entries_key {
        Some(key) => extract_entries(&target.path, key, value)
            .and_then(|entries| schemas.check_entries(target.kind, &target.path, key, &entries)),
        None => schemas.check_document(target.kind, &target.path, &value),
    };

    match outcome {
        Ok(()) => Ok(Vec::new()),
        Err(AppError::SchemaViolation { violations, .. }) => Ok(violations),
        Err(other) => Err(other),
    }
}

fn print_violations(path: &Path, violations: &[SchemaViolation]) {
    println!("FAIL {} ({} violations)", path.display(), violations.len());
    for violation in violations.iter().take(MAX_SHOWN) {
        println!("  {}", violation);
    }
    if violations.len() > MAX_SHOWN {
        println!("  ... and {} more", violations.len() - MAX_SHOWN);
    }
}

/// Check every existing target; returns the number of failing files
fn check_all(targets: &[Target], schemas: &SchemaSet) -> usize {
    let mut failed = 0;

    for target in targets {
        if !target.path.exists() {
            info!(path = %target.path.display(), "Skipping missing file");
            continue;
        }

        match check_target(target, schemas) {
            Ok(violations) if violations.is_empty() => println!("ok   {}", target.path.display()),
            Ok(violations) => {
                warn!(path = %target.path.display(), violations = violations.len(), "Schema check failed");
                print_violations(&target.path, &violations);
                failed += 1;
            }
            Err(e) => {
                warn!(path = %target.path.display(), error = %e, "File could not be checked");
                println!("FAIL {} ({})", target.path.display(), e);
                failed += 1;
            }
        }
    }

    failed
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(error = %err, "Run aborted");
            eprintln!("check-schemas: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<usize> {
    let config = AppConfig::load_with(cli.config.as_deref());
    init_tracing(
        config
            .as_ref()
            .map(|c| &c.observability)
            .unwrap_or(&ObservabilityConfig::default()),
    );
    let config = config?;

    info!("Starting Poutine Index schema check v{}", VERSION);

    let schemas_dir = cli.schemas_dir.or_else(|| config.paths.schemas_dir.clone());
    let schemas = SchemaSet::load(schemas_dir.as_deref())?;

    let failed = check_all(&targets(&config.paths), &schemas);
    if failed > 0 {
        println!("{} file(s) failed the schema check", failed);
    }
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn write(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_valid_city_list_passes() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target {
            path: write(
                dir.path(),
                "cities.json",
                json!({ "cities": [{ "name": "Halifax", "province": "NS", "lat": 44.6488, "lon": -63.5752 }] }),
            ),
            kind: SchemaKind::CityList,
            entries_key: None,
        };
        let schemas = SchemaSet::embedded().unwrap();
        assert!(check_target(&target, &schemas).unwrap().is_empty());
    }

    #[test]
    fn test_entry_violations_are_located() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target {
            path: write(
                dir.path(),
                "prices_raw.json",
                json!([
                    {
                        "city": "Halifax",
                        "restaurant_name": "Willy's",
                        "extraction_date": "2026-10-01",
                        "prices": { "regular": 12.0 },
                        "confidence": "low"
                    },
                    {
                        "city": "Halifax",
                        "restaurant_name": "Bad Entry",
                        "extraction_date": "2026-10-01",
                        "prices": { "regular": "twelve" },
                        "confidence": "low"
                    }
                ]),
            ),
            kind: SchemaKind::RawPriceEntry,
            entries_key: Some("prices"),
        };
        let schemas = SchemaSet::embedded().unwrap();

        let violations = check_target(&target, &schemas).unwrap();
        assert!(!violations.is_empty());
        assert!(violations.iter().all(|v| v.location.starts_with("prices[1]")));
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            cities: dir.path().join("a.json"),
            minimum_wages: dir.path().join("b.json"),
            blocklist: dir.path().join("c.json"),
            restaurants: dir.path().join("d.json"),
            prices_raw: dir.path().join("e.json"),
            prices_validated: dir.path().join("f.json"),
            rejection_report: dir.path().join("g.json"),
            cities_final: dir.path().join("h.json"),
            schemas_dir: None,
        };
        let schemas = SchemaSet::embedded().unwrap();
        assert_eq!(check_all(&targets(&paths), &schemas), 0);
    }

    #[test]
    fn test_broken_json_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocklist.json");
        fs::write(&path, "{ \"chains\": [").unwrap();
        let targets = vec![Target {
            path,
            kind: SchemaKind::Blocklist,
            entries_key: None,
        }];
        let schemas = SchemaSet::embedded().unwrap();
        assert_eq!(check_all(&targets, &schemas), 1);
    }

    #[test]
    fn test_shipped_data_passes() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let paths = PathsConfig {
            cities: root.join("data/cities.json"),
            minimum_wages: root.join("data/minimum_wages.json"),
            blocklist: root.join("data/fast_food_blocklist.json"),
            restaurants: root.join("data/restaurants_raw.json"),
            prices_raw: root.join("data/prices_raw.json"),
            ..PathsConfig::default()
        };
        let schemas = SchemaSet::embedded().unwrap();
        let shipped: Vec<Target> = targets(&paths).into_iter().take(5).collect();
        assert_eq!(check_all(&shipped, &schemas), 0);
    }
}
