//! Document-level schema checks
//!
//! Every input document is checked against a JSON Schema before it is
//! deserialized, so a malformed file stops the run with the location of
//! each violation instead of a bare serde error. The schemas ship embedded
//! in the binary; a configured directory can override them file by file.

use crate::errors::{AppError, Result, SchemaViolation};
use jsonschema::Validator;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Record and document types with a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Restaurant,
    RawPriceEntry,
    ValidatedPriceEntry,
    CityList,
    MinimumWageTable,
    Blocklist,
    CityFinal,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 7] = [
        SchemaKind::Restaurant,
        SchemaKind::RawPriceEntry,
        SchemaKind::ValidatedPriceEntry,
        SchemaKind::CityList,
        SchemaKind::MinimumWageTable,
        SchemaKind::Blocklist,
        SchemaKind::CityFinal,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            SchemaKind::Restaurant => "restaurant_raw.schema.json",
            SchemaKind::RawPriceEntry => "price_entry.schema.json",
            SchemaKind::ValidatedPriceEntry => "price_entry_validated.schema.json",
            SchemaKind::CityList => "cities.schema.json",
            SchemaKind::MinimumWageTable => "minimum_wage.schema.json",
            SchemaKind::Blocklist => "blocklist.schema.json",
            SchemaKind::CityFinal => "city_final.schema.json",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            SchemaKind::Restaurant => include_str!("../../../../schemas/restaurant_raw.schema.json"),
            SchemaKind::RawPriceEntry => include_str!("../../../../schemas/price_entry.schema.json"),
            SchemaKind::ValidatedPriceEntry => {
                include_str!("../../../../schemas/price_entry_validated.schema.json")
            }
            SchemaKind::CityList => include_str!("../../../../schemas/cities.schema.json"),
            SchemaKind::MinimumWageTable => include_str!("../../../../schemas/minimum_wage.schema.json"),
            SchemaKind::Blocklist => include_str!("../../../../schemas/blocklist.schema.json"),
            SchemaKind::CityFinal => include_str!("../../../../schemas/city_final.schema.json"),
        }
    }
}

/// Compiled validators for every schema kind
pub struct SchemaSet {
    validators: HashMap<SchemaKind, Validator>,
}

impl SchemaSet {
    /// Compile the schemas embedded in the binary
    pub fn embedded() -> Result<Self> {
        Self::load(None)
    }

    /// Compile schemas, preferring files in `dir` over the embedded copies
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut validators = HashMap::with_capacity(SchemaKind::ALL.len());

        for kind in SchemaKind::ALL {
            let override_path = dir
                .map(|dir| dir.join(kind.file_name()))
                .filter(|path| path.is_file());

            let schema: Value = match override_path {
                Some(path) => {
                    debug!(schema = kind.file_name(), path = %path.display(), "Using schema override");
                    crate::files::read_json(&path)?
                }
                None => serde_json::from_str(kind.embedded())?,
            };

            let validator = jsonschema::validator_for(&schema).map_err(|e| AppError::Configuration {
                message: format!("Schema {} does not compile: {}", kind.file_name(), e),
            })?;
            validators.insert(kind, validator);
        }

        Ok(Self { validators })
    }

    /// Violations of `kind` in `instance`, each tagged with `location` and
    /// the JSON pointer of the failing value inside it
    pub fn violations(&self, kind: SchemaKind, instance: &Value, location: &str) -> Vec<SchemaViolation> {
        match self.validators.get(&kind) {
            Some(validator) => validator
                .iter_errors(instance)
                .map(|error| SchemaViolation {
                    location: field_location(location, error.instance_path.as_str()),
                    message: error.to_string(),
                })
                .collect(),
            None => vec![SchemaViolation {
                location: location.to_string(),
                message: format!("no schema loaded for {:?}", kind),
            }],
        }
    }

    /// Check a whole document, failing with every violation found
    pub fn check_document(&self, kind: SchemaKind, path: &Path, document: &Value) -> Result<()> {
        let violations = self.violations(kind, document, "(root)");
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::SchemaViolation {
                path: path.to_path_buf(),
                violations,
            })
        }
    }

    /// Check each element of an entry array, locating violations as `key[i]`
    pub fn check_entries(&self, kind: SchemaKind, path: &Path, key: &str, entries: &[Value]) -> Result<()> {
        let violations: Vec<SchemaViolation> = entries
            .iter()
            .enumerate()
            .flat_map(|(index, entry)| self.violations(kind, entry, &entry_location(key, index, entry)))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::SchemaViolation {
                path: path.to_path_buf(),
                violations,
            })
        }
    }
}

/// `prices[3] (La Banquise) at /prices/regular`; the pointer is omitted
/// when the whole instance failed
fn field_location(location: &str, pointer: &str) -> String {
    match (location, pointer) {
        (_, "") => location.to_string(),
        ("(root)", _) => pointer.to_string(),
        _ => format!("{} at {}", location, pointer),
    }
}

/// `prices[3]`, with the restaurant name appended when the entry has one
fn entry_location(key: &str, index: usize, entry: &Value) -> String {
    let name = entry
        .get("restaurant_name")
        .or_else(|| entry.get("name"))
        .and_then(Value::as_str);
    match name {
        Some(name) => format!("{}[{}] ({})", key, index, name),
        None => format!("{}[{}]", key, index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_embedded_schemas_compile() {
        assert!(SchemaSet::embedded().is_ok());
    }

    #[test]
    fn test_raw_entry_missing_confidence_is_located() {
        let schemas = SchemaSet::embedded().unwrap();
        let entries = vec![
            json!({
                "city": "Montreal",
                "restaurant_name": "La Banquise",
                "extraction_date": "2026-09-30",
                "prices": { "regular": 14.5 },
                "confidence": "high"
            }),
            json!({
                "city": "Montreal",
                "restaurant_name": "Poutineville",
                "extraction_date": "2026-09-30",
                "prices": { "regular": 13.95 }
            }),
        ];

        let err = schemas
            .check_entries(SchemaKind::RawPriceEntry, &PathBuf::from("prices_raw.json"), "prices", &entries)
            .unwrap_err();
        match err {
            AppError::SchemaViolation { violations, .. } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].location, "prices[1] (Poutineville)");
                assert!(violations[0].message.contains("confidence"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_price_type_is_a_violation() {
        let schemas = SchemaSet::embedded().unwrap();
        let entry = json!({
            "city": "Montreal",
            "restaurant_name": "La Banquise",
            "extraction_date": "2026-09-30",
            "prices": { "regular": "14.50" },
            "confidence": "high"
        });
        let violations = schemas.violations(SchemaKind::RawPriceEntry, &entry, "prices[0]");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, "prices[0] at /prices/regular");
        assert!(violations[0].message.contains("number"));
    }

    #[test]
    fn test_document_violation_points_at_field() {
        let schemas = SchemaSet::embedded().unwrap();
        let doc = json!({ "cities": [{ "name": "Halifax", "province": "NS", "lat": "44.6", "lon": -63.5 }] });
        let violations = schemas.violations(SchemaKind::CityList, &doc, "(root)");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, "/cities/0/lat");
    }

    #[test]
    fn test_null_prices_pass_the_raw_schema() {
        // Missing data is a per-entry rejection, not a document error
        let schemas = SchemaSet::embedded().unwrap();
        let entry = json!({
            "city": "Vancouver",
            "restaurant_name": "Nom Nom's Poutine",
            "source_url": null,
            "extraction_date": "2026-09-25",
            "prices": { "small": null, "regular": null, "large": null },
            "notes": null,
            "confidence": "low"
        });
        assert!(schemas.violations(SchemaKind::RawPriceEntry, &entry, "prices[0]").is_empty());
    }

    #[test]
    fn test_override_dir_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SchemaKind::Blocklist.file_name()),
            r#"{"type": "object", "required": ["patterns"]}"#,
        )
        .unwrap();

        let schemas = SchemaSet::load(Some(dir.path())).unwrap();
        let doc = json!({ "chains": ["kfc"] });
        assert!(!schemas.violations(SchemaKind::Blocklist, &doc, "(root)").is_empty());
        // Kinds without an override still use the embedded schema
        let cities = json!({ "cities": [] });
        assert!(schemas.violations(SchemaKind::CityList, &cities, "(root)").is_empty());
    }
}
