//! JSON file I/O for pipeline documents
//!
//! Reading: parse, schema-check, then deserialize. Any failure is fatal.
//! Writing: pretty-printed with a trailing newline, written to a sibling
//! temp file and renamed over the target so a previous output is replaced
//! whole or not at all.

use crate::errors::{AppError, Result, SchemaViolation};
use crate::schema::{SchemaKind, SchemaSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read and parse a JSON file
pub fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| AppError::unreadable(path, e))?;
    serde_json::from_str(&text).map_err(|source| AppError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a single document checked against `kind`
pub fn load_document<T: DeserializeOwned>(path: &Path, kind: SchemaKind, schemas: &SchemaSet) -> Result<T> {
    let value = read_json(path)?;
    schemas.check_document(kind, path, &value)?;
    from_value(path, "(root)", value)
}

/// Load an entry list stored either as `{ "<key>": [...] }` or as a bare array.
///
/// Each entry is checked against `kind` before any is deserialized.
pub fn load_entries<T: DeserializeOwned>(
    path: &Path,
    key: &str,
    kind: SchemaKind,
    schemas: &SchemaSet,
) -> Result<Vec<T>> {
    let value = read_json(path)?;
    let entries = extract_entries(path, key, value)?;
    schemas.check_entries(kind, path, key, &entries)?;

    let parsed = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| from_value(path, &format!("{}[{}]", key, index), entry))
        .collect::<Result<Vec<T>>>()?;

    debug!(path = %path.display(), count = parsed.len(), "Loaded entries");
    Ok(parsed)
}

/// The entry array of a wrapped or bare list document
pub fn extract_entries(path: &Path, key: &str, value: Value) -> Result<Vec<Value>> {
    let violation = |message: String| AppError::SchemaViolation {
        path: path.to_path_buf(),
        violations: vec![SchemaViolation {
            location: "(root)".to_string(),
            message,
        }],
    };

    match value {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(entries)) => Ok(entries),
            Some(Value::Null) | None => Err(violation(format!("\"{}\" array is missing", key))),
            Some(_) => Err(violation(format!("\"{}\" is not an array", key))),
        },
        _ => Err(violation(format!(
            "expected an array or an object with a \"{}\" array",
            key
        ))),
    }
}

fn from_value<T: DeserializeOwned>(path: &Path, location: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AppError::SchemaViolation {
        path: path.to_path_buf(),
        violations: vec![SchemaViolation {
            location: location.to_string(),
            message: e.to_string(),
        }],
    })
}

/// Write `value` as pretty JSON, replacing any previous file at `path`
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');

    let write_failed = |source| AppError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, text).map_err(write_failed)?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        write_failed(source)
    })?;

    debug!(path = %path.display(), "Wrote document");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::RawPriceEntry;
    use serde_json::json;

    fn entry(name: &str) -> Value {
        json!({
            "city": "Montreal",
            "restaurant_name": name,
            "source_url": null,
            "extraction_date": "2026-09-30",
            "prices": { "small": null, "regular": 14.5, "large": null },
            "notes": null,
            "confidence": "high"
        })
    }

    #[test]
    fn test_load_entries_accepts_wrapped_and_bare() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = SchemaSet::embedded().unwrap();

        let wrapped = dir.path().join("wrapped.json");
        fs::write(&wrapped, json!({ "prices": [entry("La Banquise")] }).to_string()).unwrap();
        let bare = dir.path().join("bare.json");
        fs::write(&bare, json!([entry("La Banquise"), entry("Poutineville")]).to_string()).unwrap();

        let a: Vec<RawPriceEntry> = load_entries(&wrapped, "prices", SchemaKind::RawPriceEntry, &schemas).unwrap();
        let b: Vec<RawPriceEntry> = load_entries(&bare, "prices", SchemaKind::RawPriceEntry, &schemas).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].restaurant_name, "Poutineville");
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = SchemaSet::embedded().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"prices\": [ ").unwrap();

        let err = load_entries::<RawPriceEntry>(&path, "prices", SchemaKind::RawPriceEntry, &schemas).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidJson);
    }

    #[test]
    fn test_missing_key_is_schema_violation() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = SchemaSet::embedded().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(&path, "{ \"entries\": [] }").unwrap();

        let err = load_entries::<RawPriceEntry>(&path, "prices", SchemaKind::RawPriceEntry, &schemas).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SchemaViolation);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_json(Path::new("/nonexistent/prices_raw.json")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileNotFound);
    }

    #[test]
    fn test_write_json_replaces_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("cities_final.json");

        write_json(&path, &json!({ "run": 1, "extra": true })).unwrap();
        write_json(&path, &json!({ "run": 2 })).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({ "run": 2 }));
        assert!(!temp_path(&path).exists());
    }
}
