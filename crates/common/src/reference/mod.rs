//! Reference data loading
//!
//! Loads the target city list, the minimum-wage table, and the fast-food
//! blocklist once per run. Each file is schema-checked, then its fields are
//! validated (coordinates inside Canada, real province codes, positive
//! wages). Any problem is fatal.

use crate::config::PathsConfig;
use crate::errors::{AppError, Result};
use crate::files::load_document;
use crate::models::{Blocklist, BlocklistDocument, CityList, CityReference, MinimumWageTable};
use crate::schema::{SchemaKind, SchemaSet};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Read-only reference state for one run
#[derive(Debug, Clone)]
pub struct ReferenceData {
    /// Target cities in configured order
    pub cities: Vec<CityReference>,
    pub wages: MinimumWageTable,
    pub blocklist: Blocklist,
}

impl ReferenceData {
    /// Load all three reference files named in `paths`
    pub fn load(paths: &PathsConfig, schemas: &SchemaSet) -> Result<Self> {
        let cities = load_cities(&paths.cities, schemas)?;
        let wages = load_minimum_wages(&paths.minimum_wages, schemas)?;
        let blocklist = load_blocklist(&paths.blocklist, schemas)?;

        info!(
            cities = cities.len(),
            provinces_with_wages = wages.wages.len(),
            blocklist_patterns = blocklist.len(),
            "Reference data loaded"
        );

        Ok(Self {
            cities,
            wages,
            blocklist,
        })
    }

    /// The configured city with exactly this name
    pub fn city(&self, name: &str) -> Option<&CityReference> {
        self.cities.iter().find(|c| c.name == name)
    }

    pub fn is_target_city(&self, name: &str) -> bool {
        self.city(name).is_some()
    }
}

pub fn load_cities(path: &Path, schemas: &SchemaSet) -> Result<Vec<CityReference>> {
    let list: CityList = load_document(path, SchemaKind::CityList, schemas)?;

    let mut seen = HashSet::with_capacity(list.cities.len());
    for city in &list.cities {
        city.validate().map_err(|e| AppError::InvalidReferenceData {
            path: path.to_path_buf(),
            message: format!("city {}: {}", city.name, e),
        })?;
        if !seen.insert(city.name.as_str()) {
            return Err(AppError::DuplicateCity {
                city: city.name.clone(),
            });
        }
    }

    Ok(list.cities)
}

pub fn load_minimum_wages(path: &Path, schemas: &SchemaSet) -> Result<MinimumWageTable> {
    let table: MinimumWageTable = load_document(path, SchemaKind::MinimumWageTable, schemas)?;

    for (province, wage) in &table.wages {
        wage.validate().map_err(|e| AppError::InvalidReferenceData {
            path: path.to_path_buf(),
            message: format!("province {}: {}", province, e),
        })?;
    }

    Ok(table)
}

pub fn load_blocklist(path: &Path, schemas: &SchemaSet) -> Result<Blocklist> {
    let doc: BlocklistDocument = load_document(path, SchemaKind::Blocklist, schemas)?;
    Ok(Blocklist::from(doc))
}
