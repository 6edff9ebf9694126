use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A manual alias mapping: raw brand spelling `key` resolves to `standard`.
///
/// Used for variants whose 3-character prefixes differ from the canonical
/// name, which prefix matching alone can never join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandSeed {
    pub key: String,
    pub standard: String,
}

impl BrandSeed {
    #[must_use]
    pub fn new(key: &str, standard: &str) -> Self {
        Self {
            key: key.to_string(),
            standard: standard.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandSeedFile {
    pub brands: Vec<BrandSeed>,
}

impl BrandSeedFile {
    /// Mappings registered when no seed file is configured.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            brands: vec![
                BrandSeed::new("문화통닭", "문화치킨"),
                BrandSeed::new("화락숯불바베큐치킨", "화락바베큐치킨"),
                BrandSeed::new("치킨포차킹", "치포킹"),
                BrandSeed::new("치킨포차킹치포킹", "치포킹"),
                BrandSeed::new(
                    "대박삼겹살김치찜&초대박등갈비김치찜",
                    "대박삼겹김치찜&초대박등갈비김치찜",
                ),
            ],
        }
    }
}

/// Load and validate brand seed mappings from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brand_seeds(path: &Path) -> Result<BrandSeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let seed_file: BrandSeedFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SeedFileParse)?;

    validate_seeds(&seed_file)?;

    Ok(seed_file)
}

fn validate_seeds(seed_file: &BrandSeedFile) -> Result<(), ConfigError> {
    let mut seen_keys = HashSet::new();

    for seed in &seed_file.brands {
        if seed.key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "seed key must be non-empty".to_string(),
            ));
        }

        if seed.standard.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "seed '{}' has an empty standard name",
                seed.key
            )));
        }

        let normalized: String = seed.key.chars().filter(|c| !c.is_whitespace()).collect();
        if !seen_keys.insert(normalized) {
            return Err(ConfigError::Validation(format!(
                "duplicate seed key: '{}'",
                seed.key
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
