#![deny(warnings)]

//! Data-driven mod packs that register extra operators and random events.
//!
//! A mod is a directory holding `metadata.yaml` and `catalog.yaml`. Operators
//! are plain records, so a mod never ships code: the catalog is merged into
//! the registry and the merged registry is revalidated as a whole.

use city_core::{Operator, OperatorRegistry, RandomEvent, SimError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Catalog schema this engine understands.
pub const ENGINE_SCHEMA_VERSION: u32 = 1;

/// Metadata for a mod package.
#[derive(Debug, Clone, Deserialize)]
pub struct ModMeta {
    pub id: String,
    pub name: String,
    pub version: String,
    pub engine_schema_version: u32,
    pub compat: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Operators and events contributed by one mod.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModCatalog {
    #[serde(default)]
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub events: Vec<RandomEvent>,
}

#[derive(Debug, Error)]
pub enum ModError {
    #[error("invalid metadata in {path}: {reason}")]
    InvalidMeta { path: PathBuf, reason: String },
    #[error("mod '{id}' targets schema {found}, engine supports {expected}")]
    SchemaMismatch { id: String, found: u32, expected: u32 },
    #[error("invalid catalog for mod '{id}': {source}")]
    Catalog {
        id: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("merged catalog rejected: {0}")]
    Rejected(#[from] SimError),
}

/// A mod whose metadata and catalog parsed successfully.
#[derive(Debug, Clone)]
pub struct LoadedMod {
    pub meta: ModMeta,
    pub dir: PathBuf,
    pub catalog: ModCatalog,
}

impl LoadedMod {
    /// Human-readable one-liner for listings, e.g. `Winter Relief 0.2.0 [compat >=0.1]`.
    pub fn label(&self) -> String {
        let mut label = format!("{} {}", self.meta.name, self.meta.version);
        if let Some(compat) = &self.meta.compat {
            label.push_str(&format!(" [compat {compat}]"));
        }
        label
    }
}

/// Scans a mods directory and merges packs into a registry.
pub struct ModLoader {
    root: PathBuf,
    mods: Vec<LoadedMod>,
}

impl ModLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mods: vec![],
        }
    }

    /// Load every mod directory under the root, in name order.
    ///
    /// Directories without `metadata.yaml` are skipped. A malformed pack or a
    /// schema mismatch is an error: a half-loaded mod set would make sessions
    /// irreproducible.
    pub fn load_all(&mut self) -> Result<usize, ModError> {
        let mut dirs = Vec::new();
        for ent in fs::read_dir(&self.root)? {
            let ent = ent?;
            if ent.file_type()?.is_dir() {
                dirs.push(ent.path());
            }
        }
        dirs.sort();

        self.mods.clear();
        for dir in dirs {
            let meta_path = dir.join("metadata.yaml");
            if !meta_path.exists() {
                warn!(dir = %dir.display(), "skipping directory without metadata.yaml");
                continue;
            }
            let meta: ModMeta =
                serde_yaml::from_str(&fs::read_to_string(&meta_path)?).map_err(|e| {
                    ModError::InvalidMeta {
                        path: meta_path.clone(),
                        reason: e.to_string(),
                    }
                })?;
            if meta.engine_schema_version != ENGINE_SCHEMA_VERSION {
                return Err(ModError::SchemaMismatch {
                    id: meta.id,
                    found: meta.engine_schema_version,
                    expected: ENGINE_SCHEMA_VERSION,
                });
            }
            let catalog_path = dir.join("catalog.yaml");
            let catalog = if catalog_path.exists() {
                serde_yaml::from_str(&fs::read_to_string(&catalog_path)?).map_err(|source| {
                    ModError::Catalog {
                        id: meta.id.clone(),
                        source,
                    }
                })?
            } else {
                ModCatalog::default()
            };
            info!(
                id = %meta.id,
                name = %meta.name,
                version = %meta.version,
                compat = meta.compat.as_deref().unwrap_or("any"),
                description = meta.description.as_deref().unwrap_or(""),
                dir = %dir.display(),
                operators = catalog.operators.len(),
                events = catalog.events.len(),
                "mod loaded"
            );
            self.mods.push(LoadedMod { meta, dir, catalog });
        }
        Ok(self.mods.len())
    }

    pub fn mods(&self) -> &[LoadedMod] {
        &self.mods
    }

    /// Registry extended with every loaded mod, in load order.
    pub fn apply(&self, base: &OperatorRegistry) -> Result<OperatorRegistry, ModError> {
        let operators = self
            .mods
            .iter()
            .flat_map(|m| m.catalog.operators.iter().cloned())
            .collect();
        let events = self
            .mods
            .iter()
            .flat_map(|m| m.catalog.events.iter().cloned())
            .collect();
        Ok(base.extended(operators, events)?)
    }
}
