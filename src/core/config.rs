//! Calculator configuration with documented defaults
//!
//! Configuration is an explicit value handed to the session; there is no
//! process-wide config instance.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::types::Skill;

/// Error type for configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the banked experience session
#[derive(Debug, Clone, PartialEq)]
pub struct BankedConfig {
    /// Directory holding the persisted JSON maps
    pub data_dir: PathBuf,

    /// Optional catalog file replacing the embedded default catalog
    pub catalog_path: Option<PathBuf>,

    /// Longest conversion chain the resolver will follow
    ///
    /// Real chains are short (raw -> intermediate -> finished is three
    /// items). Anything longer than this points at a catalog error and
    /// aborts the resolution pass.
    pub max_chain_depth: usize,

    /// Only consider activities the player currently has the level for
    ///
    /// When set, candidates whose required level exceeds the entry in
    /// `skill_levels` are dropped before the candidate count is taken, so
    /// an item can become unambiguous once the higher-level option is
    /// filtered out.
    pub limit_to_current_level: bool,

    /// Current skill levels, used with `limit_to_current_level`
    ///
    /// Skills missing from this map are treated as level 1.
    pub skill_levels: BTreeMap<Skill, u32>,

    /// Write container, owned and banked maps after every update
    pub persist_on_update: bool,
}

impl Default for BankedConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("output"),
            catalog_path: None,
            max_chain_depth: 32,
            limit_to_current_level: false,
            skill_levels: BTreeMap::new(),
            persist_on_update: true,
        }
    }
}

impl BankedConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(content)?;
        let config = toml_config.into_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chain_depth == 0 {
            return Err(ConfigError::Invalid("max_chain_depth must be at least 1".into()));
        }

        for (skill, level) in &self.skill_levels {
            if *level == 0 || *level > 99 {
                return Err(ConfigError::Invalid(format!(
                    "{} level ({}) must be between 1 and 99",
                    skill, level
                )));
            }
        }

        Ok(())
    }

    /// Current level for a skill (level 1 when not configured)
    pub fn level_of(&self, skill: Skill) -> u32 {
        self.skill_levels.get(&skill).copied().unwrap_or(1)
    }
}

/// TOML representation of the config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TomlConfig {
    data_dir: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    max_chain_depth: Option<usize>,
    limit_to_current_level: Option<bool>,
    skill_levels: BTreeMap<String, u32>,
    persist_on_update: Option<bool>,
}

impl TomlConfig {
    fn into_config(self) -> Result<BankedConfig, ConfigError> {
        let defaults = BankedConfig::default();

        let mut skill_levels = BTreeMap::new();
        for (name, level) in self.skill_levels {
            let skill = Skill::parse(&name)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown skill '{}'", name)))?;
            skill_levels.insert(skill, level);
        }

        Ok(BankedConfig {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            catalog_path: self.catalog_path,
            max_chain_depth: self.max_chain_depth.unwrap_or(defaults.max_chain_depth),
            limit_to_current_level: self
                .limit_to_current_level
                .unwrap_or(defaults.limit_to_current_level),
            skill_levels,
            persist_on_update: self.persist_on_update.unwrap_or(defaults.persist_on_update),
        })
    }
}
