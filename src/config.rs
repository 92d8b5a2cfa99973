//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/depprune/depprune.toml`
//! 3. Local config: file passed with `--config`
//! 4. Environment variables: `DEPPRUNE_*` prefix

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{expand_env_vars, EmptyTreePolicy, OrphanModifierPolicy, PrunerOptions};

const ENV_PREFIX: &str = "DEPPRUNE";

/// Pruning pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PrunerSettings {
    /// Adjective without a noun above it: "discard" or "reject"
    pub orphan_modifier: OrphanModifierPolicy,
    /// Everything pruned away: "allow" or "reject"
    pub empty_tree: EmptyTreePolicy,
    /// Tags an adjective may be folded into
    pub noun_tags: Vec<String>,
    /// Check tree invariants before pruning
    pub validate_input: bool,
}

impl Default for PrunerSettings {
    fn default() -> Self {
        let options = PrunerOptions::default();
        Self {
            orphan_modifier: options.orphan_modifier,
            empty_tree: options.empty_tree,
            noun_tags: options.noun_tags,
            validate_input: options.validate_input,
        }
    }
}

/// Raw pruner config for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawPrunerSettings {
    pub orphan_modifier: Option<OrphanModifierPolicy>,
    pub empty_tree: Option<EmptyTreePolicy>,
    pub noun_tags: Option<Vec<String>>,
    pub validate_input: Option<bool>,
}

/// Terminal output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputSettings {
    /// Print `(index|POS|deprel)` next to every label
    pub show_tags: bool,
    /// Print per-stage removal counts after each tree
    pub report: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputSettings {
    pub show_tags: Option<bool>,
    pub report: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub pruner: RawPrunerSettings,
    pub output: RawOutputSettings,
}

impl PrunerSettings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["NN", "NNS"], &["FW"])        // → ["FW", "NN", "NNS"]
    /// merge_array(&["NN", "NNS"], &["!NNS", "FW"]) // → ["FW", "NN"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for pattern in overlay {
            if let Some(negated) = pattern.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(pattern.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge overlay config onto self: scalars win if set, `noun_tags` unions.
    pub fn merge(&self, overlay: &RawPrunerSettings) -> Self {
        Self {
            orphan_modifier: overlay.orphan_modifier.unwrap_or(self.orphan_modifier),
            empty_tree: overlay.empty_tree.unwrap_or(self.empty_tree),
            noun_tags: overlay
                .noun_tags
                .as_ref()
                .map(|o| Self::merge_array(&self.noun_tags, o))
                .unwrap_or_else(|| self.noun_tags.clone()),
            validate_input: overlay.validate_input.unwrap_or(self.validate_input),
        }
    }

    /// Apply global config onto defaults; `noun_tags` is replaced, not merged.
    pub fn apply_global(&self, global: &RawPrunerSettings) -> Self {
        Self {
            orphan_modifier: global.orphan_modifier.unwrap_or(self.orphan_modifier),
            empty_tree: global.empty_tree.unwrap_or(self.empty_tree),
            noun_tags: global
                .noun_tags
                .clone()
                .unwrap_or_else(|| self.noun_tags.clone()),
            validate_input: global.validate_input.unwrap_or(self.validate_input),
        }
    }

    pub fn to_options(&self) -> PrunerOptions {
        PrunerOptions {
            orphan_modifier: self.orphan_modifier,
            empty_tree: self.empty_tree,
            noun_tags: self.noun_tags.clone(),
            validate_input: self.validate_input,
        }
    }
}

impl OutputSettings {
    fn overlay(&self, raw: &RawOutputSettings) -> Self {
        Self {
            show_tags: raw.show_tags.unwrap_or(self.show_tags),
            report: raw.report.unwrap_or(self.report),
        }
    }
}

/// Unified configuration for depprune.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub pruner: PrunerSettings,
    pub output: OutputSettings,
}

/// Get the XDG config directory for depprune.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "depprune").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("depprune.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file (`~` and `$VAR` are expanded); must exist if given
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config (`noun_tags` REPLACES defaults)
    /// 3. Local config (`noun_tags` UNIONS with global, `!TAG` removes)
    /// 4. Environment variables: `DEPPRUNE_*` (REPLACE)
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("load: global config {}", global_path.display());
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(local) = local {
            let local_path = PathBuf::from(expand_env_vars(&local.to_string_lossy()));
            if !local_path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", local_path.display()),
                });
            }
            debug!("load: local config {}", local_path.display());
            let raw = load_raw_settings(&local_path)?;
            current = current.merge_with(&raw);
        }

        Self::apply_env_overrides(current, None)
    }

    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            pruner: self.pruner.apply_global(&global.pruner),
            output: self.output.overlay(&global.output),
        }
    }

    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            pruner: self.pruner.merge(&overlay.pruner),
            output: self.output.overlay(&overlay.output),
        }
    }

    /// Apply DEPPRUNE_* environment variables as explicit overrides.
    ///
    /// Nested keys use `__`, lists use `,`:
    /// `DEPPRUNE_PRUNER__NOUN_TAGS=NN,NNS`. `vars` replaces the process
    /// environment when given.
    pub fn apply_env_overrides(
        mut settings: Self,
        vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("pruner.noun_tags")
                .try_parsing(true)
                .source(vars),
        );

        let config = builder.build().map_err(config_err)?;

        if let Some(val) = optional(config.get_string("pruner.orphan_modifier"))? {
            settings.pruner.orphan_modifier = val.parse().map_err(config_msg)?;
        }
        if let Some(val) = optional(config.get_string("pruner.empty_tree"))? {
            settings.pruner.empty_tree = val.parse().map_err(config_msg)?;
        }
        if let Some(val) = optional(config.get::<Vec<String>>("pruner.noun_tags"))? {
            settings.pruner.noun_tags = val;
        }
        if let Some(val) = optional(config.get_bool("pruner.validate_input"))? {
            settings.pruner.validate_input = val;
        }
        if let Some(val) = optional(config.get_bool("output.show_tags"))? {
            settings.output.show_tags = val;
        }
        if let Some(val) = optional(config.get_bool("output.report"))? {
            settings.output.report = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# depprune configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/depprune/depprune.toml
#   Local:  file given with --config
#   Env:    DEPPRUNE_* environment variables, e.g. DEPPRUNE_PRUNER__EMPTY_TREE=reject
#
# noun_tags in the local file UNIONS with the global list;
# use "!TAG" to remove an inherited tag.

[pruner]
# Adjective with no noun above it: "discard" (drop its label) or "reject" (fail)
# orphan_modifier = "discard"

# Question pruned down to nothing: "allow" or "reject"
# empty_tree = "allow"

# Tags an adjective is folded into
# noun_tags = ["NN", "NNS", "NNP", "NNPS"]

# Check tree structure before pruning
# validate_input = true

[output]
# show_tags = false
# report = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// An unset key is `None`; a value that does not convert is an error.
fn optional<T>(result: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_msg(message: String) -> ApplicationError {
    ApplicationError::Config { message }
}
