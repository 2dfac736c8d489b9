//! Workspace configuration
//!
//! Loaded from TOML, then overlaid with `VESTA_*` environment variables, then
//! validated. Hook ordering is configuration, not code: each delete hook's
//! priority may be set under `[hooks.priorities]` by hook name.
//!
//! ```toml
//! [node]
//! node_id = "B"
//!
//! [version_oracle]
//! batch_size = 1024
//!
//! [hooks.priorities]
//! virtual-delete = 10000
//! ```

use crate::errors::{Result, VestaError};
use crate::identifiers::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env::VarError;
use std::path::Path;
use tracing::debug;

/// Environment variable overriding [`NodeConfig::node_id`]
pub const ENV_NODE_ID: &str = "VESTA_NODE_ID";

/// Environment variable overriding [`VersionOracleConfig::batch_size`]
pub const ENV_BATCH_SIZE: &str = "VESTA_VERSION_ORACLE_BATCH_SIZE";

fn env_override(
    key: &str,
    value: std::result::Result<String, VarError>,
) -> Result<Option<String>> {
    match value {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(VestaError::config(format!(
            "{key} is not valid UTF-8: {}",
            raw.to_string_lossy()
        ))),
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VestaConfig {
    /// Local node identity
    pub node: NodeConfig,
    /// Version allocation
    pub version_oracle: VersionOracleConfig,
    /// Delete hook ordering
    pub hooks: HookConfig,
}

/// Local node identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identifier written as `source` on revisions authored here
    pub node_id: NodeId,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: NodeId::new("local"),
        }
    }
}

/// Version allocation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionOracleConfig {
    /// Ids reserved from the persistent counter per refill
    pub batch_size: u64,
}

impl Default for VersionOracleConfig {
    fn default() -> Self {
        Self { batch_size: 1024 }
    }
}

/// Delete hook ordering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Hook name to priority; lower runs first
    pub priorities: BTreeMap<String, i32>,
}

impl HookConfig {
    /// Configured priority for `hook`, if any
    pub fn priority_for(&self, hook: &str) -> Option<i32> {
        self.priorities.get(hook).copied()
    }
}

impl VestaConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VestaError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, apply environment overrides, and validate
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `VESTA_*` environment variables
    ///
    /// Only the recognised keys are read, so unrelated variables that are not
    /// valid UTF-8 are ignored. A recognised key holding non-UTF-8 data is a
    /// configuration error.
    pub fn merge_with_env(&mut self) -> Result<()> {
        let mut overrides = Vec::new();
        for key in [ENV_NODE_ID, ENV_BATCH_SIZE] {
            if let Some(value) = env_override(key, std::env::var(key))? {
                overrides.push((key.to_string(), value));
            }
        }
        self.merge_with_vars(overrides)
    }

    /// Overlay overrides from an explicit variable list
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_NODE_ID => {
                    debug!(node_id = %value, "node id overridden from environment");
                    self.node.node_id = NodeId::new(value);
                }
                ENV_BATCH_SIZE => {
                    self.version_oracle.batch_size = value.parse().map_err(|_| {
                        VestaError::config(format!("{ENV_BATCH_SIZE} is not an integer: {value}"))
                    })?;
                    debug!(
                        batch_size = self.version_oracle.batch_size,
                        "batch size overridden from environment"
                    );
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Reject configurations the oracle or the converter cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.node.node_id.as_str().trim().is_empty() {
            return Err(VestaError::config("node.node_id must not be empty"));
        }
        if self.version_oracle.batch_size == 0 {
            return Err(VestaError::config(
                "version_oracle.batch_size must be at least 1",
            ));
        }
        Ok(())
    }
}
