//! Shared CLI helpers

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};
use vesta_core::{NodeId, VestaConfig};

/// Load the configuration for this invocation
///
/// A missing config file falls back to defaults; environment overrides apply
/// either way and `--node-id` wins over both.
pub fn load_config(path: &Path, node_id: Option<&str>) -> Result<VestaConfig> {
    let mut config = if path.exists() {
        info!(path = %path.display(), "loading configuration");
        VestaConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        VestaConfig::default()
    };

    config.merge_with_env()?;
    if let Some(node_id) = node_id {
        config.node.node_id = NodeId::new(node_id);
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_uses_defaults_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml"), Some("B")).unwrap();
        assert_eq!(config.node.node_id, NodeId::new("B"));
        assert_eq!(config.version_oracle.batch_size, 1024);
    }

    #[test]
    fn file_settings_are_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[version_oracle]\nbatch_size = 16").unwrap();

        let config = load_config(file.path(), Some("C")).unwrap();
        assert_eq!(config.version_oracle.batch_size, 16);
        assert_eq!(config.node.node_id, NodeId::new("C"));
    }

    #[test]
    fn empty_node_override_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml"), Some(" ")).is_err());
    }
}
