use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "ranctl.yaml";
pub const ENV_PREFIX: &str = "RANCTL";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Simulator state file for node commands
    pub state_file: PathBuf,
    /// Topology document for topo commands
    pub topo_file: PathBuf,
    /// PLMN ID given to a freshly created simulation
    pub plmn_id: u32,
    /// Reject unrecognized filter clauses instead of dropping them
    pub strict_filters: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("ransim-state.json"),
            topo_file: PathBuf::from("topo.yaml"),
            plmn_id: 314628,
            strict_filters: false,
        }
    }
}

/// Overrides taken from command-line flags.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub state_file: Option<PathBuf>,
    pub topo_file: Option<PathBuf>,
    pub strict_filters: bool,
}

impl RuntimeConfig {
    /// Layer defaults, the config file, `RANCTL_*` environment variables and
    /// CLI overrides, in that order.
    ///
    /// An explicit `path` must exist; the default `ranctl.yaml` is optional.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let defaults = RuntimeConfig::default();
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = ::config::Config::builder()
            .set_default("state_file", defaults.state_file.to_string_lossy().as_ref())?
            .set_default("topo_file", defaults.topo_file.to_string_lossy().as_ref())?
            .set_default("plmn_id", i64::from(defaults.plmn_id))?
            .set_default("strict_filters", defaults.strict_filters)?
            .add_source(file)
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Config: Failed to load configuration")?;

        let mut runtime: RuntimeConfig = settings
            .try_deserialize()
            .context("Config: Invalid configuration")?;
        runtime.apply(overrides);
        Ok(runtime)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(state_file) = &overrides.state_file {
            self.state_file = state_file.clone();
        }
        if let Some(topo_file) = &overrides.topo_file {
            self.topo_file = topo_file.clone();
        }
        self.strict_filters |= overrides.strict_filters;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_paths() {
        let mut config = RuntimeConfig::default();
        config.apply(&ConfigOverrides {
            state_file: Some(PathBuf::from("/tmp/state.json")),
            topo_file: None,
            strict_filters: true,
        });
        assert_eq!(config.state_file, PathBuf::from("/tmp/state.json"));
        assert_eq!(config.topo_file, PathBuf::from("topo.yaml"));
        assert!(config.strict_filters);
    }

    #[test]
    fn loads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranctl.yaml");
        std::fs::write(&path, "plmn_id: 138426\nstrict_filters: true\n").unwrap();

        let config = RuntimeConfig::load(Some(&path), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.plmn_id, 138426);
        assert!(config.strict_filters);
        assert_eq!(config.state_file, PathBuf::from("ransim-state.json"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yaml");
        assert!(RuntimeConfig::load(Some(&path), &ConfigOverrides::default()).is_err());
    }
}
