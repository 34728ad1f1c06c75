use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::stage::DEFAULT_SAMPLES_PER_STAGE;

/// Settings for one conversion. Every key is optional in the TOML form.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Log to read; stdin when unset
    pub input: Option<PathBuf>,
    /// CSV to write
    pub output: Option<PathBuf>,
    /// Distinct samples each stage should contain
    pub expected_samples: usize,
    /// Fail on readings that precede the first stage start
    pub strict: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            expected_samples: DEFAULT_SAMPLES_PER_STAGE,
            strict: false,
        }
    }
}

/// Load a config file. Relative paths inside it resolve against its directory.
pub fn read_config(path: &Path) -> Result<SweepConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut config: SweepConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    if let Some(base) = path.parent() {
        config.input = config.input.map(|p| base.join(p));
        config.output = config.output.map(|p| base.join(p));
    }
    Ok(config)
}
