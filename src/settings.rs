//! Suite-wide defaults, optionally overridden by a leading `% globals` block.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::backend::{Backend, DEFAULT_BACKENDS};
use crate::directive::Payload;
use crate::errors::ConfigError;
use crate::paths::resolve;

/// Defaults every test block inherits.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteSettings {
    /// Directory holding golden files.
    pub datadir: PathBuf,
    /// Backends used by tests without a `% backends` directive.
    pub backends: Vec<Backend>,
}

impl SuiteSettings {
    /// Defaults for a configuration file living in `conf_dir`.
    pub fn new(conf_dir: &Path) -> Self {
        Self {
            datadir: conf_dir.to_path_buf(),
            backends: DEFAULT_BACKENDS.to_vec(),
        }
    }

    /// Applies a `% globals` payload. Only `datadir` is recognized; other keys
    /// are ignored.
    pub fn apply_globals(&mut self, payload: &Payload<'_>, conf_dir: &Path) -> Result<(), ConfigError> {
        let literal = payload.literal()?;
        let entries = payload.expect_map(&literal)?;
        for (key, value) in entries {
            match key.as_str() {
                "datadir" => {
                    let dir = payload.expect_str(value, "a directory path string")?;
                    self.datadir = resolve(conf_dir, dir);
                    debug!("globals: datadir = {}", self.datadir.display());
                }
                other => warn!("globals: ignoring unknown setting '{}'", other),
            }
        }
        Ok(())
    }
}
