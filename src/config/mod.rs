pub mod types;

pub use types::{AnalysisDepth, Config, Policy, PolicySetConfig, RulesConfig};

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".iac-explain.toml";

/// Get the global config file path (~/.iac-explain.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (workspace/.iac-explain.toml)
pub fn local_config_path(workspace: &Path) -> PathBuf {
    workspace.join(CONFIG_FILE_NAME)
}

/// Read and parse a configuration file.
pub fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content)
        .map_err(|e| ConfigError::ParsingFailed(format!("{}: {}", path.display(), e)))?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Load configuration.
///
/// An explicit path must exist and parse. Otherwise the workspace config is
/// checked first, then the global one; unreadable files there are skipped
/// with a warning and the defaults are used.
pub fn load_config(explicit: Option<&Path>, workspace: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let candidates = workspace
        .map(local_config_path)
        .into_iter()
        .chain(global_config_path());

    for candidate in candidates {
        if !candidate.exists() {
            continue;
        }
        match read_config(&candidate) {
            Ok(config) => return Ok(config),
            Err(e) => log::warn!("Ignoring configuration: {}", e),
        }
    }

    Ok(Config::default())
}
