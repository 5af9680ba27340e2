// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RetestError};
use crate::watch::SkipRules;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RetestError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_watch_section(&raw)?;
        validate_runner_section(&raw)?;
        let rules = SkipRules::new(&raw.watch.skip, &raw.watch.source_patterns)
            .map_err(|e| RetestError::ConfigError(format!("[watch]: {e:#}")))?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.runner, rules))
    }
}

fn validate_watch_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.interval_ms == 0 {
        return Err(RetestError::ConfigError(
            "[watch].interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.watch.source_patterns.is_empty() {
        return Err(RetestError::ConfigError(
            "[watch].source_patterns must contain at least one pattern".to_string(),
        ));
    }

    Ok(())
}

fn validate_runner_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.bin.trim().is_empty() {
        return Err(RetestError::ConfigError(
            "[runner].bin must not be empty".to_string(),
        ));
    }

    if let Some(root) = &cfg.runner.scratch_root {
        if root.as_os_str().is_empty() {
            return Err(RetestError::ConfigError(
                "[runner].scratch_root must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}
