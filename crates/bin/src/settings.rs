//! Settings file and default locations.

use crate::error::{CliError, Result};
use bokslut::{Analyzer, ExtractorConfig, RedFlagConfig, TrendConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything configurable from a `--config` JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Extraction and plausibility checks
    pub(crate) extractor: ExtractorConfig,
    /// Red-flag thresholds
    pub(crate) red_flags: RedFlagConfig,
    /// Trend guardrails
    pub(crate) trend: TrendConfig,
}

impl Settings {
    /// Read settings from a file, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::Json {
            what: "settings file",
            source,
        })
    }

    /// Analyzer built from these settings.
    pub(crate) fn analyzer(&self) -> Result<Analyzer> {
        Ok(Analyzer::new(
            self.extractor.clone(),
            self.red_flags.clone(),
            self.trend.clone(),
        )?)
    }
}

/// Default cache directory.
///
/// - Linux: `~/.cache/bokslut/`
/// - macOS: `~/Library/Caches/bokslut/`
/// - Windows: `%LOCALAPPDATA%\bokslut\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bokslut")
}

/// Default record cache database.
pub(crate) fn default_cache_path() -> PathBuf {
    default_cache_dir().join("records.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert!(settings.extractor.allow_global_fallback);
        assert_eq!(settings.red_flags.low_solvency, 10.0);
        assert!(settings.analyzer().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"red_flags": {{"low_solvency": 15.0}}, "extractor": {{"overview_periods": 2}}}}"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.red_flags.low_solvency, 15.0);
        assert_eq!(settings.red_flags.revenue_decline, 20.0);
        assert_eq!(settings.extractor.overview_periods, 2);
        assert_eq!(settings.trend.max_growth, 500.0);
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"trend": {{"max_growth": -5.0}}}}"#).unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert!(matches!(
            settings.analyzer(),
            Err(CliError::Bokslut(bokslut::Error::Analysis(_)))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(CliError::Json { .. })
        ));
        assert!(matches!(
            Settings::load(Some(Path::new("/nonexistent/bokslut.json"))),
            Err(CliError::Io { .. })
        ));
    }

    #[test]
    fn test_default_cache_path() {
        let path = default_cache_path();
        assert!(path.ends_with("bokslut/records.db"));
    }
}
