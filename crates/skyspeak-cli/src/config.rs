//! CLI configuration file.
//!
//! A single JSON document; every section and field is optional:
//!
//! ```json
//! {
//!   "game": { "win_score": 5, "wrong_answer_policy": "reset_score" },
//!   "scoring": { "endpoint": "http://scorer.local/pronunciation/score" },
//!   "vad": { "threshold": 0.4 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use skyspeak_core::{GameSettings, validate_settings};
use skyspeak_voice::{ScoringConfig, VadConfig};

use crate::error::CliError;

/// Environment variable overriding the scoring endpoint.
pub const SCORING_URL_ENV: &str = "SKYSPEAK_SCORING_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub game: GameSettings,
    pub scoring: ScoringConfig,
    pub vad: VadConfig,
}

impl CliConfig {
    /// Load from `path` (defaults when `None`), apply the environment
    /// override and validate the game settings.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_scoring_url(std::env::var(SCORING_URL_ENV).ok());
        validate_settings(&config.game)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }

    /// Replace the scoring endpoint when `url` is set and non-empty.
    #[must_use]
    pub fn with_scoring_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(%url, "Scoring endpoint overridden from environment");
            self.scoring.endpoint = url;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use skyspeak_core::WrongAnswerPolicy;
    use skyspeak_voice::DEFAULT_SCORING_ENDPOINT;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"game": {{"win_score": 5, "wrong_answer_policy": "reset_score"}}}}"#
        )
        .unwrap();

        let config = CliConfig::from_file(file.path()).unwrap();
        assert_eq!(config.game.win_score, 5);
        assert_eq!(config.game.wrong_answer_policy, WrongAnswerPolicy::ResetScore);
        assert_eq!(config.game.initial_altitude, 10_000);
        assert_eq!(config.scoring.endpoint, DEFAULT_SCORING_ENDPOINT);
        assert_eq!(config.vad, VadConfig::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.exit_code(), 74);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = CliConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn invalid_settings_fail_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"game": {{"pass_mark": 140.0}}}}"#).unwrap();
        let err = CliConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn scoring_url_override() {
        let config = CliConfig::default().with_scoring_url(Some("http://scorer:9000/score".into()));
        assert_eq!(config.scoring.endpoint, "http://scorer:9000/score");

        let config = CliConfig::default().with_scoring_url(Some("  ".into()));
        assert_eq!(config.scoring.endpoint, DEFAULT_SCORING_ENDPOINT);
    }
}
