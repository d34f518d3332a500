//! YAML configuration for the assistant
//!
//! ```yaml
//! offline: false
//! interpreter:
//!   default_altitude_m: 10
//!   default_distance_m: 10
//!   model:
//!     model: gemini-1.5-pro
//!     api_key_env: GEMINI_API_KEY
//!     request_timeout_secs: 30
//! vehicle:
//!   home_latitude: -35.363261
//!   home_longitude: 149.16523
//! ```

use anyhow::Context;
use intent_parser::IntentConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use vehicle_control::SimConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Skip the remote model and use keyword rules only
    pub offline: bool,
    pub interpreter: IntentConfig,
    pub vehicle: SimConfig,
}

impl AssistantConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("parsing config: {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssistantConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert!(!config.offline);
        assert_eq!(config.interpreter.default_altitude_m, 10.0);
        assert_eq!(config.interpreter.model.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_partial_yaml_merges_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "offline: true\ninterpreter:\n  default_altitude_m: 25\n  model:\n    request_timeout_secs: 30\nvehicle:\n  home_latitude: 51.5"
        )
        .unwrap();

        let config = AssistantConfig::load(file.path()).unwrap();
        assert!(config.offline);
        assert_eq!(config.interpreter.default_altitude_m, 25.0);
        assert_eq!(config.interpreter.default_distance_m, 10.0);
        assert_eq!(config.interpreter.model.request_timeout_secs, Some(30));
        assert_eq!(config.interpreter.model.model, "gemini-1.5-pro");
        assert_eq!(config.vehicle.home_latitude, 51.5);
        assert_eq!(config.vehicle.battery_full_v, 12.6);
    }

    #[test]
    fn test_malformed_yaml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "interpreter: [not, a, map]").unwrap();

        let err = AssistantConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn test_empty_document() {
        let config = AssistantConfig::from_yaml_str("  \n").unwrap();
        assert_eq!(config.vehicle.drain_per_command, 0.5);
    }
}
