use crate::error::{PlanError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// RemoteConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Project URL; tables are served under `/rest/v1/`.
    pub url: String,
    /// Environment variable holding the API key. The key itself is never
    /// written to disk.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

fn default_api_key_env() -> String {
    "SPRINT_API_KEY".to_string()
}

// ---------------------------------------------------------------------------
// ForecastConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Converts forecast hours into working days for display and risk checks.
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
}

fn default_hours_per_day() -> f64 {
    8.0
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            hours_per_day: default_hours_per_day(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub team: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(team: impl Into<String>) -> Self {
        Self {
            version: default_version(),
            team: team.into(),
            remote: None,
            forecast: ForecastConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(PlanError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::config_path(root), data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Some(remote) = &self.remote {
            if !(remote.url.starts_with("https://") || remote.url.starts_with("http://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("remote.url '{}' is not an http(s) URL", remote.url),
                });
            }
            if std::env::var(&remote.api_key_env).map_or(true, |v| v.trim().is_empty()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "remote api key variable {} is not set; mutations will fail",
                        remote.api_key_env
                    ),
                });
            }
        }

        if !(self.forecast.hours_per_day > 0.0) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "forecast.hours_per_day must be positive (got {})",
                    self.forecast.hours_per_day
                ),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn minimal_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("team: Falcons\n").unwrap();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.forecast.hours_per_day, 8.0);
        assert!(cfg.remote.is_none());
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn remote_defaults_key_env() {
        let cfg: Config =
            serde_yaml::from_str("team: x\nremote:\n  url: https://db.example.test\n").unwrap();
        assert_eq!(cfg.remote.unwrap().api_key_env, "SPRINT_API_KEY");
    }

    #[test]
    fn validate_flags_bad_url_and_hours() {
        let mut cfg = Config::new("x");
        cfg.remote = Some(RemoteConfig {
            url: "ftp://nope".into(),
            api_key_env: "SPRINT_TEST_UNSET_KEY_VAR".into(),
            schema: None,
        });
        cfg.forecast.hours_per_day = 0.0;
        let w = cfg.validate();
        assert_eq!(w.len(), 3);
        assert_eq!(w[0].level, WarnLevel::Error);
        assert!(w[1].message.contains("SPRINT_TEST_UNSET_KEY_VAR"));
        assert_eq!(w[2].level, WarnLevel::Warning);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(PlanError::NotInitialized)
        ));
        let cfg = Config::new("Falcons");
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }
}
