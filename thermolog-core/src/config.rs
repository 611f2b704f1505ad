use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::ThermologError;

/// Upper bound on the sampling period.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ThermologConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the SQLite file. Parent directories are created on startup.
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "db/tempreading.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SamplerConfig {
    pub interval_minutes: u64,
    /// Take the first sample immediately instead of one interval after start.
    pub sample_on_startup: bool,
    pub error_log_path: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 20,
            sample_on_startup: false,
            error_log_path: "log/errorsLog.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    pub inside_url: String,
    pub outside_base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub request_timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            inside_url: "http://192.168.5.116/temperaturec".to_string(),
            outside_base_url: "https://api.open-meteo.com".to_string(),
            latitude: 42.6977,
            longitude: 23.3219,
            request_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8513,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    /// IANA zone used when rendering timestamps in the history table.
    pub timezone: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: "EET".to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::Message(format!(
                "display.timezone is not a known IANA zone: {}",
                self.timezone
            ))
        })
    }
}

impl ThermologConfig {
    /// Load from a TOML file, overlaid with `THERMOLOG__SECTION__KEY` env vars.
    /// A missing file is not an error; defaults cover every field.
    pub fn load(path: &str) -> Result<Self, ThermologError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("THERMOLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampler.interval_minutes == 0 {
            return Err(ConfigError::Message(
                "sampler.interval_minutes must be greater than zero".to_string(),
            ));
        }
        if self.sampler.interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(ConfigError::Message(format!(
                "sampler.interval_minutes must be at most {} (one week): {}",
                MAX_INTERVAL_MINUTES, self.sampler.interval_minutes
            )));
        }
        if self.sources.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "sources.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.sources.latitude) {
            return Err(ConfigError::Message(format!(
                "sources.latitude out of range: {}",
                self.sources.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.sources.longitude) {
            return Err(ConfigError::Message(format!(
                "sources.longitude out of range: {}",
                self.sources.longitude
            )));
        }
        self.display.tz()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = ThermologConfig::default();
        assert_eq!(config.sampler.interval_minutes, 20);
        assert!(!config.sampler.sample_on_startup);
        assert_eq!(config.http.port, 8513);
        assert_eq!(config.database.path, "db/tempreading.db");
        assert_eq!(config.sampler.error_log_path, "log/errorsLog.csv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ThermologConfig::load("does-not-exist/thermolog").unwrap();
        assert_eq!(config.sources.request_timeout_secs, 5);
        assert_eq!(config.display.timezone, "EET");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = ThermologConfig::default();
        config.sampler.interval_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_capped_at_one_week() {
        let mut config = ThermologConfig::default();
        config.sampler.interval_minutes = MAX_INTERVAL_MINUTES;
        assert!(config.validate().is_ok());

        config.sampler.interval_minutes = MAX_INTERVAL_MINUTES + 1;
        assert!(config.validate().is_err());

        config.sampler.interval_minutes = u64::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_timezone_must_be_known() {
        let mut config = ThermologConfig::default();
        assert_eq!(config.display.tz().unwrap().name(), "EET");

        config.display.timezone = "Europe/Sofia".to_string();
        assert!(config.validate().is_ok());

        config.display.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_surfaces_config_error() {
        let dir = std::env::temp_dir().join("thermolog-tests");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(format!("{}.toml", std::process::id()));
        std::fs::write(&file, "[sampler]\ninterval_minutes = 0\n").unwrap();

        let result = ThermologConfig::load(file.to_str().unwrap());
        let _ = std::fs::remove_file(&file);
        assert!(matches!(result, Err(ThermologError::Config(_))));
    }

    #[test]
    fn test_bad_coordinates_rejected() {
        let mut config = ThermologConfig::default();
        config.sources.latitude = 91.0;
        assert!(config.validate().is_err());

        let mut config = ThermologConfig::default();
        config.sources.longitude = -181.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let s = Config::builder()
            .add_source(config::File::from_str(
                "[sampler]\ninterval_minutes = 15\nsample_on_startup = true\nerror_log_path = \"x.csv\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: ThermologConfig = s.try_deserialize().unwrap();
        assert_eq!(config.sampler.interval_minutes, 15);
        assert!(config.sampler.sample_on_startup);
        assert_eq!(config.http.port, 8513);
    }
}
