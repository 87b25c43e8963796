//! Configuration management for `AstroView`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AstroViewError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `AstroView`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AstroViewConfig {
    /// JPL Horizons API configuration
    pub horizons: HorizonsConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Default command arguments
    pub defaults: DefaultsConfig,
    /// Figure rendering settings
    pub render: RenderConfig,
}

/// JPL Horizons API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonsConfig {
    /// Base URL of the Horizons API endpoint
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
    /// Refuse queries expected to return more rows than this
    pub max_rows: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache TTL in hours
    pub ttl_hours: u32,
    /// Cache directory location
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// Log output destination (console or file)
    pub output: String,
    /// Log file path
    pub file_path: String,
}

/// Defaults for optional command-line arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Object shown by `orbit` when none is given
    pub target: String,
    /// Observing site for `skyview` and `altaz` (MPC code, name or lat,lon)
    pub site: String,
    pub orbit_start: String,
    pub orbit_stop: String,
    pub orbit_step: String,
    /// Observation time for `skyview` and `altaz`; empty means now
    pub observation_time: String,
    /// Directory figures are written to
    pub output_dir: String,
}

/// Figure rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub orbit_width: u32,
    pub orbit_height: u32,
    /// Camera elevation above the ecliptic in degrees
    pub view_elevation_deg: f64,
    /// Camera azimuth in degrees
    pub view_azimuth_deg: f64,
    pub skyview_width: u32,
    pub skyview_height: u32,
}

// Default value functions
fn default_horizons_base_url() -> String {
    "https://ssd.jpl.nasa.gov/api/horizons.api".to_string()
}

fn default_horizons_timeout() -> u32 {
    30
}

fn default_horizons_max_retries() -> u32 {
    3
}

fn default_horizons_max_rows() -> u32 {
    20_000
}

fn default_cache_ttl() -> u32 {
    24
}

fn default_cache_location() -> String {
    "~/.cache/astroview".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_log_output() -> String {
    "console".to_string()
}

fn default_log_file_path() -> String {
    "~/.cache/astroview/astroview.log".to_string()
}

fn default_target() -> String {
    "Ceres".to_string()
}

fn default_site() -> String {
    "568".to_string()
}

fn default_orbit_start() -> String {
    "2025-01-01".to_string()
}

fn default_orbit_stop() -> String {
    "2025-12-31".to_string()
}

fn default_orbit_step() -> String {
    "1d".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for HorizonsConfig {
    fn default() -> Self {
        Self {
            base_url: default_horizons_base_url(),
            timeout_seconds: default_horizons_timeout(),
            max_retries: default_horizons_max_retries(),
            max_rows: default_horizons_max_rows(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            output: default_log_output(),
            file_path: default_log_file_path(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            site: default_site(),
            orbit_start: default_orbit_start(),
            orbit_stop: default_orbit_stop(),
            orbit_step: default_orbit_step(),
            observation_time: String::new(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            orbit_width: 900,
            orbit_height: 760,
            view_elevation_deg: 30.0,
            view_azimuth_deg: -60.0,
            skyview_width: 1200,
            skyview_height: 640,
        }
    }
}

impl AstroViewConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(AstroViewError::config(format!(
                "config file {} does not exist",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. ASTROVIEW_HORIZONS__TIMEOUT_SECONDS=60
        builder = builder.add_source(
            Environment::with_prefix("ASTROVIEW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AstroViewConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("astroview").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.horizons.base_url.is_empty() {
            self.horizons.base_url = default_horizons_base_url();
        }
        if self.horizons.timeout_seconds == 0 {
            self.horizons.timeout_seconds = default_horizons_timeout();
        }
        if self.horizons.max_rows == 0 {
            self.horizons.max_rows = default_horizons_max_rows();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.logging.output.is_empty() {
            self.logging.output = default_log_output();
        }
        if self.defaults.target.is_empty() {
            self.defaults.target = default_target();
        }
        if self.defaults.site.is_empty() {
            self.defaults.site = default_site();
        }
        if self.defaults.orbit_step.is_empty() {
            self.defaults.orbit_step = default_orbit_step();
        }
        if self.defaults.output_dir.is_empty() {
            self.defaults.output_dir = default_output_dir();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.horizons.timeout_seconds > 300 {
            return Err(
                AstroViewError::config("Horizons timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.horizons.max_retries > 10 {
            return Err(AstroViewError::config("Horizons max retries cannot exceed 10").into());
        }

        if self.cache.ttl_hours > 24 * 365 {
            return Err(AstroViewError::config("Cache TTL cannot exceed one year").into());
        }

        if !(-90.0..=90.0).contains(&self.render.view_elevation_deg) {
            return Err(
                AstroViewError::config("View elevation must be between -90 and 90 degrees").into(),
            );
        }

        let sizes = [
            self.render.orbit_width,
            self.render.orbit_height,
            self.render.skyview_width,
            self.render.skyview_height,
        ];
        if sizes.iter().any(|size| !(200..=8000).contains(size)) {
            return Err(
                AstroViewError::config("Figure sizes must be between 200 and 8000 pixels").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AstroViewError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AstroViewError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_log_outputs = ["console", "file"];
        if !valid_log_outputs.contains(&self.logging.output.as_str()) {
            return Err(AstroViewError::config(format!(
                "Invalid log output '{}'. Must be one of: {}",
                self.logging.output,
                valid_log_outputs.join(", ")
            ))
            .into());
        }

        if !self.horizons.base_url.starts_with("http://")
            && !self.horizons.base_url.starts_with("https://")
        {
            return Err(AstroViewError::config(
                "Horizons base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }

    /// Resolved cache directory
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        expand_home(&self.cache.location)
    }

    /// Resolved log file path
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        expand_home(&self.logging.file_path)
    }
}

/// Expand a leading `~` to the user's home directory
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AstroViewConfig::default();
        assert_eq!(
            config.horizons.base_url,
            "https://ssd.jpl.nasa.gov/api/horizons.api"
        );
        assert_eq!(config.horizons.timeout_seconds, 30);
        assert_eq!(config.cache.ttl_hours, 24);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.target, "Ceres");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AstroViewConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = AstroViewConfig::default();
        config.horizons.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_url_scheme() {
        let mut config = AstroViewConfig::default();
        config.horizons.base_url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = AstroViewConfig::default();
        config.horizons.base_url.clear();
        config.defaults.site.clear();
        config.apply_defaults();
        assert_eq!(config.horizons.base_url, default_horizons_base_url());
        assert_eq!(config.defaults.site, "568");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[horizons]\ntimeout_seconds = 45\n\n[defaults]\ntarget = \"Vesta\"\n"
        )
        .unwrap();

        let config = AstroViewConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.horizons.timeout_seconds, 45);
        assert_eq!(config.horizons.max_retries, 3);
        assert_eq!(config.defaults.target, "Vesta");
    }

    #[test]
    fn test_environment_variable_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[horizons]\nmax_rows = 100\n\n[defaults]\nsite = \"568\"\n").unwrap();

        // SAFETY: these variables are only read by this test
        unsafe {
            std::env::set_var("ASTROVIEW_HORIZONS__MAX_ROWS", "5000");
            std::env::set_var("ASTROVIEW_DEFAULTS__SITE", "675");
        }

        let result = AstroViewConfig::load_from_path(Some(file.path().to_path_buf()));

        // SAFETY: test cleanup
        unsafe {
            std::env::remove_var("ASTROVIEW_HORIZONS__MAX_ROWS");
            std::env::remove_var("ASTROVIEW_DEFAULTS__SITE");
        }

        let config = result.unwrap();
        assert_eq!(config.horizons.max_rows, 5000);
        assert_eq!(config.defaults.site, "675");
        assert_eq!(config.horizons.timeout_seconds, 30);
    }

    #[test]
    fn test_load_from_missing_explicit_path() {
        let result = AstroViewConfig::load_from_path(Some(PathBuf::from("/nonexistent/av.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = AstroViewConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("astroview"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/cache"), home.join("cache"));
        }
    }
}
