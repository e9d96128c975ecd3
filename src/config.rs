use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::error;
use url::Url;

/// The settings document, a single JSON file:
///
/// ```json
/// {
///   "working_directory": "data",
///   "paths": { "image": "images", "csv": "exports" },
///   "parameters": { "timeout": 10, "target_url": "https://..." }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub working_directory: PathBuf,
    pub paths: PathsConfig,
    pub parameters: ParametersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub image: PathBuf,
    pub csv: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParametersConfig {
    /// Per-lookup and per-download bound, in seconds.
    pub timeout: f64,
    pub target_url: String,
}

impl AppConfig {
    /// Load and validate the settings document.
    ///
    /// Every failure (missing file, malformed JSON, missing or
    /// mistyped key, semantic violation) is logged with its own
    /// message and collapses to `None`; the caller treats `None` as
    /// "abort startup". Nothing panics and no error propagates.
    pub fn load(path: &Path) -> Option<AppConfig> {
        if !path.is_file() {
            error!(path = %path.display(), "configuration file not found");
            return None;
        }

        let settings = match Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Json))
            .build()
        {
            Ok(settings) => settings,
            Err(e) => {
                error!(path = %path.display(), error = %e, "configuration file is not valid JSON");
                return None;
            }
        };

        let config: AppConfig = match settings.try_deserialize() {
            Ok(config) => config,
            Err(e) => {
                error!(path = %path.display(), error = %e, "configuration key missing or mistyped");
                return None;
            }
        };

        if let Err(e) = config.validate() {
            error!(path = %path.display(), error = %e, "configuration failed validation");
            return None;
        }

        Some(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.working_directory.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "working_directory must not be empty".into(),
            ));
        }

        if self.paths.image.as_os_str().is_empty() {
            return Err(ConfigError::Message("paths.image must not be empty".into()));
        }

        if self.paths.csv.as_os_str().is_empty() {
            return Err(ConfigError::Message("paths.csv must not be empty".into()));
        }

        if !self.parameters.timeout.is_finite() || self.parameters.timeout <= 0.0 {
            return Err(ConfigError::Message(
                "parameters.timeout must be a positive number of seconds".into(),
            ));
        }

        if Url::parse(&self.parameters.target_url).is_err() {
            return Err(ConfigError::Message(
                "parameters.target_url is not a valid URL".into(),
            ));
        }

        Ok(())
    }

    /// Lookup/download bound as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.parameters.timeout)
    }

    /// Absolute directory images are saved under.
    pub fn image_dir(&self) -> PathBuf {
        self.working_directory.join(&self.paths.image)
    }

    /// Absolute directory the CSV export is written into.
    pub fn csv_dir(&self) -> PathBuf {
        self.working_directory.join(&self.paths.csv)
    }
}
