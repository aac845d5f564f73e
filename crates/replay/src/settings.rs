//! Layered replay settings
//!
//! Built-in defaults, then an optional config file, then `DROWSY_*`
//! environment variables (`DROWSY_DETECTOR__EAR_THRESHOLD=0.22`).

use std::path::Path;
use drowsiness::{CalibrationConfig, DetectorConfig, DrowsinessError};
use serde::{Deserialize, Serialize};

/// Settings for one replay run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    pub detector: DetectorConfig,
    pub calibration: CalibrationConfig,
}

impl ReplaySettings {
    /// Load settings, validating the detector section
    pub fn load(path: Option<&Path>) -> Result<Self, DrowsinessError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("DROWSY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| DrowsinessError::Config(e.to_string()))?;
        settings.detector.validate()?;
        Ok(settings)
    }
}
