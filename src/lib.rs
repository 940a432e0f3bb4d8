//! AgroSense - configuration for an agricultural monitoring robot
//!
//! Loads the YAML document that drives the drone, the soil sensors, the
//! disease classifier, the Firebase sink, alerting and the mobile client,
//! and validates every section before anything starts.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): typed configuration sections, soil
//!   classification and validation issue types
//! - **Infrastructure Layer** (`infrastructure`): document loading,
//!   environment overrides, hot reload and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use agrosense::ConfigLoader;
//!
//! let config = ConfigLoader::new().load_from_file("config/config.yaml")?;
//! let altitude = config.drone().default_altitude;
//! # let _ = altitude;
//! # Ok::<(), agrosense::ConfigError>(())
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::errors::{NumericRange, ValidationErrors, ValidationIssue};
pub use domain::models::{
    AlertSettings, CameraSettings, Configuration, DiseaseModelSettings, DroneSettings,
    FirebaseSettings, ImageProcessingSettings, MobileAppSettings, SoilCondition, SoilParameter,
    SoilReading, SoilSensorSettings, SoilThreshold, SystemSettings,
};
pub use infrastructure::config::{
    load, ConfigError, ConfigLoader, ConfigReloadEvent, ConfigStore, StoreState,
};
