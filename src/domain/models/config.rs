use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

use super::soil::{self, SoilAnalysis, SoilReading, SoilThresholds};

/// String-backed enumeration whose document spelling is fixed.
pub trait ConfigEnum: Sized + Copy + 'static {
    /// Every accepted spelling, in declaration order.
    const ALLOWED: &'static [&'static str];

    fn from_name(name: &str) -> Option<Self>;

    fn as_str(self) -> &'static str;
}

macro_rules! config_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl ConfigEnum for $name {
            const ALLOWED: &'static [&'static str] = &[$($text),+];

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

config_enum! {
    /// Process log verbosity.
    LogLevel {
        Debug => "DEBUG",
        Info => "INFO",
        Warn => "WARN",
        Error => "ERROR",
    }
}

config_enum! {
    /// Encoding of captured aerial images.
    ImageFormat {
        Jpg => "jpg",
        Png => "png",
    }
}

config_enum! {
    /// Channel an alert can be routed through.
    NotificationMethod {
        Email => "email",
        MobileApp => "mobile_app",
    }
}

config_enum! {
    /// Feature flag exposed to the mobile app.
    AppFeature {
        LiveMonitoring => "live_monitoring",
        AlertNotifications => "alert_notifications",
        ReportGeneration => "report_generation",
        ManualControl => "manual_control",
    }
}

config_enum! {
    /// Logical name of a remote document collection.
    CollectionKind {
        SoilData => "soil_data",
        DiseaseDetection => "disease_detection",
        DroneTelemetry => "drone_telemetry",
    }
}

/// A `(width, height)` pair, written as `[width, height]` in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Serialize for Dimensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.width, self.height].serialize(serializer)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// HSV triple with every component in `0..=255`.
pub type Hsv = [u8; 3];

/// Complete, validated configuration.
///
/// Only produced by [`crate::infrastructure::config::ConfigLoader`] or
/// [`Configuration::default`]; there is no way to mutate a section after
/// construction. Share it behind an `Arc` and hand the relevant section to
/// each subsystem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub(crate) system: SystemSettings,
    pub(crate) drone: DroneSettings,
    pub(crate) ml_model: MlModelSettings,
    pub(crate) soil_sensors: SoilSensorSettings,
    pub(crate) image_processing: ImageProcessingSettings,
    pub(crate) firebase: FirebaseSettings,
    pub(crate) alerts: AlertSettings,
    pub(crate) mobile_app: MobileAppSettings,
}

impl Configuration {
    pub const fn system(&self) -> &SystemSettings {
        &self.system
    }

    pub const fn drone(&self) -> &DroneSettings {
        &self.drone
    }

    /// Settings under `ml_model.disease_detection`.
    pub const fn disease_model(&self) -> &DiseaseModelSettings {
        &self.ml_model.disease_detection
    }

    pub const fn soil_sensors(&self) -> &SoilSensorSettings {
        &self.soil_sensors
    }

    pub const fn image_processing(&self) -> &ImageProcessingSettings {
        &self.image_processing
    }

    pub const fn firebase(&self) -> &FirebaseSettings {
        &self.firebase
    }

    pub const fn alerts(&self) -> &AlertSettings {
        &self.alerts
    }

    pub const fn mobile_app(&self) -> &MobileAppSettings {
        &self.mobile_app
    }

    /// Render the configuration in the same YAML schema it is loaded from.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Cross-section relationships that are suspicious but not invalid.
    pub fn consistency_warnings(&self) -> Vec<ConsistencyWarning> {
        let mut warnings = Vec::new();

        let alert = self.alerts.thresholds.disease_confidence;
        let model = self.ml_model.disease_detection.confidence_threshold;
        if alert > model {
            warnings.push(ConsistencyWarning::AlertConfidenceAboveModel { alert, model });
        }

        let battery_low = self.alerts.thresholds.battery_low;
        let return_threshold = self.drone.return_battery_threshold;
        if self.alerts.enabled && battery_low < return_threshold {
            warnings.push(ConsistencyWarning::BatteryAlertBelowReturn {
                battery_low,
                return_threshold,
            });
        }

        warnings
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            system: SystemSettings::default(),
            drone: DroneSettings::default(),
            ml_model: MlModelSettings::default(),
            soil_sensors: SoilSensorSettings::default(),
            image_processing: ImageProcessingSettings::default(),
            firebase: FirebaseSettings::default(),
            alerts: AlertSettings::default(),
            mobile_app: MobileAppSettings::default(),
        }
    }
}

/// Relationship between sections that loads fine but is probably a mistake.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyWarning {
    /// Alerts would fire on detections the classifier itself rejects.
    AlertConfidenceAboveModel { alert: f64, model: f64 },
    /// The drone heads home before the low-battery alert can fire.
    BatteryAlertBelowReturn {
        battery_low: f64,
        return_threshold: f64,
    },
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlertConfidenceAboveModel { alert, model } => write!(
                f,
                "alerts.thresholds.disease_confidence ({alert}) is above \
                 ml_model.disease_detection.confidence_threshold ({model})"
            ),
            Self::BatteryAlertBelowReturn {
                battery_low,
                return_threshold,
            } => write!(
                f,
                "alerts.thresholds.battery_low ({battery_low}) is below \
                 drone.return_battery_threshold ({return_threshold})"
            ),
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSettings {
    pub debug_mode: bool,
    pub log_level: LogLevel,
    pub data_directory: PathBuf,
    pub models_directory: PathBuf,
}

impl SystemSettings {
    /// `debug_mode` overrides the configured level.
    pub const fn effective_log_level(&self) -> LogLevel {
        if self.debug_mode {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            debug_mode: false,
            log_level: LogLevel::Info,
            data_directory: PathBuf::from("data"),
            models_directory: PathBuf::from("models"),
        }
    }
}

/// Survey flight parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroneSettings {
    /// Meters above ground.
    pub default_altitude: f64,
    /// Minutes.
    pub max_flight_time: u32,
    /// Percent of battery at which the drone returns home.
    pub return_battery_threshold: f64,
    /// Seconds between captures.
    pub image_capture_interval: f64,
    /// Meters per second.
    pub survey_speed: f64,
    pub camera: CameraSettings,
}

impl DroneSettings {
    pub fn max_flight_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_flight_time) * 60)
    }

    /// `None` when the interval does not fit in a `Duration`.
    pub fn capture_interval(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.image_capture_interval).ok()
    }

    pub fn should_return_home(&self, battery_percent: f64) -> bool {
        battery_percent < self.return_battery_threshold
    }
}

impl Default for DroneSettings {
    fn default() -> Self {
        Self {
            default_altitude: 30.0,
            max_flight_time: 25,
            return_battery_threshold: 20.0,
            image_capture_interval: 2.0,
            survey_speed: 5.0,
            camera: CameraSettings::default(),
        }
    }
}

/// Camera mounted on the survey drone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraSettings {
    pub resolution: Dimensions,
    pub format: ImageFormat,
    /// Encoder quality, 0-100.
    pub quality: u8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            resolution: Dimensions::new(1920, 1080),
            format: ImageFormat::Jpg,
            quality: 95,
        }
    }
}

/// Wrapper for the `ml_model` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MlModelSettings {
    pub disease_detection: DiseaseModelSettings,
}

/// Plant disease classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseModelSettings {
    pub model_file: PathBuf,
    pub input_size: Dimensions,
    pub confidence_threshold: f64,
    pub supported_diseases: Vec<String>,
}

impl DiseaseModelSettings {
    pub fn accepts(&self, confidence: f64) -> bool {
        confidence >= self.confidence_threshold
    }

    pub fn supports(&self, disease: &str) -> bool {
        self.supported_diseases.iter().any(|d| d == disease)
    }
}

impl Default for DiseaseModelSettings {
    fn default() -> Self {
        Self {
            model_file: PathBuf::from("models/plant_disease_model.h5"),
            input_size: Dimensions::new(224, 224),
            confidence_threshold: 0.85,
            supported_diseases: ["leaf_blight", "leaf_spot", "rust", "powdery_mildew"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Soil sensor schedule and per-parameter thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilSensorSettings {
    /// Seconds between readings.
    pub reading_interval: u64,
    pub thresholds: SoilThresholds,
}

impl SoilSensorSettings {
    pub const fn reading_period(&self) -> Duration {
        Duration::from_secs(self.reading_interval)
    }

    pub fn analyze(&self, reading: &SoilReading) -> SoilAnalysis {
        soil::analyze(&self.thresholds, reading)
    }
}

impl Default for SoilSensorSettings {
    fn default() -> Self {
        Self {
            reading_interval: 300,
            thresholds: SoilThresholds::default(),
        }
    }
}

/// Image cache, enhancement and vegetation mask settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageProcessingSettings {
    pub cache_enabled: bool,
    /// Megabytes.
    pub cache_max_size: u64,
    pub enhancement: EnhancementSettings,
    pub vegetation_detection: VegetationDetection,
}

impl ImageProcessingSettings {
    /// Cache budget in bytes, `None` when caching is off.
    pub const fn cache_budget_bytes(&self) -> Option<u64> {
        if self.cache_enabled {
            Some(self.cache_max_size.saturating_mul(1024 * 1024))
        } else {
            None
        }
    }
}

impl Default for ImageProcessingSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_max_size: 1000,
            enhancement: EnhancementSettings::default(),
            vegetation_detection: VegetationDetection::default(),
        }
    }
}

/// Contrast-limited adaptive histogram equalization parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementSettings {
    pub contrast_limit: f64,
    pub grid_size: Dimensions,
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            contrast_limit: 2.0,
            grid_size: Dimensions::new(8, 8),
        }
    }
}

/// HSV bounds of the green vegetation mask. `lower <= upper` componentwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VegetationDetection {
    pub hsv_green_lower: Hsv,
    pub hsv_green_upper: Hsv,
}

impl VegetationDetection {
    /// Inclusive on both bounds.
    pub fn contains(&self, pixel: Hsv) -> bool {
        (0..3).all(|i| self.hsv_green_lower[i] <= pixel[i] && pixel[i] <= self.hsv_green_upper[i])
    }
}

impl Default for VegetationDetection {
    fn default() -> Self {
        Self {
            hsv_green_lower: [35, 30, 30],
            hsv_green_upper: [85, 255, 255],
        }
    }
}

/// Remote document store identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirebaseSettings {
    pub project_id: String,
    pub storage_bucket: String,
    pub collection_names: CollectionNames,
}

impl FirebaseSettings {
    pub fn collection(&self, kind: CollectionKind) -> &str {
        self.collection_names.get(kind)
    }
}

impl Default for FirebaseSettings {
    fn default() -> Self {
        Self {
            project_id: "agricultural-robot".to_string(),
            storage_bucket: "agricultural-robot.appspot.com".to_string(),
            collection_names: CollectionNames::default(),
        }
    }
}

/// Physical collection name for each logical collection. Pairwise distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionNames {
    pub soil_data: String,
    pub disease_detection: String,
    pub drone_telemetry: String,
}

impl CollectionNames {
    pub fn get(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::SoilData => &self.soil_data,
            CollectionKind::DiseaseDetection => &self.disease_detection,
            CollectionKind::DroneTelemetry => &self.drone_telemetry,
        }
    }
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            soil_data: "soil_readings".to_string(),
            disease_detection: "disease_detections".to_string(),
            drone_telemetry: "drone_telemetry".to_string(),
        }
    }
}

/// Alert routing and trigger levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSettings {
    pub enabled: bool,
    pub notification_methods: BTreeSet<NotificationMethod>,
    pub thresholds: AlertThresholds,
}

impl AlertSettings {
    pub fn notifies_via(&self, method: NotificationMethod) -> bool {
        self.enabled && self.notification_methods.contains(&method)
    }

    pub fn disease_alert(&self, confidence: f64) -> bool {
        self.enabled && confidence >= self.thresholds.disease_confidence
    }

    pub fn battery_alert(&self, battery_percent: f64) -> bool {
        self.enabled && battery_percent <= self.thresholds.battery_low
    }

    pub fn moisture_alert(&self, moisture_percent: f64) -> bool {
        self.enabled && moisture_percent <= self.thresholds.soil_moisture_critical
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            notification_methods: [NotificationMethod::Email, NotificationMethod::MobileApp]
                .into_iter()
                .collect(),
            thresholds: AlertThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertThresholds {
    pub disease_confidence: f64,
    pub soil_moisture_critical: f64,
    pub battery_low: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            disease_confidence: 0.75,
            soil_moisture_critical: 15.0,
            battery_low: 25.0,
        }
    }
}

/// Settings served to the mobile client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MobileAppSettings {
    pub api_version: String,
    /// Seconds between client polls.
    pub update_interval: u64,
    pub features: BTreeSet<AppFeature>,
}

impl MobileAppSettings {
    pub fn has_feature(&self, feature: AppFeature) -> bool {
        self.features.contains(&feature)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval)
    }
}

impl Default for MobileAppSettings {
    fn default() -> Self {
        Self {
            api_version: "v1".to_string(),
            update_interval: 60,
            features: [
                AppFeature::LiveMonitoring,
                AppFeature::AlertNotifications,
                AppFeature::ReportGeneration,
                AppFeature::ManualControl,
            ]
            .into_iter()
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::soil::SoilParameter;

    #[test]
    fn test_default_config() {
        let config = Configuration::default();
        assert_eq!(config.system().log_level, LogLevel::Info);
        assert_eq!(config.drone().camera.format, ImageFormat::Jpg);
        assert!((config.disease_model().confidence_threshold - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.soil_sensors().reading_interval, 300);
        assert!(
            (config.soil_sensors().thresholds[SoilParameter::Moisture].optimal - 50.0).abs()
                < f64::EPSILON
        );
        assert!(config.consistency_warnings().is_empty());
    }

    #[test]
    fn test_config_enum_names() {
        assert_eq!(LogLevel::from_name("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_name("warn"), None);
        assert_eq!(ImageFormat::ALLOWED, &["jpg", "png"]);
        assert_eq!(
            CollectionKind::from_name("drone_telemetry"),
            Some(CollectionKind::DroneTelemetry)
        );
        assert_eq!(AppFeature::ManualControl.to_string(), "manual_control");
    }

    #[test]
    fn test_effective_log_level() {
        let mut system = SystemSettings::default();
        assert_eq!(system.effective_log_level(), LogLevel::Info);
        system.debug_mode = true;
        assert_eq!(system.effective_log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_yaml_uses_document_schema() {
        let yaml = Configuration::default().to_yaml().expect("serializes");
        assert!(yaml.contains("log_level: INFO"));
        assert!(yaml.contains("format: jpg"));
        assert!(yaml.contains("disease_detection:"));
        assert!(yaml.contains("- 1920"));
        assert!(yaml.contains("soil_data: soil_readings"));
    }

    #[test]
    fn test_alert_decisions() {
        let mut alerts = AlertSettings::default();
        assert!(alerts.disease_alert(0.75));
        assert!(!alerts.disease_alert(0.5));
        assert!(alerts.battery_alert(25.0));
        assert!(!alerts.battery_alert(26.0));
        assert!(alerts.moisture_alert(10.0));
        assert!(alerts.notifies_via(NotificationMethod::Email));

        alerts.enabled = false;
        assert!(!alerts.disease_alert(0.99));
        assert!(!alerts.battery_alert(1.0));
        assert!(!alerts.notifies_via(NotificationMethod::Email));
    }

    #[test]
    fn test_drone_helpers() {
        let drone = DroneSettings::default();
        assert!(drone.should_return_home(19.0));
        assert!(!drone.should_return_home(20.0));
        assert_eq!(drone.max_flight_duration(), Duration::from_secs(25 * 60));
        assert_eq!(drone.capture_interval(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_capture_interval_too_large_for_duration() {
        let drone = DroneSettings {
            image_capture_interval: 1e30,
            ..DroneSettings::default()
        };
        assert_eq!(drone.capture_interval(), None);
    }

    #[test]
    fn test_vegetation_bounds_inclusive() {
        let veg = VegetationDetection::default();
        assert!(veg.contains([35, 30, 30]));
        assert!(veg.contains([85, 255, 255]));
        assert!(veg.contains([60, 128, 200]));
        assert!(!veg.contains([34, 128, 128]));
        assert!(!veg.contains([86, 128, 128]));
    }

    #[test]
    fn test_consistency_warnings() {
        let mut config = Configuration::default();
        config.alerts.thresholds.disease_confidence = 0.9;
        config.alerts.thresholds.battery_low = 10.0;

        let warnings = config.consistency_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            warnings[0],
            ConsistencyWarning::AlertConfidenceAboveModel { .. }
        ));
        assert!(warnings[1].to_string().contains("battery_low (10)"));
    }

    #[test]
    fn test_collection_lookup() {
        let firebase = FirebaseSettings::default();
        assert_eq!(firebase.collection(CollectionKind::SoilData), "soil_readings");
        assert_eq!(
            firebase.collection(CollectionKind::DiseaseDetection),
            "disease_detections"
        );
    }

    #[test]
    fn test_cache_budget() {
        let mut images = ImageProcessingSettings::default();
        assert_eq!(images.cache_budget_bytes(), Some(1000 * 1024 * 1024));
        images.cache_enabled = false;
        assert_eq!(images.cache_budget_bytes(), None);
    }
}
