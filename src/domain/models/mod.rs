pub mod config;
pub mod soil;

pub use config::{
    AlertSettings, AlertThresholds, AppFeature, CameraSettings, CollectionKind, CollectionNames,
    ConfigEnum, Configuration, ConsistencyWarning, Dimensions, DiseaseModelSettings,
    DroneSettings, EnhancementSettings, FirebaseSettings, Hsv, ImageFormat,
    ImageProcessingSettings, LogLevel, MlModelSettings, MobileAppSettings, NotificationMethod,
    SoilSensorSettings, SystemSettings, VegetationDetection,
};
pub use soil::{
    Recommendation, SoilAnalysis, SoilCondition, SoilParameter, SoilReading, SoilThreshold,
    SoilThresholds,
};
