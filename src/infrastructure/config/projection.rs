//! Projection of the untyped YAML tree into typed configuration sections.
//!
//! Every section is projected even when an earlier one failed, so a single
//! pass reports every issue in the document. A section (or field) that has
//! any issue yields `None`; the configuration is only assembled when the
//! issue list is empty.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde_yaml::{Mapping, Value};

use crate::domain::errors::{NumericRange, ValidationErrors, ValidationIssue};
use crate::domain::models::config::{
    AlertSettings, AlertThresholds, AppFeature, CameraSettings, CollectionKind, CollectionNames,
    ConfigEnum, Configuration, Dimensions, DiseaseModelSettings, DroneSettings,
    EnhancementSettings, FirebaseSettings, Hsv, ImageFormat, ImageProcessingSettings, LogLevel,
    MlModelSettings, MobileAppSettings, NotificationMethod, SoilSensorSettings, SystemSettings,
    VegetationDetection,
};
use crate::domain::models::soil::{SoilParameter, SoilThreshold, SoilThresholds};

const TOP_LEVEL_KEYS: &[&str] = &[
    "system",
    "drone",
    "ml_model",
    "soil_sensors",
    "image_processing",
    "firebase",
    "alerts",
    "mobile_app",
];

const HSV_COMPONENT: NumericRange = NumericRange::inclusive(0.0, 255.0);

/// Outcome of projecting a document.
#[derive(Debug)]
pub struct Projection {
    pub result: Result<Configuration, ValidationErrors>,
    /// Dotted paths of keys the schema does not know about.
    pub unknown_keys: Vec<String>,
}

/// Project a parsed document root into a [`Configuration`].
pub fn project(root: &Mapping) -> Projection {
    let mut projector = Projector::default();
    let config = projector.configuration(root);

    let result = match (config, projector.issues.is_empty()) {
        (Some(config), true) => Ok(config),
        _ => Err(ValidationErrors::new(projector.issues)),
    };

    Projection {
        result,
        unknown_keys: projector.unknown_keys,
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn index(parent: &str, i: usize) -> String {
    format!("{parent}[{i}]")
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn is_version(text: &str) -> bool {
    let core = text.strip_prefix('v').unwrap_or(text);
    let parts: Vec<&str> = core.split('.').collect();
    (1..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

#[derive(Default)]
struct Projector {
    issues: Vec<ValidationIssue>,
    unknown_keys: Vec<String>,
}

impl Projector {
    fn configuration(&mut self, root: &Mapping) -> Option<Configuration> {
        self.note_unknown(root, TOP_LEVEL_KEYS, "");

        let system = self.system(root);
        let drone = self.drone(root);
        let ml_model = self.ml_model(root);
        let soil_sensors = self.soil_sensors(root);
        let image_processing = self.image_processing(root);
        let firebase = self.firebase(root);
        let alerts = self.alerts(root);
        let mobile_app = self.mobile_app(root);

        Some(Configuration {
            system: system?,
            drone: drone?,
            ml_model: ml_model?,
            soil_sensors: soil_sensors?,
            image_processing: image_processing?,
            firebase: firebase?,
            alerts: alerts?,
            mobile_app: mobile_app?,
        })
    }

    // ----- sections -----

    fn system(&mut self, root: &Mapping) -> Option<SystemSettings> {
        let path = "system";
        let map = self.mapping(root, "system", "")?;
        self.note_unknown(
            map,
            &["debug_mode", "log_level", "data_directory", "models_directory"],
            path,
        );

        let debug_mode = self.bool(map, "debug_mode", path);
        let log_level = self.enumeration::<LogLevel>(map, "log_level", path);
        let data_directory = self.path_buf(map, "data_directory", path);
        let models_directory = self.path_buf(map, "models_directory", path);

        Some(SystemSettings {
            debug_mode: debug_mode?,
            log_level: log_level?,
            data_directory: data_directory?,
            models_directory: models_directory?,
        })
    }

    fn drone(&mut self, root: &Mapping) -> Option<DroneSettings> {
        let path = "drone";
        let map = self.mapping(root, "drone", "")?;
        self.note_unknown(
            map,
            &[
                "default_altitude",
                "max_flight_time",
                "return_battery_threshold",
                "image_capture_interval",
                "survey_speed",
                "camera",
            ],
            path,
        );

        let default_altitude = self.number(map, "default_altitude", path, NumericRange::positive());
        let max_flight_time = self.unsigned::<u32>(
            map,
            "max_flight_time",
            path,
            NumericRange {
                max: f64::from(u32::MAX),
                ..NumericRange::positive()
            },
        );
        let return_battery_threshold =
            self.number(map, "return_battery_threshold", path, NumericRange::percent());
        let image_capture_interval =
            self.number(map, "image_capture_interval", path, NumericRange::positive());
        let survey_speed = self.number(map, "survey_speed", path, NumericRange::positive());
        let camera = self.camera(map, path);

        Some(DroneSettings {
            default_altitude: default_altitude?,
            max_flight_time: max_flight_time?,
            return_battery_threshold: return_battery_threshold?,
            image_capture_interval: image_capture_interval?,
            survey_speed: survey_speed?,
            camera: camera?,
        })
    }

    fn camera(&mut self, drone: &Mapping, parent: &str) -> Option<CameraSettings> {
        let path = join(parent, "camera");
        let map = self.mapping(drone, "camera", parent)?;
        self.note_unknown(map, &["resolution", "format", "quality"], &path);

        let resolution = self.dimensions(map, "resolution", &path);
        let format = self.enumeration::<ImageFormat>(map, "format", &path);
        let quality = self.unsigned::<u8>(map, "quality", &path, NumericRange::percent());

        Some(CameraSettings {
            resolution: resolution?,
            format: format?,
            quality: quality?,
        })
    }

    fn ml_model(&mut self, root: &Mapping) -> Option<MlModelSettings> {
        let map = self.mapping(root, "ml_model", "")?;
        self.note_unknown(map, &["disease_detection"], "ml_model");

        let path = "ml_model.disease_detection";
        let detection = self.mapping(map, "disease_detection", "ml_model")?;
        self.note_unknown(
            detection,
            &[
                "model_file",
                "input_size",
                "confidence_threshold",
                "supported_diseases",
            ],
            path,
        );

        let model_file = self.path_buf(detection, "model_file", path);
        let input_size = self.dimensions(detection, "input_size", path);
        let confidence_threshold = self.number(
            detection,
            "confidence_threshold",
            path,
            NumericRange::probability(),
        );
        let supported_diseases = self.identifier_list(detection, "supported_diseases", path);

        Some(MlModelSettings {
            disease_detection: DiseaseModelSettings {
                model_file: model_file?,
                input_size: input_size?,
                confidence_threshold: confidence_threshold?,
                supported_diseases: supported_diseases?,
            },
        })
    }

    fn soil_sensors(&mut self, root: &Mapping) -> Option<SoilSensorSettings> {
        let path = "soil_sensors";
        let map = self.mapping(root, "soil_sensors", "")?;
        self.note_unknown(map, &["reading_interval", "thresholds"], path);

        let reading_interval =
            self.unsigned::<u64>(map, "reading_interval", path, NumericRange::positive());
        let thresholds = self.soil_thresholds(map, path);

        Some(SoilSensorSettings {
            reading_interval: reading_interval?,
            thresholds: thresholds?,
        })
    }

    fn soil_thresholds(&mut self, soil: &Mapping, parent: &str) -> Option<SoilThresholds> {
        let path = join(parent, "thresholds");
        let map = self.mapping(soil, "thresholds", parent)?;
        let known: Vec<&str> = SoilParameter::ALL.iter().map(|p| p.as_str()).collect();
        self.note_unknown(map, &known, &path);

        let moisture = self.soil_threshold(map, SoilParameter::Moisture, &path);
        let ph = self.soil_threshold(map, SoilParameter::Ph, &path);
        let nitrogen = self.soil_threshold(map, SoilParameter::Nitrogen, &path);
        let phosphorus = self.soil_threshold(map, SoilParameter::Phosphorus, &path);
        let potassium = self.soil_threshold(map, SoilParameter::Potassium, &path);
        let temperature = self.soil_threshold(map, SoilParameter::Temperature, &path);

        Some(SoilThresholds {
            moisture: moisture?,
            ph: ph?,
            nitrogen: nitrogen?,
            phosphorus: phosphorus?,
            potassium: potassium?,
            temperature: temperature?,
        })
    }

    fn soil_threshold(
        &mut self,
        thresholds: &Mapping,
        parameter: SoilParameter,
        parent: &str,
    ) -> Option<SoilThreshold> {
        let path = join(parent, parameter.as_str());
        let map = self.mapping(thresholds, parameter.as_str(), parent)?;
        self.note_unknown(map, &["min", "max", "optimal"], &path);

        let range = parameter.valid_range();
        let min = self.number(map, "min", &path, range);
        let max = self.number(map, "max", &path, range);
        let optimal = self.number(map, "optimal", &path, range);

        let threshold = SoilThreshold::new(min?, optimal?, max?);
        if !threshold.is_ordered() {
            self.issues.push(ValidationIssue::OrderingViolation {
                path,
                detail: format!(
                    "expected min <= optimal <= max, found min {}, optimal {}, max {}",
                    threshold.min, threshold.optimal, threshold.max
                ),
            });
            return None;
        }
        Some(threshold)
    }

    fn image_processing(&mut self, root: &Mapping) -> Option<ImageProcessingSettings> {
        let path = "image_processing";
        let map = self.mapping(root, "image_processing", "")?;
        self.note_unknown(
            map,
            &[
                "cache_enabled",
                "cache_max_size",
                "enhancement",
                "vegetation_detection",
            ],
            path,
        );

        let cache_enabled = self.bool(map, "cache_enabled", path);
        let cache_max_size =
            self.unsigned::<u64>(map, "cache_max_size", path, NumericRange::positive());
        let enhancement = self.enhancement(map, path);
        let vegetation_detection = self.vegetation_detection(map, path);

        Some(ImageProcessingSettings {
            cache_enabled: cache_enabled?,
            cache_max_size: cache_max_size?,
            enhancement: enhancement?,
            vegetation_detection: vegetation_detection?,
        })
    }

    fn enhancement(&mut self, images: &Mapping, parent: &str) -> Option<EnhancementSettings> {
        let path = join(parent, "enhancement");
        let map = self.mapping(images, "enhancement", parent)?;
        self.note_unknown(map, &["contrast_limit", "grid_size"], &path);

        let contrast_limit = self.number(map, "contrast_limit", &path, NumericRange::positive());
        let grid_size = self.dimensions(map, "grid_size", &path);

        Some(EnhancementSettings {
            contrast_limit: contrast_limit?,
            grid_size: grid_size?,
        })
    }

    fn vegetation_detection(
        &mut self,
        images: &Mapping,
        parent: &str,
    ) -> Option<VegetationDetection> {
        let path = join(parent, "vegetation_detection");
        let map = self.mapping(images, "vegetation_detection", parent)?;
        self.note_unknown(map, &["hsv_green_lower", "hsv_green_upper"], &path);

        let lower = self.hsv(map, "hsv_green_lower", &path);
        let upper = self.hsv(map, "hsv_green_upper", &path);
        let (lower, upper) = (lower?, upper?);

        let mut ordered = true;
        for i in 0..3 {
            if lower[i] > upper[i] {
                ordered = false;
                self.issues.push(ValidationIssue::OrderingViolation {
                    path: index(&join(&path, "hsv_green_lower"), i),
                    detail: format!(
                        "lower bound {} exceeds hsv_green_upper[{i}] = {}",
                        lower[i], upper[i]
                    ),
                });
            }
        }

        ordered.then_some(VegetationDetection {
            hsv_green_lower: lower,
            hsv_green_upper: upper,
        })
    }

    fn firebase(&mut self, root: &Mapping) -> Option<FirebaseSettings> {
        let path = "firebase";
        let map = self.mapping(root, "firebase", "")?;
        self.note_unknown(
            map,
            &["project_id", "storage_bucket", "collection_names"],
            path,
        );

        let project_id = self.non_empty_string(map, "project_id", path);
        let storage_bucket = self.non_empty_string(map, "storage_bucket", path);
        let collection_names = self.collection_names(map, path);

        Some(FirebaseSettings {
            project_id: project_id?,
            storage_bucket: storage_bucket?,
            collection_names: collection_names?,
        })
    }

    fn collection_names(&mut self, firebase: &Mapping, parent: &str) -> Option<CollectionNames> {
        let path = join(parent, "collection_names");
        let map = self.mapping(firebase, "collection_names", parent)?;
        self.note_unknown(map, CollectionKind::ALLOWED, &path);

        let mut names: Vec<Option<String>> = Vec::with_capacity(CollectionKind::ALLOWED.len());
        let mut seen = BTreeSet::new();
        let mut distinct = true;
        for key in CollectionKind::ALLOWED {
            let name = self.non_empty_string(map, key, &path);
            if let Some(name) = &name {
                if !seen.insert(name.clone()) {
                    distinct = false;
                    self.issues.push(ValidationIssue::DuplicateValue {
                        path: join(&path, key),
                        value: name.clone(),
                    });
                }
            }
            names.push(name);
        }

        let mut names = names.into_iter();
        let soil_data = names.next().flatten();
        let disease_detection = names.next().flatten();
        let drone_telemetry = names.next().flatten();

        if !distinct {
            return None;
        }
        Some(CollectionNames {
            soil_data: soil_data?,
            disease_detection: disease_detection?,
            drone_telemetry: drone_telemetry?,
        })
    }

    fn alerts(&mut self, root: &Mapping) -> Option<AlertSettings> {
        let path = "alerts";
        let map = self.mapping(root, "alerts", "")?;
        self.note_unknown(map, &["enabled", "notification_methods", "thresholds"], path);

        let enabled = self.bool(map, "enabled", path);
        let notification_methods =
            self.enum_set::<NotificationMethod>(map, "notification_methods", path, true);
        let thresholds = self.alert_thresholds(map, path);

        Some(AlertSettings {
            enabled: enabled?,
            notification_methods: notification_methods?,
            thresholds: thresholds?,
        })
    }

    fn alert_thresholds(&mut self, alerts: &Mapping, parent: &str) -> Option<AlertThresholds> {
        let path = join(parent, "thresholds");
        let map = self.mapping(alerts, "thresholds", parent)?;
        self.note_unknown(
            map,
            &["disease_confidence", "soil_moisture_critical", "battery_low"],
            &path,
        );

        let disease_confidence = self.number(
            map,
            "disease_confidence",
            &path,
            NumericRange::probability(),
        );
        let soil_moisture_critical = self.number(
            map,
            "soil_moisture_critical",
            &path,
            SoilParameter::Moisture.valid_range(),
        );
        let battery_low = self.number(map, "battery_low", &path, NumericRange::percent());

        Some(AlertThresholds {
            disease_confidence: disease_confidence?,
            soil_moisture_critical: soil_moisture_critical?,
            battery_low: battery_low?,
        })
    }

    fn mobile_app(&mut self, root: &Mapping) -> Option<MobileAppSettings> {
        let path = "mobile_app";
        let map = self.mapping(root, "mobile_app", "")?;
        self.note_unknown(map, &["api_version", "update_interval", "features"], path);

        let api_version = self.non_empty_string(map, "api_version", path).and_then(|v| {
            if is_version(&v) {
                Some(v)
            } else {
                self.issues.push(ValidationIssue::InvalidFormat {
                    path: join(path, "api_version"),
                    value: v,
                    expected: "version (e.g. v1, 1.2, 1.2.3)",
                });
                None
            }
        });
        let update_interval =
            self.unsigned::<u64>(map, "update_interval", path, NumericRange::positive());
        let features = self.enum_set::<AppFeature>(map, "features", path, false);

        Some(MobileAppSettings {
            api_version: api_version?,
            update_interval: update_interval?,
            features: features?,
        })
    }

    // ----- field readers -----

    fn note_unknown(&mut self, map: &Mapping, known: &[&str], path: &str) {
        for key in map.keys() {
            match key.as_str() {
                Some(name) if known.contains(&name) => {}
                Some(name) => self.unknown_keys.push(join(path, name)),
                None => self
                    .unknown_keys
                    .push(join(path, &format!("<{} key>", type_name(key)))),
            }
        }
    }

    fn field<'v>(&mut self, map: &'v Mapping, key: &str, parent: &str) -> Option<&'v Value> {
        let value = map.get(key);
        if value.is_none() {
            self.issues.push(ValidationIssue::MissingField {
                path: join(parent, key),
            });
        }
        value
    }

    fn mismatch(&mut self, path: String, expected: &'static str, actual: &Value) {
        self.issues.push(ValidationIssue::TypeMismatch {
            path,
            expected,
            actual: type_name(actual),
        });
    }

    fn mapping<'v>(&mut self, map: &'v Mapping, key: &str, parent: &str) -> Option<&'v Mapping> {
        match self.field(map, key, parent)? {
            Value::Mapping(inner) => Some(inner),
            other => {
                self.mismatch(join(parent, key), "mapping", other);
                None
            }
        }
    }

    fn bool(&mut self, map: &Mapping, key: &str, parent: &str) -> Option<bool> {
        match self.field(map, key, parent)? {
            Value::Bool(b) => Some(*b),
            other => {
                self.mismatch(join(parent, key), "boolean", other);
                None
            }
        }
    }

    fn string_value(&mut self, value: &Value, path: String) -> Option<String> {
        match value {
            Value::String(s) if s.trim().is_empty() => {
                self.issues.push(ValidationIssue::EmptyValue { path });
                None
            }
            Value::String(s) => Some(s.clone()),
            other => {
                self.mismatch(path, "string", other);
                None
            }
        }
    }

    fn non_empty_string(&mut self, map: &Mapping, key: &str, parent: &str) -> Option<String> {
        let value = self.field(map, key, parent)?;
        self.string_value(value, join(parent, key))
    }

    fn path_buf(&mut self, map: &Mapping, key: &str, parent: &str) -> Option<PathBuf> {
        self.non_empty_string(map, key, parent).map(PathBuf::from)
    }

    fn number_value(&mut self, value: &Value, path: String, range: NumericRange) -> Option<f64> {
        let Some(number) = value.as_f64() else {
            self.mismatch(path, "number", value);
            return None;
        };
        if !range.contains(number) {
            self.issues.push(ValidationIssue::RangeViolation {
                path,
                value: number,
                range,
            });
            return None;
        }
        Some(number)
    }

    fn number(
        &mut self,
        map: &Mapping,
        key: &str,
        parent: &str,
        range: NumericRange,
    ) -> Option<f64> {
        let value = self.field(map, key, parent)?;
        self.number_value(value, join(parent, key), range)
    }

    /// Integer-only value converted to `T`. `range` must not admit negatives.
    fn unsigned_value<T: TryFrom<u64>>(
        &mut self,
        value: &Value,
        path: String,
        range: NumericRange,
    ) -> Option<T> {
        let number = match value {
            Value::Number(n) if !n.is_f64() => n,
            other => {
                self.mismatch(path, "integer", other);
                return None;
            }
        };
        let as_float = number.as_f64().unwrap_or(f64::NAN);
        let converted = number
            .as_u64()
            .filter(|_| range.contains(as_float))
            .and_then(|n| T::try_from(n).ok());
        if converted.is_none() {
            self.issues.push(ValidationIssue::RangeViolation {
                path,
                value: as_float,
                range,
            });
        }
        converted
    }

    fn unsigned<T: TryFrom<u64>>(
        &mut self,
        map: &Mapping,
        key: &str,
        parent: &str,
        range: NumericRange,
    ) -> Option<T> {
        let value = self.field(map, key, parent)?;
        self.unsigned_value(value, join(parent, key), range)
    }

    fn enum_value<E: ConfigEnum>(&mut self, value: &Value, path: String) -> Option<E> {
        let Value::String(name) = value else {
            self.mismatch(path, "string", value);
            return None;
        };
        let parsed = E::from_name(name);
        if parsed.is_none() {
            self.issues.push(ValidationIssue::InvalidEnum {
                path,
                value: name.clone(),
                allowed: E::ALLOWED,
            });
        }
        parsed
    }

    fn enumeration<E: ConfigEnum>(&mut self, map: &Mapping, key: &str, parent: &str) -> Option<E> {
        let value = self.field(map, key, parent)?;
        self.enum_value(value, join(parent, key))
    }

    fn sequence<'v>(&mut self, map: &'v Mapping, key: &str, parent: &str) -> Option<&'v [Value]> {
        match self.field(map, key, parent)? {
            Value::Sequence(items) => Some(items),
            other => {
                self.mismatch(join(parent, key), "sequence", other);
                None
            }
        }
    }

    fn enum_set<E: ConfigEnum + Ord>(
        &mut self,
        map: &Mapping,
        key: &str,
        parent: &str,
        require_non_empty: bool,
    ) -> Option<BTreeSet<E>> {
        let path = join(parent, key);
        let items = self.sequence(map, key, parent)?;
        if require_non_empty && items.is_empty() {
            self.issues.push(ValidationIssue::EmptyValue { path });
            return None;
        }

        let mut set = BTreeSet::new();
        let mut valid = true;
        for (i, item) in items.iter().enumerate() {
            match self.enum_value::<E>(item, index(&path, i)) {
                Some(value) if !set.insert(value) => {
                    valid = false;
                    self.issues.push(ValidationIssue::DuplicateValue {
                        path: index(&path, i),
                        value: value.as_str().to_string(),
                    });
                }
                Some(_) => {}
                None => valid = false,
            }
        }
        valid.then_some(set)
    }

    /// Non-empty list of distinct, non-empty strings, order preserved.
    fn identifier_list(&mut self, map: &Mapping, key: &str, parent: &str) -> Option<Vec<String>> {
        let path = join(parent, key);
        let items = self.sequence(map, key, parent)?;
        if items.is_empty() {
            self.issues.push(ValidationIssue::EmptyValue { path });
            return None;
        }

        let mut list = Vec::with_capacity(items.len());
        let mut valid = true;
        for (i, item) in items.iter().enumerate() {
            match self.string_value(item, index(&path, i)) {
                Some(name) if list.contains(&name) => {
                    valid = false;
                    self.issues.push(ValidationIssue::DuplicateValue {
                        path: index(&path, i),
                        value: name,
                    });
                }
                Some(name) => list.push(name),
                None => valid = false,
            }
        }
        valid.then_some(list)
    }

    /// Fixed-length list of unsigned integers.
    fn integer_tuple<T: TryFrom<u64> + Copy + Default, const N: usize>(
        &mut self,
        map: &Mapping,
        key: &str,
        parent: &str,
        range: NumericRange,
        shape: &'static str,
    ) -> Option<[T; N]> {
        let path = join(parent, key);
        let items = self.sequence(map, key, parent)?;
        if items.len() != N {
            self.issues.push(ValidationIssue::InvalidFormat {
                path,
                value: format!("sequence of {} item(s)", items.len()),
                expected: shape,
            });
            return None;
        }

        let mut out = [T::default(); N];
        let mut valid = true;
        for (i, item) in items.iter().enumerate() {
            match self.unsigned_value::<T>(item, index(&path, i), range) {
                Some(v) => out[i] = v,
                None => valid = false,
            }
        }
        valid.then_some(out)
    }

    fn dimensions(&mut self, map: &Mapping, key: &str, parent: &str) -> Option<Dimensions> {
        let range = NumericRange {
            max: f64::from(u32::MAX),
            ..NumericRange::positive()
        };
        let [width, height] =
            self.integer_tuple::<u32, 2>(map, key, parent, range, "[width, height] pair")?;
        Some(Dimensions::new(width, height))
    }

    fn hsv(&mut self, map: &Mapping, key: &str, parent: &str) -> Option<Hsv> {
        self.integer_tuple::<u8, 3>(map, key, parent, HSV_COMPONENT, "[h, s, v] triple")
    }
}
