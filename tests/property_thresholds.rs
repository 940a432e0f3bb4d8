mod common;

use agrosense::{SoilCondition, SoilParameter, SoilThreshold, ValidationIssue};
use common::{example_tree, set, validate};
use proptest::prelude::*;

fn parameter() -> impl Strategy<Value = SoilParameter> {
    prop::sample::select(SoilParameter::ALL.to_vec())
}

proptest! {
    /// Property: a threshold loads exactly when it is ordered
    ///
    /// Any (min, optimal, max) inside the parameter's physical range is
    /// accepted iff min <= optimal <= max, and a rejection names that
    /// parameter's path and nothing else.
    #[test]
    fn prop_soil_threshold_ordering(
        parameter in parameter(),
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
        c in 0.0f64..1.0,
    ) {
        let range = parameter.valid_range();
        let scale = |t: f64| (range.min + t * (range.max - range.min)).round();
        let (min, optimal, max) = (scale(a), scale(b), scale(c));

        let base = format!("soil_sensors.thresholds.{}", parameter.as_str());
        let mut root = example_tree();
        set(&mut root, &format!("{base}.min"), min);
        set(&mut root, &format!("{base}.optimal"), optimal);
        set(&mut root, &format!("{base}.max"), max);

        let ordered = min <= optimal && optimal <= max;
        match validate(&root) {
            Ok(config) => {
                prop_assert!(ordered);
                let loaded = config.soil_sensors().thresholds[parameter];
                prop_assert_eq!(loaded, SoilThreshold::new(min, optimal, max));
            }
            Err(errors) => {
                prop_assert!(!ordered);
                prop_assert_eq!(errors.len(), 1);
                let is_ordering = matches!(
                    &errors.issues()[0],
                    ValidationIssue::OrderingViolation { path, .. } if *path == base
                );
                prop_assert!(is_ordering);
            }
        }
    }

    /// Property: HSV bounds load exactly when lower <= upper componentwise
    #[test]
    fn prop_hsv_bounds_ordering(
        lower in prop::array::uniform3(0u8..=255),
        upper in prop::array::uniform3(0u8..=255),
    ) {
        let as_value = |hsv: [u8; 3]| {
            serde_yaml::Value::Sequence(hsv.iter().map(|&c| serde_yaml::Value::from(c)).collect())
        };
        let mut root = example_tree();
        set(&mut root, "image_processing.vegetation_detection.hsv_green_lower", as_value(lower));
        set(&mut root, "image_processing.vegetation_detection.hsv_green_upper", as_value(upper));

        let violations = (0..3).filter(|&i| lower[i] > upper[i]).count();
        match validate(&root) {
            Ok(config) => {
                prop_assert_eq!(violations, 0);
                prop_assert!(config.image_processing().vegetation_detection.contains(lower));
                prop_assert!(config.image_processing().vegetation_detection.contains(upper));
            }
            Err(errors) => prop_assert_eq!(errors.len(), violations),
        }
    }

    /// Property: classification agrees with the threshold bounds
    #[test]
    fn prop_classification_respects_bounds(
        value in -100.0f64..200.0,
    ) {
        let threshold = SoilThreshold::new(20.0, 50.0, 80.0);
        let condition = threshold.classify(value);
        if value < 20.0 {
            prop_assert_eq!(condition, SoilCondition::Low);
        } else if value > 80.0 {
            prop_assert_eq!(condition, SoilCondition::High);
        } else {
            prop_assert!(matches!(condition, SoilCondition::Optimal | SoilCondition::Suboptimal));
        }
    }
}
