// ═══════════════════════════════════════════════════════════════════════════════
// 📦 detectors/classifier.rs - Motion Classification
// ═══════════════════════════════════════════════════════════════════════════════
// تصنيف الحركة من عينة تسارع واحدة
// Moving / not-moving classification from a single acceleration sample
// ═══════════════════════════════════════════════════════════════════════════════

use std::f64::consts::PI;

use clap::ValueEnum;

use crate::config::DetectionConfig;
use crate::state::{AccelSample, Classification, ClassifierState, DerivedFeatures};

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Constants / الثوابت
// ═══════════════════════════════════════════════════════════════════════════════

/// عتبة فرق زاويتي الميل المستخدمة في قاعدة القرار الرباعية (15 درجة)
/// Tilt-angle delta threshold used by the four-term decision rule (15°)
pub const TILT_DELTA_THRESHOLD: f64 = PI / 12.0;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Decision Policy / سياسة القرار
// ═══════════════════════════════════════════════════════════════════════════════

/// قاعدة القرار المطبقة على الخصائص المشتقة
/// Which decision rule to apply over the derived features
///
/// The reference behavior carries both rules; the two-term rule is the
/// calibrated default, the four-term one stays selectable for experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionPolicy {
    /// Two-term OR: modulo and delta-modulo thresholds only
    /// قاعدة ثنائية: عتبتا المقدار وفرق المقدار فقط
    ModuloOnly,

    /// Four-term OR: also fires on tilt-angle deltas of π/12 or more
    /// قاعدة رباعية: تشمل أيضاً فرق زاويتي الميل
    ModuloAndTilt,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        DecisionPolicy::ModuloOnly
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Feature Computation / حساب الخصائص
// ═══════════════════════════════════════════════════════════════════════════════

/// حساب الخصائص المشتقة لعينة واحدة مقابل الحالة السابقة
/// Compute the derived features of one sample against the previous state
///
/// # Algorithm / الخوارزمية
/// ```text
/// modulo = |x² + y² + z² − g_ref²|
/// alfa   = atan2(y, x)
/// gamma  = atan2(−x, sqrt(y² + z²))
/// delta_* = |value − previous value|
/// ```
///
/// All deltas are non-negative. With a fresh zero-initialized state the
/// deltas equal the absolute feature values themselves. `atan2(0, 0)`
/// returns 0 per IEEE convention, so a zero vector never fails.
pub fn compute_features(
    sample: &AccelSample,
    state: &ClassifierState,
    gravity_reference: f64,
) -> DerivedFeatures {
    let squared_magnitude =
        sample.x * sample.x + sample.y * sample.y + sample.z * sample.z;

    let modulo = (squared_magnitude - gravity_reference * gravity_reference).abs();
    let alfa = sample.y.atan2(sample.x);
    let gamma = (-sample.x).atan2((sample.y * sample.y + sample.z * sample.z).sqrt());

    DerivedFeatures {
        modulo,
        alfa,
        gamma,
        delta_modulo: (modulo - state.prev_modulo).abs(),
        delta_alfa: (alfa - state.prev_alfa).abs(),
        delta_gamma: (gamma - state.prev_gamma).abs(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Classification Function / دالة التصنيف
// ═══════════════════════════════════════════════════════════════════════════════

/// تصنيف عينة واحدة وتحديث حالة المصنف
/// Classify one sample and update the classifier state
///
/// Thresholds are inclusive (`>=`) on both sides. Under `ModuloOnly` the
/// angular deltas are still computed for observability but never influence
/// the verdict. The state is overwritten with the new feature values and
/// verdict for the next call; `was_moving` preserves the verdict that held
/// before this sample, for the interval tracker.
pub fn classify(
    sample: &AccelSample,
    state: &mut ClassifierState,
    config: &DetectionConfig,
) -> Classification {
    let features = compute_features(sample, state, config.gravity_reference);

    let modulo_term = features.modulo >= config.threshold_modulo
        || features.delta_modulo >= config.threshold_delta_modulo;

    let moving = match config.policy {
        DecisionPolicy::ModuloOnly => modulo_term,
        DecisionPolicy::ModuloAndTilt => {
            modulo_term
                || features.delta_alfa >= TILT_DELTA_THRESHOLD
                || features.delta_gamma >= TILT_DELTA_THRESHOLD
        }
    };

    let was_moving = state.prev_moving;

    state.prev_modulo = features.modulo;
    state.prev_alfa = features.alfa;
    state.prev_gamma = features.gamma;
    state.prev_moving = moving;

    Classification {
        moving,
        was_moving,
        features,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Unit Tests / اختبارات الوحدة
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modulo_is_never_negative() {
        let state = ClassifierState::new();
        let samples = [
            AccelSample::new(0.0, 0.0, 0.0),
            AccelSample::new(1.0, 1.0, 1.0),
            AccelSample::new(-40.0, -1.0, 91.0),
            AccelSample::new(0.0, 4.0, 100.0),
        ];

        for sample in &samples {
            let features = compute_features(sample, &state, 99.0);
            assert!(features.modulo >= 0.0);
        }
    }

    #[test]
    fn test_first_sample_deltas_equal_absolute_features() {
        // Fresh state is zero-initialized, so the first deltas collapse to
        // the absolute magnitudes of the features themselves.
        let mut state = ClassifierState::new();
        let config = DetectionConfig {
            gravity_reference: 0.0,
            ..DetectionConfig::default()
        };

        let c = classify(&AccelSample::new(3.0, 4.0, 12.0), &mut state, &config);

        assert!((c.features.delta_modulo - c.features.modulo).abs() < 1e-12);
        assert!((c.features.delta_alfa - c.features.alfa.abs()).abs() < 1e-12);
        assert!((c.features.delta_gamma - c.features.gamma.abs()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_follows_atan2_convention() {
        let state = ClassifierState::new();

        let features = compute_features(&AccelSample::new(0.0, 0.0, 0.0), &state, 99.0);

        assert_eq!(features.alfa, 0.0);
        assert_eq!(features.gamma, 0.0);
    }

    #[test]
    fn test_modulo_boundary_is_inclusive() {
        // gravity 1 → modulo of (30, 10, 1) is exactly |1001 − 1| = 1000
        let mut state = ClassifierState::new();
        let config = DetectionConfig {
            gravity_reference: 1.0,
            ..DetectionConfig::default()
        };

        let sample = AccelSample::new(30.0, 10.0, 1.0);
        classify(&sample, &mut state, &config);
        // Second identical sample: delta_modulo is 0, so the verdict rests
        // on the modulo term alone.
        let c = classify(&sample, &mut state, &config);

        assert_eq!(c.features.modulo, 1000.0);
        assert_eq!(c.features.delta_modulo, 0.0);
        assert!(c.moving);
    }

    #[test]
    fn test_below_both_thresholds_is_not_moving() {
        // gravity 1 → (20, 10, 1) gives modulo 500, then (10, 30, 0) gives
        // modulo 999 with delta_modulo 499: both strictly below threshold.
        let mut state = ClassifierState::new();
        let config = DetectionConfig {
            gravity_reference: 1.0,
            ..DetectionConfig::default()
        };

        classify(&AccelSample::new(20.0, 10.0, 1.0), &mut state, &config);
        let c = classify(&AccelSample::new(10.0, 30.0, 0.0), &mut state, &config);

        assert_eq!(c.features.modulo, 999.0);
        assert_eq!(c.features.delta_modulo, 499.0);
        assert!(!c.moving);
    }

    #[test]
    fn test_tilt_policy_fires_on_rotation() {
        // A 90° swing in alfa with constant magnitude: invisible to the
        // two-term rule, caught by the four-term one.
        let config_two = DetectionConfig {
            gravity_reference: 10.0,
            ..DetectionConfig::default()
        };
        let config_four = DetectionConfig {
            policy: DecisionPolicy::ModuloAndTilt,
            ..config_two
        };

        let first = AccelSample::new(0.0, 10.0, 0.0);
        let second = AccelSample::new(10.0, 0.0, 0.0);

        let mut state = ClassifierState::new();
        classify(&first, &mut state, &config_two);
        let two_term = classify(&second, &mut state, &config_two);
        assert!(!two_term.moving);

        let mut state = ClassifierState::new();
        classify(&first, &mut state, &config_four);
        let four_term = classify(&second, &mut state, &config_four);
        assert!(four_term.features.delta_alfa >= TILT_DELTA_THRESHOLD);
        assert!(four_term.moving);
    }

    #[test]
    fn test_was_moving_tracks_previous_verdict() {
        let mut state = ClassifierState::new();
        let config = DetectionConfig {
            gravity_reference: 0.0,
            ..DetectionConfig::default()
        };

        let first = classify(&AccelSample::new(40.0, 0.0, 0.0), &mut state, &config);
        assert!(!first.was_moving);
        assert!(first.moving);

        let second = classify(&AccelSample::new(40.0, 0.0, 0.0), &mut state, &config);
        assert!(second.was_moving);
    }
}
