// ═══════════════════════════════════════════════════════════════════════════════
// 📦 config.rs - Detection Configuration
// ═══════════════════════════════════════════════════════════════════════════════
// Tunable constants for the motion classifier. All of them are adjustable
// from the command line so that threshold experiments never require a rebuild.
// ═══════════════════════════════════════════════════════════════════════════════

use crate::detectors::classifier::DecisionPolicy;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Default Values / القيم الافتراضية
// ═══════════════════════════════════════════════════════════════════════════════

/// Default modulo threshold (T) / عتبة المقدار الافتراضية
pub const DEFAULT_THRESHOLD_MODULO: f64 = 1000.0;

/// Default modulo-delta threshold / عتبة فرق المقدار الافتراضية
pub const DEFAULT_THRESHOLD_DELTA_MODULO: f64 = 500.0;

/// Default gravity reference magnitude / مرجع الجاذبية الافتراضي
/// The sensor reports ~99 units at rest on one axis.
pub const DEFAULT_GRAVITY_REFERENCE: f64 = 99.0;

/// Default sampling period in time units / فترة أخذ العينات الافتراضية
pub const DEFAULT_SAMPLING_PERIOD: u64 = 2;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Configuration Structure / هيكل الإعدادات
// ═══════════════════════════════════════════════════════════════════════════════

/// Tunable parameters of one classification session
/// المعاملات القابلة للضبط لجلسة تصنيف واحدة
#[derive(Debug, Clone, Copy)]
pub struct DetectionConfig {
    /// A sample with `modulo >= threshold_modulo` counts as moving
    /// عتبة المقدار
    pub threshold_modulo: f64,

    /// A sample with `delta_modulo >= threshold_delta_modulo` counts as moving
    /// عتبة فرق المقدار
    pub threshold_delta_modulo: f64,

    /// Reference gravity magnitude, squared inside the modulo computation
    /// مرجع الجاذبية
    pub gravity_reference: f64,

    /// Time units attributed to each sample when accumulating intervals
    /// فترة أخذ العينات
    pub sampling_period: u64,

    /// Which decision rule to apply / قاعدة القرار المطبقة
    pub policy: DecisionPolicy,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold_modulo: DEFAULT_THRESHOLD_MODULO,
            threshold_delta_modulo: DEFAULT_THRESHOLD_DELTA_MODULO,
            gravity_reference: DEFAULT_GRAVITY_REFERENCE,
            sampling_period: DEFAULT_SAMPLING_PERIOD,
            policy: DecisionPolicy::ModuloOnly,
        }
    }
}
