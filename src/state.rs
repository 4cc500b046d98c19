// ═══════════════════════════════════════════════════════════════════════════════
// 📦 state.rs - Session State Management
// ═══════════════════════════════════════════════════════════════════════════════
// This module defines the core data structures for acceleration samples and
// one classification session (one device stream).
// Uses Arc<Mutex> for thread-safe sharing between the MQTT reader and main threads.
// ═══════════════════════════════════════════════════════════════════════════════

use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::config::DetectionConfig;
use crate::csv_logger::FeatureLogger;
use crate::detectors::calibrator::{self, CalibrationResult, EmptyHistoryError};
use crate::detectors::classifier;
use crate::detectors::tracker::IntervalTracker;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Acceleration Sample / عينة التسارع
// ═══════════════════════════════════════════════════════════════════════════════

/// One instantaneous 3-axis accelerometer reading
/// قراءة واحدة لمقياس التسارع ثلاثي المحاور
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccelSample {
    /// X axis component / مركبة المحور X
    pub x: f64,

    /// Y axis component / مركبة المحور Y
    pub y: f64,

    /// Z axis component / مركبة المحور Z
    pub z: f64,
}

impl AccelSample {
    /// Create a new acceleration sample / إنشاء عينة تسارع جديدة
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Derived Features / الخصائص المشتقة
// ═══════════════════════════════════════════════════════════════════════════════

/// Scalar features derived from one sample by the classifier
/// خصائص عددية مشتقة من عينة واحدة بواسطة المصنف
///
/// `modulo` is the absolute deviation of the squared magnitude from the
/// squared gravity reference; `alfa` and `gamma` are the two tilt angles.
/// The `delta_*` values are absolute differences versus the previous sample
/// and are therefore always non-negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedFeatures {
    /// |x² + y² + z² − g_ref²| / الانحراف المطلق لمربع المقدار
    pub modulo: f64,

    /// atan2(y, x) / زاوية الميل الأولى
    pub alfa: f64,

    /// atan2(−x, sqrt(y² + z²)) / زاوية الميل الثانية
    pub gamma: f64,

    /// |modulo − previous modulo| / فرق المقدار عن العينة السابقة
    pub delta_modulo: f64,

    /// |alfa − previous alfa| / فرق الزاوية الأولى
    pub delta_alfa: f64,

    /// |gamma − previous gamma| / فرق الزاوية الثانية
    pub delta_gamma: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Classifier State / حالة المصنف
// ═══════════════════════════════════════════════════════════════════════════════

/// The classifier's memory between successive samples of one stream
/// ذاكرة المصنف بين العينات المتتالية لتدفق واحد
///
/// Zero-initialized at stream start, so the first sample's deltas equal the
/// absolute magnitudes of its own features. Each stream owns exactly one
/// `ClassifierState`; it is never shared between devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierState {
    /// Previous modulo value / قيمة المقدار السابقة
    pub prev_modulo: f64,

    /// Previous alfa angle / زاوية alfa السابقة
    pub prev_alfa: f64,

    /// Previous gamma angle / زاوية gamma السابقة
    pub prev_gamma: f64,

    /// Previous moving verdict / حكم الحركة السابق
    pub prev_moving: bool,
}

impl ClassifierState {
    /// Create a fresh, zero-initialized state / إنشاء حالة جديدة مصفّرة
    pub fn new() -> Self {
        Self::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Classification Output / ناتج التصنيف
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of classifying one sample
/// نتيجة تصنيف عينة واحدة
#[derive(Debug, Clone, Copy)]
pub struct Classification {
    /// Is the device moving? / هل الجهاز يتحرك؟
    pub moving: bool,

    /// Verdict of the previous sample (state before this one)
    /// حكم العينة السابقة
    pub was_moving: bool,

    /// Features computed for this sample / الخصائص المحسوبة لهذه العينة
    pub features: DerivedFeatures,
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Sample Record / سجل العينة
// ═══════════════════════════════════════════════════════════════════════════════

/// One classified sample, as consumed by the echo output and the CSV log
/// عينة مصنفة واحدة، كما تستهلكها المخرجات وسجل CSV
#[derive(Debug, Clone, Copy)]
pub struct SampleRecord {
    /// Unix timestamp in milliseconds / الطابع الزمني بالميلي ثانية
    pub timestamp: i64,

    /// The raw sample / العينة الخام
    pub sample: AccelSample,

    /// Derived features / الخصائص المشتقة
    pub features: DerivedFeatures,

    /// Moving verdict / حكم الحركة
    pub moving: bool,
}

impl SampleRecord {
    /// Format one diagnostic row in the style of the live condition test
    /// تنسيق صف تشخيصي واحد
    pub fn diagnostic_row(&self) -> String {
        let f = &self.features;
        format!(
            "{:<24} {:>10.1} {:>10.1} {:>6.2} {:>6.2} {:>6.2} {:>6.2}  is moving? {}",
            format!("[{}, {}, {}]", self.sample.x, self.sample.y, self.sample.z),
            f.modulo,
            f.delta_modulo,
            f.alfa,
            f.delta_alfa,
            f.gamma,
            f.delta_gamma,
            self.moving
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Session State / حالة الجلسة
// ═══════════════════════════════════════════════════════════════════════════════

/// State of one classification session, shared between threads
/// حالة جلسة تصنيف واحدة، مشتركة بين الخيوط
///
/// Classification has sequential dependence on the previous sample, so
/// samples must be ingested strictly in arrival order. Exactly one producer
/// thread (MQTT reader or replay loop) calls `ingest_sample`, which keeps
/// lock acquisition order identical to arrival order.
pub struct SessionState {
    /// Detection configuration for this session / إعدادات الكشف لهذه الجلسة
    pub config: DetectionConfig,

    /// Classifier memory / ذاكرة المصنف
    pub classifier: ClassifierState,

    /// Moving-interval state machine / آلة حالة فترات الحركة
    tracker: IntervalTracker,

    /// Completed moving-interval durations, in arrival order
    /// مدد فترات الحركة المكتملة، بترتيب الوصول
    durations: Vec<u64>,

    /// Number of samples classified so far / عدد العينات المصنفة حتى الآن
    pub samples_processed: u64,

    /// Number of messages skipped as undecodable / عدد الرسائل المتجاهلة
    pub decode_errors: u64,

    /// Is the MQTT receiver currently active? / هل مستقبل MQTT نشط حالياً؟
    pub receiver_active: bool,

    /// Echo a diagnostic row for every sample? / طباعة صف تشخيصي لكل عينة؟
    pub echo: bool,

    /// CSV feature logger instance (optional) / مثيل مسجل CSV (اختياري)
    pub csv_logger: Option<FeatureLogger>,
}

impl SessionState {
    /// Create a new session with the given configuration
    /// إنشاء جلسة جديدة بالإعدادات المعطاة
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            classifier: ClassifierState::new(),
            tracker: IntervalTracker::new(),
            durations: Vec::new(),
            samples_processed: 0,
            decode_errors: 0,
            receiver_active: false,
            echo: false,
            csv_logger: None,
        }
    }

    /// Classify one sample and fold it into the interval history
    /// تصنيف عينة واحدة ودمجها في تاريخ الفترات
    ///
    /// Runs classify → track → history append → CSV log, in that order.
    pub fn ingest_sample(&mut self, sample: AccelSample) -> SampleRecord {
        let classification =
            classifier::classify(&sample, &mut self.classifier, &self.config);

        // Fold the verdict into the interval tracker
        // دمج الحكم في متعقب الفترات
        if let Some(duration) = self.tracker.observe(
            classification.moving,
            classification.was_moving,
            self.config.sampling_period,
        ) {
            self.durations.push(duration);
        }

        self.samples_processed += 1;

        let record = SampleRecord {
            timestamp: Utc::now().timestamp_millis(),
            sample,
            features: classification.features,
            moving: classification.moving,
        };

        // Log to CSV if logger exists / تسجيل في CSV إذا وجد المسجل
        if let Some(ref mut logger) = self.csv_logger {
            if let Err(e) = logger.log_record(&record) {
                log::warn!("CSV log write failed: {}", e);
            }
        }

        record
    }

    /// Count one skipped, undecodable message / عدّ رسالة متجاهلة واحدة
    ///
    /// A bad message never touches the classifier state; the stream simply
    /// continues with the next message.
    pub fn record_decode_error(&mut self) {
        self.decode_errors += 1;
    }

    /// Completed interval durations collected so far
    /// مدد الفترات المكتملة المجمعة حتى الآن
    pub fn completed_intervals(&self) -> &[u64] {
        &self.durations
    }

    /// Duration of the interval still open, if any
    /// مدة الفترة التي ما زالت مفتوحة، إن وجدت
    ///
    /// An interval still open at stream end is discarded, never counted.
    /// This accessor exists so the discard is visible, not silent.
    pub fn open_interval(&self) -> Option<u64> {
        self.tracker.open_duration()
    }

    /// Run the threshold calibration over the collected history
    /// تشغيل معايرة العتبة على التاريخ المجمع
    pub fn calibrate(&self) -> Result<CalibrationResult, EmptyHistoryError> {
        calibrator::calibrate(&self.durations)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Shared State Type / نوع الحالة المشتركة
// ═══════════════════════════════════════════════════════════════════════════════

/// Thread-safe shared session type
/// نوع الجلسة المشتركة الآمنة للخيوط
pub type SharedState = Arc<Mutex<SessionState>>;

/// Create a new shared session instance
/// إنشاء مثيل جلسة مشتركة جديد
pub fn create_shared_state(config: DetectionConfig) -> SharedState {
    Arc::new(Mutex::new(SessionState::new(config)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Unit Tests / اختبارات الوحدة
// ═══════════════════════════════════════════════════════════════════════════════
