// ═══════════════════════════════════════════════════════════════════════════════
// 📦 detectors/calibrator.rs - Threshold Calibration
// ═══════════════════════════════════════════════════════════════════════════════
// اشتقاق عتبة القرار الموصى بها من توزيع مدد فترات الحركة
// Derives the recommended decision threshold from the distribution of
// completed moving-interval durations: G = mean − stdev
// ═══════════════════════════════════════════════════════════════════════════════

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Errors / الأخطاء
// ═══════════════════════════════════════════════════════════════════════════════

/// Calibration was attempted with zero completed intervals
/// محاولة معايرة بدون أي فترات مكتملة
///
/// Surfaced explicitly instead of letting the statistics degenerate into
/// NaN; a run with no data gets no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no completed moving intervals to calibrate from")]
pub struct EmptyHistoryError;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Calibration Result / نتيجة المعايرة
// ═══════════════════════════════════════════════════════════════════════════════

/// Summary statistics over the interval history
/// إحصاءات موجزة على تاريخ الفترات
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    /// Arithmetic mean of the durations / المتوسط الحسابي للمدد
    pub mean: f64,

    /// Population standard deviation / الانحراف المعياري (للمجتمع)
    pub stdev: f64,

    /// Shortest completed interval / أقصر فترة مكتملة
    pub shortest: u64,

    /// Longest completed interval / أطول فترة مكتملة
    pub longest: u64,

    /// Recommended threshold G = mean − stdev / العتبة الموصى بها
    pub recommended_threshold: f64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Calibration Function / دالة المعايرة
// ═══════════════════════════════════════════════════════════════════════════════

/// حساب إحصاءات المعايرة على كامل تاريخ الفترات
/// Compute the calibration statistics over the full interval history
///
/// Single batch pass, idempotent, order-independent. The standard deviation
/// divides by n (population form), matching the reference statistics.
pub fn calibrate(history: &[u64]) -> Result<CalibrationResult, EmptyHistoryError> {
    if history.is_empty() {
        return Err(EmptyHistoryError);
    }

    let n = history.len() as f64;
    let mean = history.iter().map(|&d| d as f64).sum::<f64>() / n;

    let variance = history
        .iter()
        .map(|&d| {
            let diff = d as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;
    let stdev = variance.sqrt();

    let shortest = history.iter().copied().min().unwrap_or(0);
    let longest = history.iter().copied().max().unwrap_or(0);

    Ok(CalibrationResult {
        mean,
        stdev,
        shortest,
        longest,
        recommended_threshold: mean - stdev,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Unit Tests / اختبارات الوحدة
// ═══════════════════════════════════════════════════════════════════════════════
