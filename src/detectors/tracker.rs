// ═══════════════════════════════════════════════════════════════════════════════
// 📦 detectors/tracker.rs - Moving Interval Tracker
// ═══════════════════════════════════════════════════════════════════════════════
// تتبع فترات الحركة المتصلة من سلسلة أحكام التصنيف
// Tracks contiguous moving intervals from the stream of classifier verdicts
// ═══════════════════════════════════════════════════════════════════════════════

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Interval Tracker / متعقب الفترات
// ═══════════════════════════════════════════════════════════════════════════════

/// آلة حالة ثنائية فوق {متحرك، ساكن} مع محاسبة المدة عند الانتقالات
/// Two-state machine over {MOVING, NOT_MOVING} with transition-driven
/// duration accounting
///
/// ```text
/// not-moving → moving : start, current = period
/// moving     → moving : extend, current += period
/// moving     → not-moving : emit current, reset to 0
/// not-moving → not-moving : current = 0
/// ```
///
/// Starts NOT_MOVING with a zero accumulator and runs for the lifetime of
/// the stream. An interval still open when the stream ends is discarded, not
/// emitted; `open_duration` makes that remainder observable.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalTracker {
    /// Accumulated duration of the interval in progress
    /// المدة المتراكمة للفترة الجارية
    current: u64,
}

impl IntervalTracker {
    /// Create a new tracker in the NOT_MOVING state
    /// إنشاء متعقب جديد في حالة السكون
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one classifier verdict into the state machine
    /// دمج حكم تصنيف واحد في آلة الحالة
    ///
    /// Returns the completed interval duration on a moving → not-moving
    /// edge, `None` otherwise. Emission is a pure value return; the only
    /// state touched is the tracker's own accumulator.
    pub fn observe(&mut self, moving: bool, was_moving: bool, period: u64) -> Option<u64> {
        match (was_moving, moving) {
            // Interval starts / بداية فترة
            (false, true) => {
                self.current = period;
                None
            }
            // Interval continues / استمرار الفترة
            (true, true) => {
                self.current += period;
                None
            }
            // Interval ends: emit / نهاية الفترة: إصدار
            (true, false) => {
                let completed = self.current;
                self.current = 0;
                Some(completed)
            }
            // Still at rest / ما زال ساكناً
            (false, false) => {
                self.current = 0;
                None
            }
        }
    }

    /// Duration of the interval still in progress, if any
    /// مدة الفترة الجارية، إن وجدت
    pub fn open_duration(&self) -> Option<u64> {
        if self.current > 0 {
            Some(self.current)
        } else {
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Unit Tests / اختبارات الوحدة
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a flag sequence through a fresh tracker, returning the emitted
    /// durations. `was_moving` is derived the way the classifier derives it.
    fn run_flags(flags: &[bool], period: u64) -> (IntervalTracker, Vec<u64>) {
        let mut tracker = IntervalTracker::new();
        let mut emitted = Vec::new();
        let mut was_moving = false;

        for &moving in flags {
            if let Some(d) = tracker.observe(moving, was_moving, period) {
                emitted.push(d);
            }
            was_moving = moving;
        }

        (tracker, emitted)
    }

    #[test]
    fn test_single_interval_with_reset() {
        // [F, T, T, T, F] with period 2 → one interval of 6, accumulator 0
        let (tracker, emitted) = run_flags(&[false, true, true, true, false], 2);

        assert_eq!(emitted, vec![6]);
        assert_eq!(tracker.open_duration(), None);
    }

    #[test]
    fn test_trailing_open_interval_is_dropped() {
        // [F, T, T] → the open interval is never emitted
        let (tracker, emitted) = run_flags(&[false, true, true], 2);

        assert!(emitted.is_empty());
        assert_eq!(tracker.open_duration(), Some(4));
    }

    #[test]
    fn test_multiple_intervals_in_order() {
        let flags = [false, true, false, true, true, false, false, true, false];
        let (_, emitted) = run_flags(&flags, 2);

        assert_eq!(emitted, vec![2, 4, 2]);
    }

    #[test]
    fn test_all_quiet_emits_nothing() {
        let (tracker, emitted) = run_flags(&[false, false, false, false], 2);

        assert!(emitted.is_empty());
        assert_eq!(tracker.open_duration(), None);
    }

    #[test]
    fn test_single_sample_blip() {
        // One lone moving sample still counts a full period
        let (_, emitted) = run_flags(&[false, true, false], 3);

        assert_eq!(emitted, vec![3]);
    }
}
