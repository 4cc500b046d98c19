// ═══════════════════════════════════════════════════════════════════════════════
// 📦 csv_logger.rs - CSV Feature Logger
// ═══════════════════════════════════════════════════════════════════════════════
// This module logs every classified sample to a CSV file.
// Features:
// - One row per sample: timestamp, raw vector, derived features, verdict
// - Auto-generated file name with UTC timestamp
// - Flushes on exit
// ═══════════════════════════════════════════════════════════════════════════════

use std::fs::File;
use std::path::PathBuf;

use chrono::Utc;
use csv::Writer;

use crate::state::SampleRecord;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Feature Logger Structure / هيكل مسجل الخصائص
// ═══════════════════════════════════════════════════════════════════════════════

/// CSV logger for classified samples
/// مسجل CSV للعينات المصنفة
pub struct FeatureLogger {
    /// CSV writer / كاتب CSV
    writer: Writer<File>,
}

impl FeatureLogger {
    /// Create a new feature logger
    /// إنشاء مسجل خصائص جديد
    ///
    /// # Arguments
    /// * `file_path` - Path where to save the CSV file
    ///
    /// # Returns
    /// * `Result<FeatureLogger, String>` - Logger instance or error message
    pub fn new(file_path: PathBuf) -> Result<Self, String> {
        let mut writer = Writer::from_path(&file_path)
            .map_err(|e| format!("Failed to create CSV file: {}", e))?;

        // Write header once / كتابة الترويسة مرة واحدة
        writer
            .write_record([
                "timestamp_ms",
                "x",
                "y",
                "z",
                "modulo",
                "delta_modulo",
                "alfa",
                "delta_alfa",
                "gamma",
                "delta_gamma",
                "moving",
            ])
            .map_err(|e| format!("Failed to write header: {}", e))?;

        Ok(Self { writer })
    }

    /// Create a new feature logger with auto-generated filename
    /// إنشاء مسجل خصائص جديد باسم ملف تلقائي
    pub fn new_with_timestamp() -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("motion_log_{}.csv", timestamp);
        let path = PathBuf::from(filename);

        Self::new(path)
    }

    /// Write one classified sample to the CSV file
    /// كتابة عينة مصنفة واحدة إلى ملف CSV
    pub fn log_record(&mut self, record: &SampleRecord) -> Result<(), String> {
        let f = &record.features;

        self.writer
            .write_record([
                record.timestamp.to_string(),
                record.sample.x.to_string(),
                record.sample.y.to_string(),
                record.sample.z.to_string(),
                f.modulo.to_string(),
                f.delta_modulo.to_string(),
                f.alfa.to_string(),
                f.delta_alfa.to_string(),
                f.gamma.to_string(),
                f.delta_gamma.to_string(),
                record.moving.to_string(),
            ])
            .map_err(|e| format!("Failed to write row: {}", e))
    }

    /// Flush all buffered data to disk
    /// تفريغ جميع البيانات المخزنة إلى القرص
    pub fn flush(&mut self) -> Result<(), String> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush CSV: {}", e))
    }
}

impl Drop for FeatureLogger {
    /// Ensure data is flushed when logger is dropped
    /// ضمان تفريغ البيانات عند إسقاط المسجل
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Unit Tests / اختبارات الوحدة
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AccelSample, DerivedFeatures};
    use std::fs;

    fn test_record() -> SampleRecord {
        SampleRecord {
            timestamp: 1234567890,
            sample: AccelSample::new(0.0, 42.0, 92.0),
            features: DerivedFeatures {
                modulo: 427.0,
                alfa: 1.57,
                gamma: 0.0,
                delta_modulo: 427.0,
                delta_alfa: 1.57,
                delta_gamma: 0.0,
            },
            moving: false,
        }
    }

    #[test]
    fn test_logger_creation() {
        let path = PathBuf::from("test_feature_log.csv");
        let logger = FeatureLogger::new(path.clone());

        assert!(logger.is_ok());

        // Cleanup / تنظيف
        drop(logger);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_logging_writes_header_and_row() {
        let path = PathBuf::from("test_feature_rows.csv");
        let mut logger = FeatureLogger::new(path.clone()).unwrap();

        logger.log_record(&test_record()).unwrap();
        logger.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().starts_with("timestamp_ms,x,y,z,modulo"));
        assert!(lines.next().unwrap().starts_with("1234567890,0,42,92,427"));

        // Cleanup / تنظيف
        drop(logger);
        let _ = fs::remove_file(path);
    }
}
