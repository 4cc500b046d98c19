// ═══════════════════════════════════════════════════════════════════════════════
// 📦 log_loader.rs - Message Log Replay
// ═══════════════════════════════════════════════════════════════════════════════
// This module replays a stored message log through the classification pipeline.
// Features:
// - One raw payload per line, blank lines skipped
// - Lines are ingested strictly in file order
// - Undecodable lines are warned about and skipped, never abort the run
// ═══════════════════════════════════════════════════════════════════════════════

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::parser::AccelParser;
use crate::state::SharedState;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Replay Statistics / إحصاءات إعادة التشغيل
// ═══════════════════════════════════════════════════════════════════════════════

/// What happened during one replay run
/// ما حدث أثناء إعادة تشغيل واحدة
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Non-blank lines seen / الأسطر غير الفارغة المقروءة
    pub lines: u64,

    /// Samples successfully decoded and classified / العينات المصنفة بنجاح
    pub samples: u64,

    /// Lines skipped as undecodable / الأسطر المتجاهلة
    pub decode_errors: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Log Loader Structure / هيكل محمّل السجل
// ═══════════════════════════════════════════════════════════════════════════════

/// Loader that replays stored message logs
/// محمّل يعيد تشغيل سجلات الرسائل المخزنة
pub struct LogLoader {
    /// Payload parser / محلل الرسائل
    parser: AccelParser,
}

impl LogLoader {
    /// Create a new log loader
    /// إنشاء محمّل سجل جديد
    pub fn new() -> Self {
        Self {
            parser: AccelParser::new(),
        }
    }

    /// Replay a message log file into the session pipeline
    /// إعادة تشغيل ملف سجل الرسائل في خط أنابيب الجلسة
    ///
    /// # Arguments
    /// * `file_path` - Path to the log file (one payload per line)
    /// * `state` - Shared session to ingest into
    ///
    /// # Returns
    /// * `Result<ReplayStats, String>` - Replay counts or an I/O error message
    pub fn replay<P: AsRef<Path>>(
        &self,
        file_path: P,
        state: &SharedState,
    ) -> Result<ReplayStats, String> {
        let file = File::open(file_path.as_ref())
            .map_err(|e| format!("Failed to open log file: {}", e))?;
        let reader = BufReader::new(file);

        let mut stats = ReplayStats::default();

        // Hold the lock for the whole replay: a replay has no other producer,
        // and file order must equal ingestion order.
        // الاحتفاظ بالقفل طوال إعادة التشغيل للحفاظ على الترتيب
        let mut guard = state
            .lock()
            .map_err(|e| format!("Failed to lock session: {}", e))?;

        for (line_num, line_result) in reader.lines().enumerate() {
            let line =
                line_result.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            stats.lines += 1;

            match self.parser.parse_payload(line) {
                Ok(sample) => {
                    let record = guard.ingest_sample(sample);
                    stats.samples += 1;

                    if guard.echo {
                        println!("{}", record.diagnostic_row());
                    }
                }
                Err(e) => {
                    // Warn and continue / تحذير ومتابعة
                    log::warn!("skipping line {}: {}", line_num + 1, e);
                    guard.record_decode_error();
                    stats.decode_errors += 1;
                }
            }
        }

        Ok(stats)
    }
}

impl Default for LogLoader {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Unit Tests / اختبارات الوحدة
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::state::create_shared_state;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_log(path: &PathBuf, lines: &[&str]) {
        let mut file = fs::File::create(path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    #[test]
    fn test_replay_skips_bad_lines_and_keeps_order() {
        let path = PathBuf::from("test_replay_mixed.log");
        write_log(
            &path,
            &[
                r#"{"last_accel":"10,10,10"}"#,
                "",
                "garbage line",
                r#"{"last_accel":"35,0,0"}"#,
                r#"{"last_accel":"30,0,0"}"#,
            ],
        );

        let config = DetectionConfig {
            gravity_reference: 0.0,
            ..DetectionConfig::default()
        };
        let state = create_shared_state(config);

        let stats = LogLoader::new().replay(&path, &state).unwrap();

        assert_eq!(
            stats,
            ReplayStats {
                lines: 4,
                samples: 3,
                decode_errors: 1,
            }
        );

        // modulo sequence 300 → 1225 → 900: one moving sample, interval
        // closed by the last one.
        let guard = state.lock().unwrap();
        assert_eq!(guard.completed_intervals(), &[2]);
        assert_eq!(guard.decode_errors, 1);

        // Cleanup / تنظيف
        drop(guard);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_replay_missing_file_is_an_error() {
        let state = create_shared_state(DetectionConfig::default());

        let result = LogLoader::new().replay("no_such_file.log", &state);

        assert!(result.is_err());
    }
}
