// ═══════════════════════════════════════════════════════════════════════════════
// 📦 parser.rs - Acceleration Message Parser
// ═══════════════════════════════════════════════════════════════════════════════
// This module parses one raw position message into an acceleration sample.
// The payload is a JSON object whose "last_accel" field holds a textual list
// of exactly three numbers, e.g. {"last_accel": "1.0,-2.0,3.5"}.
// Extracts the numbers and validates the cardinality.
// ═══════════════════════════════════════════════════════════════════════════════

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::state::AccelSample;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Constants / الثوابت
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON field carrying the acceleration list / حقل JSON الحامل لقائمة التسارع
pub const ACCEL_FIELD: &str = "last_accel";

/// Number of components in one sample / عدد المركبات في العينة الواحدة
pub const ACCEL_COMPONENTS: usize = 3;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Decode Error / خطأ فك الترميز
// ═══════════════════════════════════════════════════════════════════════════════

/// Why one message could not be decoded
/// سبب تعذر فك ترميز رسالة واحدة
///
/// All variants are recoverable per message: the caller reports and skips,
/// and the stream continues with the next message.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not well-formed JSON / الرسالة ليست JSON سليمة
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The expected field is absent or not text / الحقل المتوقع غائب
    #[error("payload has no textual `{ACCEL_FIELD}` field")]
    MissingField,

    /// The list did not hold exactly three numbers / القائمة ليست ثلاثية
    #[error("acceleration list has {found} values, expected {ACCEL_COMPONENTS}")]
    BadVector { found: usize },

    /// The list text holds more than numbers and separators
    /// نص القائمة يحتوي أكثر من الأرقام والفواصل
    #[error("acceleration list contains non-numeric text")]
    NotNumeric,
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Acceleration Parser / محلل التسارع
// ═══════════════════════════════════════════════════════════════════════════════

/// Parser for raw position messages
/// محلل رسائل الموقع الخام
pub struct AccelParser {
    /// Regex pattern to extract numbers from the acceleration field
    /// نمط التعبير النمطي لاستخراج الأرقام من حقل التسارع
    number_regex: Regex,
}

impl AccelParser {
    /// Create a new parser instance / إنشاء مثيل محلل جديد
    pub fn new() -> Self {
        // Pattern matches integers and decimals, with optional exponent
        // النمط يطابق الأعداد الصحيحة والعشرية، مع أس اختياري
        let number_regex =
            Regex::new(r"-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?").expect("Failed to compile regex");

        Self { number_regex }
    }

    /// Parse one raw message payload into an acceleration sample
    /// تحليل رسالة خام واحدة إلى عينة تسارع
    ///
    /// # Arguments
    /// * `payload` - Raw message text (JSON object)
    ///
    /// # Returns
    /// * `Result<AccelSample, DecodeError>` - Sample or recoverable error
    pub fn parse_payload(&self, payload: &str) -> Result<AccelSample, DecodeError> {
        let envelope: Value = serde_json::from_str(payload)?;

        let field = envelope
            .get(ACCEL_FIELD)
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingField)?;

        self.parse_accel_list(field)
    }

    /// Parse the textual acceleration list itself
    /// تحليل قائمة التسارع النصية نفسها
    ///
    /// Only digits, separators and number punctuation are allowed; the
    /// reference parses this text as a JSON array, so junk-interleaved
    /// digits must not slip through as a valid list.
    pub fn parse_accel_list(&self, text: &str) -> Result<AccelSample, DecodeError> {
        let clean = text.chars().all(|c| {
            c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | ',' | '+' | '-' | 'e' | 'E')
        });
        if !clean {
            return Err(DecodeError::NotNumeric);
        }

        let values: Vec<f64> = self
            .number_regex
            .find_iter(text)
            .filter_map(|m| m.as_str().parse::<f64>().ok())
            .collect();

        if values.len() != ACCEL_COMPONENTS {
            return Err(DecodeError::BadVector {
                found: values.len(),
            });
        }

        Ok(AccelSample::new(values[0], values[1], values[2]))
    }
}

impl Default for AccelParser {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Helper Functions / دوال مساعدة
// ═══════════════════════════════════════════════════════════════════════════════

/// Re-encode a sample as the comma-separated field text
/// إعادة ترميز عينة كنص الحقل المفصول بفواصل
#[allow(dead_code)]
pub fn encode_accel_list(sample: &AccelSample) -> String {
    format!("{},{},{}", sample.x, sample.y, sample.z)
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Unit Tests / اختبارات الوحدة
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_payload() {
        let parser = AccelParser::new();
        let payload = r#"{"id":"dev-1","last_accel":"0, 42, 92"}"#;

        let sample = parser.parse_payload(payload).unwrap();

        assert_eq!(sample, AccelSample::new(0.0, 42.0, 92.0));
    }

    #[test]
    fn test_parse_negative_and_decimal() {
        let parser = AccelParser::new();
        let payload = r#"{"last_accel":"1.0,-2.0,3.5"}"#;

        let sample = parser.parse_payload(payload).unwrap();

        assert!((sample.x - 1.0).abs() < 1e-12);
        assert!((sample.y + 2.0).abs() < 1e-12);
        assert!((sample.z - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let parser = AccelParser::new();

        let err = parser.parse_payload("not json at all").unwrap_err();

        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let parser = AccelParser::new();

        let err = parser.parse_payload(r#"{"temp":"21"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField));

        // A non-textual field counts as missing too
        let err = parser
            .parse_payload(r#"{"last_accel":[1,2,3]}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingField));
    }

    #[test]
    fn test_wrong_cardinality_is_rejected() {
        let parser = AccelParser::new();

        let err = parser
            .parse_payload(r#"{"last_accel":"1,2"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::BadVector { found: 2 }));

        let err = parser
            .parse_payload(r#"{"last_accel":"1,2,3,4"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::BadVector { found: 4 }));
    }

    #[test]
    fn test_junk_interleaved_text_is_rejected() {
        let parser = AccelParser::new();

        // Three digits buried in prose are not an acceleration list
        let err = parser
            .parse_payload(r#"{"last_accel":"foo1bar2baz3"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::NotNumeric));

        let err = parser.parse_accel_list("1,2,3 units").unwrap_err();
        assert!(matches!(err, DecodeError::NotNumeric));

        // Plain separators and signs stay accepted
        assert!(parser.parse_accel_list(" 1.0, -2.0, 3.5 ").is_ok());
    }

    #[test]
    fn test_encode_round_trip() {
        let parser = AccelParser::new();
        let original = AccelSample::new(1.0, -2.0, 3.5);

        let text = encode_accel_list(&original);
        let decoded = parser.parse_accel_list(&text).unwrap();

        assert!((decoded.x - original.x).abs() < 1e-9);
        assert!((decoded.y - original.y).abs() < 1e-9);
        assert!((decoded.z - original.z).abs() < 1e-9);
    }
}
