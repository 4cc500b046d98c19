// ═══════════════════════════════════════════════════════════════════════════════
// 📦 mqtt_reader.rs - MQTT Position Message Reader
// ═══════════════════════════════════════════════════════════════════════════════
// This module handles reading acceleration messages from the MQTT broker.
// Features:
// - Runs in background thread
// - Subscribes to the position topic at QoS 0
// - Uses parser to decode payloads
// - Ingests samples into SessionState in arrival order
// - Logs and counts undecodable messages without stopping
// ═══════════════════════════════════════════════════════════════════════════════

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rumqttc::{Client, Event, MqttOptions, Packet, QoS, RecvTimeoutError};

use crate::parser::AccelParser;
use crate::state::SharedState;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Reader Configuration / إعدادات القارئ
// ═══════════════════════════════════════════════════════════════════════════════

/// Default broker port / منفذ الوسيط الافتراضي
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Default subscription topic / موضوع الاشتراك الافتراضي
pub const DEFAULT_TOPIC: &str = "iot/position/#";

/// Poll timeout in milliseconds / مهلة الاستطلاع بالميلي ثانية
const POLL_TIMEOUT_MS: u64 = 250;

/// Pause before retrying a broken connection / توقف قبل إعادة المحاولة
const RECONNECT_PAUSE_MS: u64 = 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 MQTT Reader Structure / هيكل قارئ MQTT
// ═══════════════════════════════════════════════════════════════════════════════

/// MQTT reader for acceleration messages
/// قارئ MQTT لرسائل التسارع
pub struct MqttReader {
    /// Broker host name or address / اسم أو عنوان الوسيط
    broker: String,

    /// Broker port / منفذ الوسيط
    port: u16,

    /// Subscription topic / موضوع الاشتراك
    topic: String,

    /// Shared session state / حالة الجلسة المشتركة
    state: SharedState,

    /// Flag to stop the reader thread / علامة لإيقاف خيط القارئ
    stop_flag: Arc<AtomicBool>,

    /// Handle to the reader thread / مقبض خيط القارئ
    thread_handle: Option<JoinHandle<()>>,
}

impl MqttReader {
    /// Create a new MQTT reader
    /// إنشاء قارئ MQTT جديد
    pub fn new(state: SharedState, broker: String, port: u16, topic: String) -> Self {
        Self {
            broker,
            port,
            topic,
            state,
            stop_flag: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start the reader thread
    /// بدء خيط القارئ
    pub fn start(&mut self) -> Result<(), String> {
        // Check if already running
        if self.thread_handle.is_some() {
            return Err("MQTT reader already running".to_string());
        }

        // Reset stop flag
        self.stop_flag.store(false, Ordering::SeqCst);

        let broker = self.broker.clone();
        let port = self.port;
        let topic = self.topic.clone();
        let state = Arc::clone(&self.state);
        let stop_flag = Arc::clone(&self.stop_flag);

        log::info!("connecting to {}:{} topic {}", broker, port, topic);

        // Spawn the reader thread
        let handle = thread::spawn(move || {
            run_mqtt_reader(&broker, port, &topic, &state, &stop_flag);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop the reader thread
    /// إيقاف خيط القارئ
    pub fn stop(&mut self) {
        // Set stop flag / تعيين علامة الإيقاف
        self.stop_flag.store(true, Ordering::SeqCst);

        // Wait for thread to finish / انتظار انتهاء الخيط
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }

        // Update state / تحديث الحالة
        if let Ok(mut guard) = self.state.lock() {
            guard.receiver_active = false;
        }
    }
}

impl Drop for MqttReader {
    fn drop(&mut self) {
        self.stop();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Reader Thread Function / دالة خيط القارئ
// ═══════════════════════════════════════════════════════════════════════════════

/// Main function that runs in the MQTT reader thread
/// الدالة الرئيسية التي تعمل في خيط قارئ MQTT
///
/// One thread drains one connection, so samples reach the session in
/// publish order; the delta features depend on that ordering.
fn run_mqtt_reader(
    broker: &str,
    port: u16,
    topic: &str,
    state: &SharedState,
    stop_flag: &Arc<AtomicBool>,
) {
    let client_id = format!("motion-calib-{}", std::process::id());
    let mut options = MqttOptions::new(client_id, broker, port);
    options.set_keep_alive(Duration::from_secs(5));

    let (client, mut connection) = Client::new(options, 64);

    if let Err(e) = client.subscribe(topic, QoS::AtMostOnce) {
        log::error!("failed to subscribe to {}: {}", topic, e);
        return;
    }

    let parser = AccelParser::new();

    // Main polling loop / حلقة الاستطلاع الرئيسية
    while !stop_flag.load(Ordering::SeqCst) {
        match connection.recv_timeout(Duration::from_millis(POLL_TIMEOUT_MS)) {
            Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                let payload = String::from_utf8_lossy(&publish.payload);
                handle_payload(&parser, &payload, state);
            }
            Ok(Ok(Event::Incoming(Packet::ConnAck(_)))) => {
                log::info!("connected to broker {}:{}", broker, port);
                if let Ok(mut guard) = state.lock() {
                    guard.receiver_active = true;
                }
            }
            Ok(Ok(_)) => {
                // Other protocol events are uninteresting / أحداث أخرى غير مهمة
            }
            Ok(Err(e)) => {
                // Connection error: report, pause, let rumqttc reconnect
                // خطأ اتصال: الإبلاغ، التوقف، ثم إعادة المحاولة
                log::warn!("mqtt connection error: {}", e);
                if let Ok(mut guard) = state.lock() {
                    guard.receiver_active = false;
                }
                thread::sleep(Duration::from_millis(RECONNECT_PAUSE_MS));
            }
            Err(RecvTimeoutError::Timeout) => {
                // No event, keep polling / لا أحداث، متابعة الاستطلاع
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = client.disconnect();

    // Update state to show stopped / تحديث الحالة لإظهار التوقف
    if let Ok(mut guard) = state.lock() {
        guard.receiver_active = false;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 🔹 Payload Handling / معالجة الرسائل
// ═══════════════════════════════════════════════════════════════════════════════

/// Decode one payload and feed it to the session
/// فك ترميز رسالة واحدة وتمريرها إلى الجلسة
fn handle_payload(parser: &AccelParser, payload: &str, state: &SharedState) {
    let Ok(mut guard) = state.lock() else {
        return;
    };

    match parser.parse_payload(payload) {
        Ok(sample) => {
            let record = guard.ingest_sample(sample);
            if guard.echo {
                println!("{}", record.diagnostic_row());
            }
        }
        Err(e) => {
            // A bad message is skipped, the stream continues
            // الرسالة السيئة تُتجاهل ويستمر التدفق
            guard.record_decode_error();
            log::warn!("skipping malformed message: {}", e);
        }
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

    #[test]
    fn test_mqtt_reader_creation() {
        let state = create_shared_state(DetectionConfig::default());
        let _reader = MqttReader::new(
            state,
            "localhost".to_string(),
            DEFAULT_BROKER_PORT,
            DEFAULT_TOPIC.to_string(),
        );
    }

    #[test]
    fn test_handle_payload_counts_bad_messages() {
        let state = create_shared_state(DetectionConfig::default());
        let parser = AccelParser::new();

        handle_payload(&parser, r#"{"last_accel":"0,42,92"}"#, &state);
        handle_payload(&parser, "not json", &state);

        let guard = state.lock().unwrap();
        assert_eq!(guard.samples_processed, 1);
        assert_eq!(guard.decode_errors, 1);
    }
}
