// ═══════════════════════════════════════════════════════════════════════════════
// 📦 detectors/mod.rs - Motion Detection Module
// ═══════════════════════════════════════════════════════════════════════════════
// كشف الحركة من قراءات التسارع (التصنيف، تتبع الفترات، المعايرة)
// Motion detection from acceleration readings (classification, interval
// tracking, threshold calibration)
// ═══════════════════════════════════════════════════════════════════════════════

pub mod calibrator;
pub mod classifier;
pub mod tracker;
