//! Replay Integrity
//!
//! Cheat and tamper detection over parsed replay data: SHA-256 hash
//! verification, built-in temporal/spatial/statistical analyzers, pluggable
//! anti-cheat hooks, 0-100 suspicion scoring and a manual-review workflow.

pub mod analyzers;
pub mod data;
pub mod engine;
pub mod hooks;
pub mod player;
pub mod report;


pub use data::ReplayAnalysisData;
pub use engine::{IntegrityReportRepository, ReplayIntegrityService, ANALYZER_VERSION};
pub use hooks::AntiCheatHook;
pub use report::{
    IntegrityStatus, IntegrityThresholds, IntegrityViolation, ReplayIntegrityReport,
    ViolationSeverity, ViolationType,
};
