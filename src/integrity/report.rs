//! Integrity report data model.
//!
//! These structures are the durable, queryable artifacts of an analysis run
//! and are stored as-is (serde field names are the wire names).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verification status of a report, and of individual players within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityStatus {
    Pending,
    Valid,
    Suspicious,
    Flagged,
}

/// Categories of detected violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    // File integrity
    HashMismatch,
    FileTampered,
    InvalidFormat,
    Corrupted,

    // Gameplay
    AimbotDetected,
    WallhackIndicator,
    SpeedAnomaly,
    TeleportDetected,
    SpinbotPattern,
    BhopAnomaly,

    // Statistical
    ImpossibleHeadshots,
    AbnormalReactionTime,
    PerfectRecoilControl,
    SuspiciousPrefire,

    // Data manipulation
    TimestampAnomaly,
    TickManipulation,
    EventInjection,
}

/// Violation importance. Drives score weighting and player escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ViolationSeverity {
    /// Weight contributed to the report-level suspicion score.
    pub fn report_weight(&self) -> f64 {
        match self {
            ViolationSeverity::Critical => 25.0,
            ViolationSeverity::High => 15.0,
            ViolationSeverity::Medium => 8.0,
            ViolationSeverity::Low => 3.0,
        }
    }

    /// Weight contributed to a player's own suspicion score.
    pub fn player_weight(&self) -> f64 {
        match self {
            ViolationSeverity::Critical => 30.0,
            ViolationSeverity::High => 20.0,
            ViolationSeverity::Medium => 10.0,
            ViolationSeverity::Low => 5.0,
        }
    }
}

/// One detected indicator of tampering or cheating. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityViolation {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub severity: ViolationSeverity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_number: Option<i64>,
    pub timestamp: DateTime<Utc>,
    /// Free-form supporting evidence.
    pub evidence: serde_json::Value,
    /// Detector confidence in [0.0, 1.0].
    pub confidence: f64,
}

impl IntegrityViolation {
    pub fn new(
        violation_type: ViolationType,
        severity: ViolationSeverity,
        confidence: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            violation_type,
            severity,
            description: description.into(),
            player_id: None,
            tick_number: None,
            timestamp: Utc::now(),
            evidence: serde_json::Value::Null,
            confidence,
        }
    }

    pub fn with_player(mut self, player_id: Uuid) -> Self {
        self.player_id = Some(player_id);
        self
    }

    pub fn with_tick(mut self, tick: i64) -> Self {
        self.tick_number = Some(tick);
        self
    }

    pub fn with_evidence(mut self, evidence: serde_json::Value) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Statistical snapshot derived from one player's events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchStats {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshots: u32,
    pub headshot_percent: f64,

    // Aiming
    pub shots_total: u32,
    pub shots_hit: u32,
    pub accuracy: f64,

    // Reaction times (ms)
    pub avg_reaction_time_ms: f64,
    pub min_reaction_time_ms: f64,
    pub max_reaction_time_ms: f64,

    // Movement
    pub avg_movement_speed: f64,
    pub max_movement_speed: f64,
    pub bunny_hop_count: u32,
    pub perfect_bhops: u32,

    // View angles
    pub avg_aim_speed_deg_per_sec: f64,
    pub max_aim_speed_deg_per_sec: f64,
    /// Suspicious instant aim adjustments.
    pub snap_count: u32,
}

/// Per-player slice of an integrity report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerIntegrityReport {
    pub player_id: Uuid,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub network_id: String,
    pub status: IntegrityStatus,
    pub score: f64,
    pub violations: Vec<IntegrityViolation>,
    pub stats: PlayerMatchStats,
    pub anomaly_flags: Vec<String>,
}

/// Full integrity analysis for one replay. Created once per analysis run;
/// mutated only by the review workflow afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayIntegrityReport {
    pub id: Uuid,
    pub replay_id: Uuid,
    pub game_id: String,
    pub status: IntegrityStatus,

    // File integrity
    pub file_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    pub file_size: u64,

    // Analysis results
    pub violations: Vec<IntegrityViolation>,
    pub violation_count: usize,
    /// 0-100, higher = more suspicious.
    pub overall_score: f64,
    pub player_reports: Vec<PlayerIntegrityReport>,

    // Timing
    pub analyzed_at: DateTime<Utc>,
    pub analysis_duration_ms: u64,

    // Metadata
    pub analyzer_version: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub game_version: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub map_name: String,
    pub match_duration_seconds: f64,

    // Review
    pub review_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub review_notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_verdict: Option<IntegrityStatus>,
}

/// Detection thresholds driving analyzer decisions. Supplied at engine
/// construction, immutable thereafter.
#[derive(Debug, Clone)]
pub struct IntegrityThresholds {
    /// Headshot percentage above this triggers investigation.
    pub max_headshot_percent: f64,
    /// Reaction times below this are suspicious.
    pub min_reaction_time_ms: f64,
    /// Angular speed above this triggers snap detection.
    pub max_aim_speed_deg_per_sec: f64,
    /// Ratio of perfect bunny hops above this is anomalous.
    pub perfect_bhop_threshold: f64,
    /// Player score at which manual review is triggered.
    pub high_suspicion_score: f64,
}

impl Default for IntegrityThresholds {
    fn default() -> Self {
        Self {
            max_headshot_percent: 75.0,
            min_reaction_time_ms: 80.0,
            max_aim_speed_deg_per_sec: 3000.0,
            perfect_bhop_threshold: 0.8,
            high_suspicion_score: 50.0,
        }
    }
}

impl IntegrityThresholds {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        Self {
            max_headshot_percent: env_f64(
                "INTEGRITY_MAX_HEADSHOT_PERCENT",
                defaults.max_headshot_percent,
            ),
            min_reaction_time_ms: env_f64(
                "INTEGRITY_MIN_REACTION_TIME_MS",
                defaults.min_reaction_time_ms,
            ),
            max_aim_speed_deg_per_sec: env_f64(
                "INTEGRITY_MAX_AIM_SPEED_DEG_PER_SEC",
                defaults.max_aim_speed_deg_per_sec,
            ),
            perfect_bhop_threshold: env_f64(
                "INTEGRITY_PERFECT_BHOP_THRESHOLD",
                defaults.perfect_bhop_threshold,
            ),
            high_suspicion_score: env_f64(
                "INTEGRITY_HIGH_SUSPICION_SCORE",
                defaults.high_suspicion_score,
            ),
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_types_serialize_to_wire_names() {
        let v = serde_json::to_value(ViolationType::HashMismatch).unwrap();
        assert_eq!(v, "HASH_MISMATCH");
        let v = serde_json::to_value(ViolationType::AbnormalReactionTime).unwrap();
        assert_eq!(v, "ABNORMAL_REACTION_TIME");
        let v = serde_json::to_value(ViolationType::BhopAnomaly).unwrap();
        assert_eq!(v, "BHOP_ANOMALY");
    }

    #[test]
    fn severity_ordering_matches_escalation() {
        assert!(ViolationSeverity::Critical > ViolationSeverity::High);
        assert!(ViolationSeverity::High > ViolationSeverity::Medium);
        assert!(ViolationSeverity::Medium > ViolationSeverity::Low);
    }

    #[test]
    fn violation_builder_sets_optional_fields() {
        let player = Uuid::new_v4();
        let v = IntegrityViolation::new(
            ViolationType::SpinbotPattern,
            ViolationSeverity::Critical,
            0.85,
            "impossible aim speed",
        )
        .with_player(player)
        .with_tick(42)
        .with_evidence(serde_json::json!({"angle_speed": 9000.0}));

        assert_eq!(v.player_id, Some(player));
        assert_eq!(v.tick_number, Some(42));
        assert_eq!(v.evidence["angle_speed"], 9000.0);
    }

    #[test]
    fn default_thresholds_match_reference_values() {
        let t = IntegrityThresholds::default();
        assert_eq!(t.max_headshot_percent, 75.0);
        assert_eq!(t.min_reaction_time_ms, 80.0);
        assert_eq!(t.max_aim_speed_deg_per_sec, 3000.0);
        assert_eq!(t.perfect_bhop_threshold, 0.8);
        assert_eq!(t.high_suspicion_score, 50.0);
    }
}
