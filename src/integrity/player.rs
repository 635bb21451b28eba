//! Per-player statistical analysis and scoring.

use crate::integrity::analyzers::ASSUMED_TICK_RATE;
use crate::integrity::data::{PlayerData, ReplayAnalysisData};
use crate::integrity::report::{
    IntegrityStatus, IntegrityThresholds, IntegrityViolation, PlayerIntegrityReport,
    PlayerMatchStats, ViolationSeverity, ViolationType,
};
use serde_json::json;
use uuid::Uuid;

/// Anomaly flag names recorded on player reports.
pub const FLAG_HIGH_HEADSHOT_RATE: &str = "HIGH_HEADSHOT_RATE";
pub const FLAG_INHUMAN_REACTION: &str = "INHUMAN_REACTION";
pub const FLAG_PERFECT_BHOP_RATIO: &str = "PERFECT_BHOP_RATIO";

/// Minimum bunny hops before the perfect-hop ratio means anything.
const MIN_BHOPS_FOR_RATIO: u32 = 10;

/// Build the integrity report for one player from their events and tick
/// states: derived stats, anomaly flags, violations, score and status.
pub fn analyze_player(
    data: &ReplayAnalysisData,
    player: &PlayerData,
    thresholds: &IntegrityThresholds,
) -> PlayerIntegrityReport {
    let stats = calculate_player_stats(data, player.player_id, thresholds);

    let mut report = PlayerIntegrityReport {
        player_id: player.player_id,
        network_id: player.network_id.clone(),
        status: IntegrityStatus::Valid,
        score: 0.0,
        violations: Vec::new(),
        stats,
        anomaly_flags: Vec::new(),
    };

    if report.stats.headshot_percent > thresholds.max_headshot_percent {
        report.anomaly_flags.push(FLAG_HIGH_HEADSHOT_RATE.to_string());
        report.violations.push(
            IntegrityViolation::new(
                ViolationType::ImpossibleHeadshots,
                ViolationSeverity::High,
                0.7,
                format!(
                    "Headshot rate {:.1}% exceeds threshold",
                    report.stats.headshot_percent
                ),
            )
            .with_player(player.player_id)
            .with_evidence(json!({
                "headshot_percent": report.stats.headshot_percent,
                "threshold": thresholds.max_headshot_percent,
                "headshots": report.stats.headshots,
                "kills": report.stats.kills,
            })),
        );
    }

    if report.stats.min_reaction_time_ms > 0.0
        && report.stats.min_reaction_time_ms < thresholds.min_reaction_time_ms
    {
        report.anomaly_flags.push(FLAG_INHUMAN_REACTION.to_string());
        report.violations.push(
            IntegrityViolation::new(
                ViolationType::AbnormalReactionTime,
                ViolationSeverity::High,
                0.8,
                format!(
                    "Reaction time {:.1}ms below human threshold",
                    report.stats.min_reaction_time_ms
                ),
            )
            .with_player(player.player_id)
            .with_evidence(json!({
                "min_reaction_time": report.stats.min_reaction_time_ms,
                "threshold": thresholds.min_reaction_time_ms,
                "avg_reaction_time": report.stats.avg_reaction_time_ms,
            })),
        );
    }

    if report.stats.bunny_hop_count >= MIN_BHOPS_FOR_RATIO {
        let ratio = report.stats.perfect_bhops as f64 / report.stats.bunny_hop_count as f64;
        if ratio > thresholds.perfect_bhop_threshold {
            report.anomaly_flags.push(FLAG_PERFECT_BHOP_RATIO.to_string());
            report.violations.push(
                IntegrityViolation::new(
                    ViolationType::BhopAnomaly,
                    ViolationSeverity::Medium,
                    0.65,
                    format!("Perfect bunny hop ratio {:.2} exceeds threshold", ratio),
                )
                .with_player(player.player_id)
                .with_evidence(json!({
                    "perfect_bhop_ratio": ratio,
                    "threshold": thresholds.perfect_bhop_threshold,
                    "bunny_hop_count": report.stats.bunny_hop_count,
                    "perfect_bhops": report.stats.perfect_bhops,
                })),
            );
        }
    }

    report.score = calculate_player_score(&report);
    if report.score >= thresholds.high_suspicion_score {
        report.status = IntegrityStatus::Suspicious;
    }
    if !report.violations.is_empty() && max_severity(&report.violations) == ViolationSeverity::Critical
    {
        report.status = IntegrityStatus::Flagged;
    }

    report
}

/// Derive a player's match stats purely from their own events, plus
/// movement extremes from the tick snapshots.
pub fn calculate_player_stats(
    data: &ReplayAnalysisData,
    player_id: Uuid,
    thresholds: &IntegrityThresholds,
) -> PlayerMatchStats {
    let mut stats = PlayerMatchStats::default();

    let mut reaction_times: Vec<f64> = Vec::new();
    let mut aim_speed_sum = 0.0;
    let mut aim_samples = 0u32;
    let mut last_event: Option<&crate::integrity::data::GameEvent> = None;

    for event in &data.events {
        if event.player_id != player_id {
            continue;
        }

        match event.event_type.as_str() {
            "kill" => {
                stats.kills += 1;
                if event.data_bool("headshot") {
                    stats.headshots += 1;
                }
                if let Some(rt) = event.data_f64("reaction_time_ms") {
                    reaction_times.push(rt);
                }
            }
            "death" => stats.deaths += 1,
            "assist" => stats.assists += 1,
            "shot" => {
                stats.shots_total += 1;
                if event.data_bool("hit") {
                    stats.shots_hit += 1;
                }
            }
            "bunny_hop" => {
                stats.bunny_hop_count += 1;
                if event.data_bool("perfect") {
                    stats.perfect_bhops += 1;
                }
            }
            _ => {}
        }

        // Aim-speed extremes over this player's consecutive events.
        if let Some(prev) = last_event {
            let tick_diff = event.tick - prev.tick;
            if tick_diff > 0 {
                let angle_diff = prev.view_angles.diff_degrees(&event.view_angles);
                let angle_speed = angle_diff / tick_diff as f64 * ASSUMED_TICK_RATE;
                aim_speed_sum += angle_speed;
                aim_samples += 1;
                if angle_speed > stats.max_aim_speed_deg_per_sec {
                    stats.max_aim_speed_deg_per_sec = angle_speed;
                }
                if angle_speed > thresholds.max_aim_speed_deg_per_sec {
                    stats.snap_count += 1;
                }
            }
        }
        last_event = Some(event);
    }

    if stats.kills > 0 {
        stats.headshot_percent = stats.headshots as f64 / stats.kills as f64 * 100.0;
    }
    if stats.shots_total > 0 {
        stats.accuracy = stats.shots_hit as f64 / stats.shots_total as f64 * 100.0;
    }
    if !reaction_times.is_empty() {
        stats.min_reaction_time_ms = reaction_times.iter().copied().fold(f64::MAX, f64::min);
        stats.max_reaction_time_ms = reaction_times.iter().copied().fold(0.0, f64::max);
        stats.avg_reaction_time_ms =
            reaction_times.iter().sum::<f64>() / reaction_times.len() as f64;
    }
    if aim_samples > 0 {
        stats.avg_aim_speed_deg_per_sec = aim_speed_sum / aim_samples as f64;
    }

    // Movement extremes from tick snapshots.
    let mut speed_sum = 0.0;
    let mut speed_samples = 0u32;
    for pair in data.tick_data.windows(2) {
        let tick_gap = pair[1].tick - pair[0].tick;
        if tick_gap <= 0 {
            continue;
        }
        let current = pair[1].players.iter().find(|p| p.player_id == player_id);
        let previous = pair[0].players.iter().find(|p| p.player_id == player_id);
        if let (Some(current), Some(previous)) = (current, previous) {
            if !current.is_alive || !previous.is_alive {
                continue;
            }
            let speed = current.position.distance_to(&previous.position) / tick_gap as f64
                * ASSUMED_TICK_RATE;
            speed_sum += speed;
            speed_samples += 1;
            if speed > stats.max_movement_speed {
                stats.max_movement_speed = speed;
            }
        }
    }
    if speed_samples > 0 {
        stats.avg_movement_speed = speed_sum / speed_samples as f64;
    }

    stats
}

/// Severity/confidence-weighted sum of a player's violations plus a flat
/// bump per anomaly flag, clamped to [0, 100].
pub fn calculate_player_score(report: &PlayerIntegrityReport) -> f64 {
    let mut score: f64 = report
        .violations
        .iter()
        .map(|v| v.severity.player_weight() * v.confidence)
        .sum();

    score += report.anomaly_flags.len() as f64 * 5.0;

    score.min(100.0)
}

/// Highest severity present in a violation list.
pub fn max_severity(violations: &[IntegrityViolation]) -> ViolationSeverity {
    violations
        .iter()
        .map(|v| v.severity)
        .max()
        .unwrap_or(ViolationSeverity::Low)
}
