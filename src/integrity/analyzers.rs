//! Built-in temporal and spatial analyzers.
//!
//! Sequential scans over the parsed event stream and the per-tick snapshots.
//! Each detection emits an [`IntegrityViolation`] with its evidence attached;
//! thresholds come from [`IntegrityThresholds`].

use crate::integrity::data::{GameEvent, TickData};
use crate::integrity::report::{IntegrityThresholds, IntegrityViolation, ViolationSeverity, ViolationType};
use serde_json::json;

/// Tick rate assumed when scaling per-tick deltas to per-second rates.
pub const ASSUMED_TICK_RATE: f64 = 128.0;

/// Gaps wider than this between consecutive tick snapshots are suspicious.
pub const MAX_TICK_GAP: i64 = 5;

/// Maximum legitimate movement per tick, in game units.
pub const MAX_UNITS_PER_TICK: f64 = 400.0;

/// Tolerance multiplier applied before calling a move a teleport.
pub const TELEPORT_TOLERANCE: f64 = 1.5;

/// Scan game events in emission order for timestamp anomalies and
/// impossible view-angle changes (snap detection).
pub fn analyze_events(
    events: &[GameEvent],
    thresholds: &IntegrityThresholds,
) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();

    let mut last_tick: i64 = 0;
    for (i, event) in events.iter().enumerate() {
        if event.tick < last_tick {
            violations.push(
                IntegrityViolation::new(
                    ViolationType::TimestampAnomaly,
                    ViolationSeverity::High,
                    0.9,
                    "Event tick is earlier than previous tick",
                )
                .with_tick(event.tick)
                .with_evidence(json!({
                    "event_index": i,
                    "current_tick": event.tick,
                    "previous_tick": last_tick,
                })),
            );
        }
        last_tick = event.tick;

        // Snap detection: consecutive events from the same player.
        if i > 0 && events[i - 1].player_id == event.player_id {
            let angle_diff = events[i - 1].view_angles.diff_degrees(&event.view_angles);
            let tick_diff = event.tick - events[i - 1].tick;
            if tick_diff > 0 {
                let angle_speed = angle_diff / tick_diff as f64 * ASSUMED_TICK_RATE;
                if angle_speed > thresholds.max_aim_speed_deg_per_sec {
                    violations.push(
                        IntegrityViolation::new(
                            ViolationType::SpinbotPattern,
                            ViolationSeverity::Critical,
                            0.85,
                            "Impossible aim speed detected",
                        )
                        .with_player(event.player_id)
                        .with_tick(event.tick)
                        .with_evidence(json!({
                            "angle_speed": angle_speed,
                            "threshold": thresholds.max_aim_speed_deg_per_sec,
                            "angle_diff": angle_diff,
                            "tick_diff": tick_diff,
                        })),
                    );
                }
            }
        }
    }

    violations
}

/// Pairwise scan over consecutive tick snapshots for tick manipulation and
/// physically impossible position changes.
pub fn analyze_tick_data(ticks: &[TickData]) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();

    for pair in ticks.windows(2) {
        let previous = &pair[0];
        let current = &pair[1];

        let tick_gap = current.tick - previous.tick;
        if tick_gap > MAX_TICK_GAP {
            violations.push(
                IntegrityViolation::new(
                    ViolationType::TickManipulation,
                    ViolationSeverity::Medium,
                    0.6,
                    "Unusual tick gap detected",
                )
                .with_tick(current.tick)
                .with_evidence(json!({
                    "tick_gap": tick_gap,
                    "current_tick": current.tick,
                })),
            );
        }

        for state in &current.players {
            let prev_state = previous
                .players
                .iter()
                .find(|p| p.player_id == state.player_id);
            let Some(prev_state) = prev_state else {
                continue;
            };
            if !state.is_alive || !prev_state.is_alive {
                continue;
            }

            let distance = state.position.distance_to(&prev_state.position);
            let max_possible = tick_gap as f64 * MAX_UNITS_PER_TICK;
            if distance > max_possible * TELEPORT_TOLERANCE {
                violations.push(
                    IntegrityViolation::new(
                        ViolationType::TeleportDetected,
                        ViolationSeverity::Critical,
                        0.95,
                        "Player position change exceeds possible movement speed",
                    )
                    .with_player(state.player_id)
                    .with_tick(current.tick)
                    .with_evidence(json!({
                        "distance": distance,
                        "max_possible": max_possible,
                        "from": prev_state.position,
                        "to": state.position,
                    })),
                );
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::data::{PlayerTickState, Vector3, ViewAngles};
    use uuid::Uuid;

    fn tick_with_player(tick: i64, player_id: Uuid, position: Vector3, alive: bool) -> TickData {
        TickData {
            tick,
            players: vec![PlayerTickState {
                player_id,
                position,
                view_angles: ViewAngles::default(),
                velocity: Vector3::default(),
                health: if alive { 100 } else { 0 },
                is_alive: alive,
            }],
            timestamp_ms: tick as f64 * 1000.0 / ASSUMED_TICK_RATE,
        }
    }

    fn aim_event(tick: i64, player_id: Uuid, pitch: f64, yaw: f64) -> GameEvent {
        let mut event = GameEvent::new(tick, "aim", player_id);
        event.view_angles = ViewAngles::new(pitch, yaw);
        event
    }

    #[test]
    fn tick_gap_over_five_is_flagged() {
        let ticks = vec![TickData::new(10), TickData::new(17)];
        let violations = analyze_tick_data(&ticks);

        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.violation_type, ViolationType::TickManipulation);
        assert_eq!(v.severity, ViolationSeverity::Medium);
        assert_eq!(v.confidence, 0.6);
        assert_eq!(v.evidence["tick_gap"], 7);
        assert_eq!(v.tick_number, Some(17));
    }

    #[test]
    fn tick_gap_of_five_is_clean() {
        let ticks = vec![TickData::new(10), TickData::new(15)];
        assert!(analyze_tick_data(&ticks).is_empty());
    }

    #[test]
    fn teleport_is_flagged() {
        let player = Uuid::new_v4();
        let ticks = vec![
            tick_with_player(10, player, Vector3::new(0.0, 0.0, 0.0), true),
            tick_with_player(11, player, Vector3::new(700.0, 0.0, 0.0), true),
        ];
        let violations = analyze_tick_data(&ticks);

        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.violation_type, ViolationType::TeleportDetected);
        assert_eq!(v.severity, ViolationSeverity::Critical);
        assert_eq!(v.confidence, 0.95);
        assert_eq!(v.player_id, Some(player));
        assert_eq!(v.evidence["distance"], 700.0);
        assert_eq!(v.evidence["max_possible"], 400.0);
    }

    #[test]
    fn max_speed_move_is_clean() {
        let player = Uuid::new_v4();
        let ticks = vec![
            tick_with_player(10, player, Vector3::new(0.0, 0.0, 0.0), true),
            tick_with_player(11, player, Vector3::new(400.0, 0.0, 0.0), true),
        ];
        assert!(analyze_tick_data(&ticks).is_empty());
    }

    #[test]
    fn dead_players_do_not_teleport() {
        // Respawns move players across the map legitimately.
        let player = Uuid::new_v4();
        let ticks = vec![
            tick_with_player(10, player, Vector3::new(0.0, 0.0, 0.0), false),
            tick_with_player(11, player, Vector3::new(5000.0, 0.0, 0.0), true),
        ];
        assert!(analyze_tick_data(&ticks).is_empty());
    }

    #[test]
    fn non_monotonic_ticks_are_flagged() {
        let player = Uuid::new_v4();
        let events = vec![aim_event(10, player, 0.0, 0.0), aim_event(9, player, 0.0, 0.1)];
        let violations = analyze_events(&events, &IntegrityThresholds::default());

        assert!(violations
            .iter()
            .any(|v| v.violation_type == ViolationType::TimestampAnomaly
                && v.severity == ViolationSeverity::High
                && v.confidence == 0.9));
    }

    #[test]
    fn spinbot_snap_is_flagged() {
        let player = Uuid::new_v4();
        // 200° combined delta over 1 tick = 25_600°/s at 128 tick.
        let events = vec![
            aim_event(10, player, 0.0, 0.0),
            aim_event(11, player, 50.0, 150.0),
        ];
        let violations = analyze_events(&events, &IntegrityThresholds::default());

        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.violation_type, ViolationType::SpinbotPattern);
        assert_eq!(v.severity, ViolationSeverity::Critical);
        assert_eq!(v.confidence, 0.85);
        assert_eq!(v.evidence["angle_speed"], 25_600.0);
        assert_eq!(v.evidence["tick_diff"], 1);
    }

    #[test]
    fn slow_aim_is_clean() {
        let player = Uuid::new_v4();
        let events = vec![
            aim_event(10, player, 0.0, 0.0),
            aim_event(11, player, 1.0, 2.0),
        ];
        assert!(analyze_events(&events, &IntegrityThresholds::default()).is_empty());
    }

    #[test]
    fn snap_between_different_players_is_ignored() {
        let events = vec![
            aim_event(10, Uuid::new_v4(), 0.0, 0.0),
            aim_event(11, Uuid::new_v4(), 50.0, 150.0),
        ];
        assert!(analyze_events(&events, &IntegrityThresholds::default()).is_empty());
    }
}
