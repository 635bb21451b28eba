//! Input data for one analysis run: parsed events, per-tick snapshots and
//! the raw byte stream, as handed over by the pipeline or a re-analysis job.

use crate::replay::ports::ReplayContent;
use std::collections::HashMap;
use uuid::Uuid;

/// 3D world coordinates (game units).
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Vector3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Pitch/yaw view direction in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewAngles {
    pub pitch: f64,
    pub yaw: f64,
}

impl ViewAngles {
    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }

    /// Combined pitch + yaw delta in degrees, with yaw wrapped into
    /// [-180, 180] so crossing the 180° boundary is not a full spin.
    pub fn diff_degrees(&self, other: &ViewAngles) -> f64 {
        let pitch_diff = self.pitch - other.pitch;
        let mut yaw_diff = self.yaw - other.yaw;

        if yaw_diff > 180.0 {
            yaw_diff -= 360.0;
        } else if yaw_diff < -180.0 {
            yaw_diff += 360.0;
        }

        pitch_diff.abs() + yaw_diff.abs()
    }
}

/// One game event as seen by the analyzers.
#[derive(Debug, Clone)]
pub struct GameEvent {
    pub tick: i64,
    pub event_type: String,
    pub player_id: Uuid,
    pub target_id: Option<Uuid>,
    pub position: Vector3,
    pub view_angles: ViewAngles,
    pub data: HashMap<String, serde_json::Value>,
    pub timestamp_ms: f64,
}

impl GameEvent {
    pub fn new(tick: i64, event_type: impl Into<String>, player_id: Uuid) -> Self {
        Self {
            tick,
            event_type: event_type.into(),
            player_id,
            target_id: None,
            position: Vector3::default(),
            view_angles: ViewAngles::default(),
            data: HashMap::new(),
            timestamp_ms: 0.0,
        }
    }

    pub fn data_bool(&self, key: &str) -> bool {
        self.data.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn data_f64(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(|v| v.as_f64())
    }
}

/// Player identity from the replay.
#[derive(Debug, Clone)]
pub struct PlayerData {
    pub player_id: Uuid,
    pub network_id: String,
    pub team: i32,
    pub name: String,
}

/// One player's state at a specific tick.
#[derive(Debug, Clone)]
pub struct PlayerTickState {
    pub player_id: Uuid,
    pub position: Vector3,
    pub view_angles: ViewAngles,
    pub velocity: Vector3,
    pub health: i32,
    pub is_alive: bool,
}

/// Full game state at one tick.
#[derive(Debug, Clone)]
pub struct TickData {
    pub tick: i64,
    pub players: Vec<PlayerTickState>,
    pub timestamp_ms: f64,
}

impl TickData {
    pub fn new(tick: i64) -> Self {
        Self {
            tick,
            players: Vec::new(),
            timestamp_ms: 0.0,
        }
    }
}

/// Everything the engine needs for one analysis run.
pub struct ReplayAnalysisData {
    pub replay_id: Uuid,
    pub game_id: String,
    /// Raw byte stream, consumed only when `file_hash` is absent.
    pub file_reader: Option<ReplayContent>,
    pub file_size: u64,
    pub file_hash: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,

    // Parsed data
    pub events: Vec<GameEvent>,
    pub players: Vec<PlayerData>,
    pub tick_data: Vec<TickData>,
}

impl ReplayAnalysisData {
    pub fn new(replay_id: Uuid, game_id: impl Into<String>) -> Self {
        Self {
            replay_id,
            game_id: game_id.into(),
            file_reader: None,
            file_size: 0,
            file_hash: None,
            metadata: HashMap::new(),
            events: Vec::new(),
            players: Vec::new(),
            tick_data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn yaw_wraps_across_180_boundary() {
        let a = ViewAngles::new(0.0, 179.0);
        let b = ViewAngles::new(0.0, -179.0);
        // Crossing the boundary is a 2° turn, not 358°.
        assert!((a.diff_degrees(&b) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn diff_combines_pitch_and_yaw() {
        let a = ViewAngles::new(10.0, 20.0);
        let b = ViewAngles::new(-10.0, -20.0);
        assert!((a.diff_degrees(&b) - 60.0).abs() < 1e-9);
    }
}
