//! Domain entities for the replay pipeline.

use crate::models::{ResourceOwner, ResourceType};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Event type emitted by parsers for ticks that carry no match-relevant
/// payload. Generic events are persisted in the flat event log but are not
/// appended to the match timeline.
pub const GENERIC_EVENT: &str = "generic";

/// Status lifecycle of an uploaded replay file.
///
/// Transitions are strictly forward; terminal states never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplayFileStatus {
    Pending,
    Processing,
    Failed,
    Completed,
}

impl ReplayFileStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplayFileStatus::Failed | ReplayFileStatus::Completed)
    }

    /// Allowed forward transitions. Everything else is a bug in the caller.
    pub fn can_transition_to(&self, next: ReplayFileStatus) -> bool {
        matches!(
            (self, next),
            (ReplayFileStatus::Pending, ReplayFileStatus::Processing)
                | (ReplayFileStatus::Processing, ReplayFileStatus::Completed)
                | (ReplayFileStatus::Processing, ReplayFileStatus::Failed)
        )
    }
}

/// Header fields extracted from the demo file, when the parser provides them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayHeader {
    pub map_name: String,
    pub game_version: String,
    pub tick_rate: f64,
    pub duration_seconds: f64,
}

/// Metadata record for an uploaded replay file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFile {
    pub id: Uuid,
    pub resource_owner: ResourceOwner,
    pub game_id: String,
    pub network_id: String,
    pub size: u64,
    pub internal_uri: String,
    pub status: ReplayFileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<ReplayHeader>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReplayFile {
    /// Move the file to `next`, enforcing the forward-only state machine.
    pub fn transition_to(&mut self, next: ReplayFileStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            bail!(
                "invalid replay file status transition {:?} -> {:?} for {}",
                self.status,
                next,
                self.id
            );
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a processing failure. Implies the Processing → Failed transition.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<()> {
        self.transition_to(ReplayFileStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }
}

/// One parsed game event.
///
/// Immutable once created: the pipeline only reads events after the parser
/// has emitted them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: Uuid,
    pub match_id: Uuid,
    /// Simulation step this event occurred at.
    pub tick: i64,
    /// Elapsed in-game time in milliseconds.
    pub game_time_ms: f64,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Typed payload as emitted by the parser.
    pub payload: serde_json::Value,
    /// Entities extracted from the surrounding ticks, bucketed by resource
    /// type. Merged across all events into the pipeline's aggregate map.
    #[serde(default)]
    pub entities: HashMap<ResourceType, Vec<serde_json::Value>>,
    /// Derived stats attached by the parser.
    #[serde(default)]
    pub stats: HashMap<String, serde_json::Value>,
}

impl GameEvent {
    pub fn new(match_id: Uuid, tick: i64, event_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            tick,
            game_time_ms: 0.0,
            event_type: event_type.into(),
            payload: serde_json::Value::Null,
            entities: HashMap::new(),
            stats: HashMap::new(),
        }
    }

    pub fn is_generic(&self) -> bool {
        self.event_type == GENERIC_EVENT
    }
}

/// Player identity extracted from a replay. Target of the PlayerMetadata
/// fan-out bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMetadata {
    pub id: Uuid,
    pub network_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clan_name: Option<String>,
    pub resource_owner: ResourceOwner,
}

/// Aggregate produced by processing one replay file: the ordered-by-tick
/// match timeline plus ownership context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub replay_file_id: Uuid,
    pub game_id: String,
    pub resource_owner: ResourceOwner,
    pub events: Vec<GameEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn new(replay_file: &ReplayFile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            replay_file_id: replay_file.id,
            game_id: replay_file.game_id.clone(),
            resource_owner: replay_file.resource_owner,
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
