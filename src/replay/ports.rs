//! Ports consumed by the replay pipeline.
//!
//! Implemented by the storage and parser adapters; the pipeline only sees
//! these seams. All ports are object-safe so the use case can hold them as
//! `Arc<dyn ...>`.

use crate::replay::entities::{GameEvent, Match, PlayerMetadata, ReplayFile};
use anyhow::Result;
use std::io::Read;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Raw replay content as a forward-only byte stream.
pub type ReplayContent = Box<dyn Read + Send>;

/// External demo parser. Emits events onto the channel as it decodes;
/// returning drops the sender and lets the consumer drain to completion.
#[async_trait::async_trait]
pub trait ReplayParser: Send + Sync {
    async fn parse(
        &self,
        match_id: Uuid,
        content: ReplayContent,
        events: mpsc::Sender<GameEvent>,
    ) -> Result<()>;
}

#[async_trait::async_trait]
pub trait ReplayFileMetadataReader: Send + Sync {
    async fn get_by_id(&self, replay_file_id: Uuid) -> Result<ReplayFile>;
}

#[async_trait::async_trait]
pub trait ReplayFileMetadataWriter: Send + Sync {
    async fn update(&self, replay_file: ReplayFile) -> Result<ReplayFile>;
}

#[async_trait::async_trait]
pub trait ReplayFileContentReader: Send + Sync {
    async fn get_by_id(&self, replay_file_id: Uuid) -> Result<ReplayContent>;
}

#[async_trait::async_trait]
pub trait PlayerMetadataWriter: Send + Sync {
    async fn create_many(&self, players: Vec<PlayerMetadata>) -> Result<()>;
}

#[async_trait::async_trait]
pub trait MatchMetadataWriter: Send + Sync {
    async fn create_many(&self, matches: Vec<Match>) -> Result<()>;
}

#[async_trait::async_trait]
pub trait GameEventWriter: Send + Sync {
    async fn create_many(&self, events: Vec<GameEvent>) -> Result<()>;
}
