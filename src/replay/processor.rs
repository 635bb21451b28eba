//! Replay Processing Pipeline
//!
//! Orchestrates one replay file from "uploaded" to "searchable match data":
//! status state machine, parser fan-in over a bounded channel, entity
//! fan-out by resource type, and bulk persistence.
//!
//! Concurrency shape: one producer (the external parser) pushes events into
//! a bounded mpsc channel; one consumer task drains it into three
//! accumulators. The pipeline awaits the consumer's join handle after the
//! parser returns, so every emitted event is drained before anything is
//! persisted.

use crate::models::{CancelFlag, ResourceType};
use crate::replay::entities::{GameEvent, Match, PlayerMetadata, ReplayFile, ReplayFileStatus};
use crate::replay::ports::{
    GameEventWriter, MatchMetadataWriter, PlayerMetadataWriter, ReplayFileContentReader,
    ReplayFileMetadataReader, ReplayFileMetadataWriter, ReplayParser,
};
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Capacity of the parser → consumer event channel.
    pub channel_capacity: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

impl ProcessorConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let channel_capacity = std::env::var("REPLAY_EVENT_BUFFER")
            .unwrap_or_else(|_| "1024".to_string())
            .parse()
            .unwrap_or(1024);

        Self { channel_capacity }
    }
}

/// Accumulators owned by the consumer task while the channel drains.
#[derive(Default)]
struct DrainedEvents {
    /// Events that belong on the match timeline (generic ticks filtered out).
    match_events: Vec<GameEvent>,
    /// Every event, in emission order, for the bulk write.
    all_events: Vec<GameEvent>,
    /// Per-resource-type entity contributions merged across all events.
    entities: HashMap<ResourceType, Vec<serde_json::Value>>,
}

/// Use case: process one uploaded replay file end to end.
pub struct ProcessReplayFileUseCase {
    metadata_reader: Arc<dyn ReplayFileMetadataReader>,
    metadata_writer: Arc<dyn ReplayFileMetadataWriter>,
    content_reader: Arc<dyn ReplayFileContentReader>,
    player_writer: Arc<dyn PlayerMetadataWriter>,
    match_writer: Arc<dyn MatchMetadataWriter>,
    event_writer: Arc<dyn GameEventWriter>,
    parser: Arc<dyn ReplayParser>,
    config: ProcessorConfig,
}

impl ProcessReplayFileUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        metadata_reader: Arc<dyn ReplayFileMetadataReader>,
        metadata_writer: Arc<dyn ReplayFileMetadataWriter>,
        content_reader: Arc<dyn ReplayFileContentReader>,
        player_writer: Arc<dyn PlayerMetadataWriter>,
        match_writer: Arc<dyn MatchMetadataWriter>,
        event_writer: Arc<dyn GameEventWriter>,
        parser: Arc<dyn ReplayParser>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            metadata_reader,
            metadata_writer,
            content_reader,
            player_writer,
            match_writer,
            event_writer,
            parser,
            config,
        }
    }

    /// Process a previously uploaded, Pending replay file.
    ///
    /// On return the file is in exactly one of {Completed, Failed}; it is
    /// never left in Processing. A failure to persist either terminal status
    /// is itself returned as a hard error.
    pub async fn process(&self, replay_file_id: Uuid) -> Result<Match> {
        self.process_with_cancel(replay_file_id, &CancelFlag::new())
            .await
    }

    pub async fn process_with_cancel(
        &self,
        replay_file_id: Uuid,
        cancel: &CancelFlag,
    ) -> Result<Match> {
        let mut replay_file = self
            .metadata_reader
            .get_by_id(replay_file_id)
            .await
            .with_context(|| format!("failed to load replay metadata {replay_file_id}"))?;

        replay_file.transition_to(ReplayFileStatus::Processing)?;
        let mut replay_file = self
            .metadata_writer
            .update(replay_file)
            .await
            .context("failed to persist Processing status")?;

        info!(
            replay_file_id = %replay_file_id,
            size = replay_file.size,
            game_id = %replay_file.game_id,
            "processing replay file"
        );

        let mut game_match = Match::new(&replay_file);

        match self.run_pipeline(&mut game_match, &replay_file, cancel).await {
            Ok(()) => {
                replay_file.transition_to(ReplayFileStatus::Completed)?;
                self.metadata_writer
                    .update(replay_file)
                    .await
                    .context("failed to persist Completed status")?;

                info!(
                    replay_file_id = %replay_file_id,
                    match_id = %game_match.id,
                    events = game_match.events.len(),
                    "replay file processed"
                );
                Ok(game_match)
            }
            Err(err) => {
                error!(
                    replay_file_id = %replay_file_id,
                    error = %format!("{err:#}"),
                    "replay processing failed"
                );
                replay_file.mark_failed(format!("{err:#}"))?;
                self.metadata_writer
                    .update(replay_file)
                    .await
                    .context("failed to persist Failed status")?;
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        game_match: &mut Match,
        replay_file: &ReplayFile,
        cancel: &CancelFlag,
    ) -> Result<()> {
        let content = self
            .content_reader
            .get_by_id(replay_file.id)
            .await
            .context("failed to open replay content")?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let consumer = tokio::spawn(drain_events(rx, cancel.clone()));

        let parse_result = self.parser.parse(game_match.id, content, tx).await;

        // Join the consumer before acting on the parse result so no event
        // emitted before the parser returned is lost.
        let drained = consumer.await.context("event consumer task failed")??;
        parse_result.context("error parsing replay events")?;
        if cancel.is_cancelled() {
            bail!("replay processing cancelled");
        }

        game_match.events = drained.match_events;

        for (resource_type, entities) in drained.entities {
            self.persist_entities(resource_type, entities).await?;
        }

        debug!(events = drained.all_events.len(), "writing game events");
        self.event_writer
            .create_many(drained.all_events)
            .await
            .context("failed to write game events")?;

        Ok(())
    }

    /// One distinct bulk write per resource type.
    async fn persist_entities(
        &self,
        resource_type: ResourceType,
        entities: Vec<serde_json::Value>,
    ) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }

        match resource_type {
            ResourceType::PlayerMetadata => {
                let players: Vec<PlayerMetadata> = entities
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<_, _>>()
                    .context("malformed PlayerMetadata entity from parser")?;
                info!(count = players.len(), "writing player metadata");
                self.player_writer
                    .create_many(players)
                    .await
                    .context("failed to write PlayerMetadata entities")
            }
            ResourceType::Match => {
                let matches: Vec<Match> = entities
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<_, _>>()
                    .context("malformed Match entity from parser")?;
                info!(count = matches.len(), "writing match metadata");
                self.match_writer
                    .create_many(matches)
                    .await
                    .context("failed to write Match entities")
            }
            other => {
                debug!(
                    resource_type = other.as_str(),
                    count = entities.len(),
                    "no writer registered for resource type, skipping"
                );
                Ok(())
            }
        }
    }
}

/// Consumer task: drains the event channel until the producer drops the
/// sender, merging entity contributions as it goes.
async fn drain_events(
    mut rx: mpsc::Receiver<GameEvent>,
    cancel: CancelFlag,
) -> Result<DrainedEvents> {
    let mut drained = DrainedEvents::default();

    while let Some(event) = rx.recv().await {
        if cancel.is_cancelled() {
            bail!("event drain cancelled");
        }

        debug!(event_type = %event.event_type, tick = event.tick, "event received");

        for (resource_type, contributed) in &event.entities {
            drained
                .entities
                .entry(*resource_type)
                .or_default()
                .extend(contributed.iter().cloned());
        }

        if !event.is_generic() {
            drained.match_events.push(event.clone());
        }
        drained.all_events.push(event);
    }

    Ok(drained)
}
