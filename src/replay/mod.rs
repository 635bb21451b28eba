//! Replay Processing
//!
//! Drives an uploaded replay file through its status lifecycle
//! (Pending → Processing → {Completed|Failed}), fans the parsed event
//! stream into per-resource-type entity buckets, and triggers bulk
//! persistence through the ports in [`ports`].

pub mod entities;
pub mod ports;
pub mod processor;


pub use entities::{GameEvent, Match, PlayerMetadata, ReplayFile, ReplayFileStatus};
pub use processor::{ProcessReplayFileUseCase, ProcessorConfig};
