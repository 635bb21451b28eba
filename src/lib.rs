//! Replay Backend Library
//!
//! Core of the replay service: the processing pipeline that turns an
//! uploaded demo file into persisted match data, and the integrity engine
//! that scores the parsed timeline for cheating and tampering indicators.
//!
//! Storage, parsing of the binary demo format, and the HTTP surface live
//! behind the port traits in `replay::ports` and `integrity::engine`.

pub mod integrity;
pub mod models;
pub mod replay;
