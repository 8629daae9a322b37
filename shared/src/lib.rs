//! Shared library for the TalkToDo Lambda functions.
//!
//! Schedules (todos and calendar events), transcript lines, and the
//! infrastructure around them: configuration, database, auth, object storage.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod mapping;
#[cfg(test)]
mod memory;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schedules;
pub mod secrets;
pub mod storage;
pub mod transcripts;

pub use auth::AuthContext;
pub use config::{Config, StorageConfig};
pub use error::{Error, Result};
pub use models::{
    DateRange, MeetingId, Schedule, ScheduleDto, ScheduleFields, ScheduleScope, TranscriptLine,
    TranscriptLineInput, UserId,
};
pub use repository::{PgScheduleRepository, PgTranscriptLineRepository};
pub use schedules::ScheduleService;
pub use storage::ObjectStorage;
pub use transcripts::TranscriptLineService;
