//! Shared utilities for salas
//!
//! This crate provides:
//! - ID types (ParticipantId, ReservationId, RoomRef)
//! - Input normalization (participant IDs, dates, times)
//! - Calendar helpers (ISO weeks, month arithmetic)
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
