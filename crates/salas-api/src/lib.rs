//! Value model shared by every salas crate
//!
//! This crate defines:
//! - Catalog records (rooms, time slots, participants and their program links)
//! - Reservations, rosters and sanctions
//! - Request types accepted by the engine
//! - The structured rejection vocabulary bindings use to explain a refusal

mod model;
mod reasons;
mod requests;

pub use model::*;
pub use reasons::*;
pub use requests::*;
