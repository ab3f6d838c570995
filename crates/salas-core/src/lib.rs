//! Reservation admission and lifecycle engine for salas
//!
//! This crate is the decision-making part of salas, containing:
//! - Fair-use quota accounting over open rooms (same-day hours, weekly active count)
//! - The sanction check
//! - Admission control (catalog -> exclusivity -> capacity -> sanctions -> quotas -> uniqueness)
//! - Reservation state machine (Active -> Cancelled / NoShow / Completed) with
//!   automatic sanction issuance after a no-show
//!
//! Every engine call runs inside one store transaction; a failed call leaves
//! no partial state behind.

mod admission;
mod engine;
mod error;
mod lifecycle;
mod quota;
mod sanction;

#[cfg(test)]
mod testing;

pub use admission::*;
pub use engine::*;
pub use error::*;
pub use lifecycle::*;
pub use quota::*;
pub use sanction::*;
