//! School timetabling as a mixed-integer linear program.
//!
//! Teachers, classes, rooms and weekly time slots are turned into one binary
//! variable per (teacher, class, room, slot). Hard constraints keep rooms
//! within capacity, teachers available and single-booked, and every class at
//! its weekly period count. Weighted soft objectives penalise teacher gaps,
//! workload imbalance and uneven class distribution. HiGHS solves the model
//! and the result is projected into a per-day schedule.

pub mod config;
pub mod constraints;
pub mod data;
pub mod error;
pub mod generator;
pub mod loader;
pub mod objectives;
pub mod observe;
pub mod projection;
pub mod report;
pub mod server;
pub mod solver;
pub mod validation;
pub mod variables;

#[cfg(test)]
mod test_support;

pub use data::{Schedule, Timetable, TimetableInput};
pub use error::{DataError, SolveFailure};
pub use solver::{SolveSession, Solved};
