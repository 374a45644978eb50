//! Diagnostics emitted while building and solving a model.
//!
//! The solve controller and model builders take a `&dyn Observer` instead of
//! logging through the global logger, so callers decide where events go.
//! [`LogObserver`] forwards them to the `log` facade; [`RecordingObserver`]
//! keeps them in memory.

use log::Level;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use crate::data::TimeSlot;
use crate::error::SolveFailure;
use crate::solver::SolveStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Decision space created.
    VariablesBuilt { count: usize },
    /// One constraint family emitted.
    ConstraintsAdded { family: &'static str, count: usize },
    /// One objective component built.
    ObjectiveComponent {
        name: &'static str,
        weight: f64,
        aux_variables: usize,
    },
    /// Availability grid has no cell for this slot; treated as unavailable.
    MissingAvailability { teacher_id: String, slot: TimeSlot },
    SolveStarted { time_limit: Duration },
    Solved {
        status: SolveStatus,
        objective: f64,
        elapsed: Duration,
    },
    SolveFailed { failure: SolveFailure, elapsed: Duration },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Event::VariablesBuilt { .. }
            | Event::ConstraintsAdded { .. }
            | Event::ObjectiveComponent { .. } => Level::Debug,
            Event::MissingAvailability { .. } => Level::Warn,
            Event::SolveStarted { .. } | Event::Solved { .. } => Level::Info,
            Event::SolveFailed { failure, .. } => match failure {
                SolveFailure::Infeasible | SolveFailure::Timeout => Level::Info,
                SolveFailure::Unbounded | SolveFailure::Error(_) => Level::Error,
            },
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::VariablesBuilt { count } => {
                write!(f, "Generated {count} assignment variables")
            }
            Event::ConstraintsAdded { family, count } => {
                write!(f, "Added {count} '{family}' constraints")
            }
            Event::ObjectiveComponent {
                name,
                weight,
                aux_variables,
            } => write!(
                f,
                "Objective component '{name}' (weight {weight}) with {aux_variables} auxiliary variables"
            ),
            Event::MissingAvailability { teacher_id, slot } => write!(
                f,
                "Availability data missing for teacher {teacher_id} at time slot {slot}; treating as unavailable"
            ),
            Event::SolveStarted { time_limit } => {
                write!(f, "Starting ILP solver (time limit {:.1}s)", time_limit.as_secs_f64())
            }
            Event::Solved {
                status,
                objective,
                elapsed,
            } => write!(f, "Solution {status:?} with objective {objective} in {elapsed:.2?}"),
            Event::SolveFailed { failure, elapsed } => {
                write!(f, "No schedule after {elapsed:.2?}: {failure}")
            }
        }
    }
}

pub trait Observer: Send + Sync {
    fn record(&self, event: Event);
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn record(&self, event: Event) {
        log::log!(target: "timetable_solver", event.level(), "{event}");
    }
}

/// Stores events for later inspection.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }
}

impl Observer for RecordingObserver {
    fn record(&self, event: Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let obs = RecordingObserver::new();
        obs.record(Event::VariablesBuilt { count: 4 });
        obs.record(Event::MissingAvailability {
            teacher_id: "T1".into(),
            slot: TimeSlot::new(0, 3),
        });
        let events = obs.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::VariablesBuilt { count: 4 });
        assert_eq!(obs.count(|e| matches!(e, Event::MissingAvailability { .. })), 1);
    }

    #[test]
    fn test_event_levels() {
        let missing = Event::MissingAvailability {
            teacher_id: "T1".into(),
            slot: TimeSlot::new(0, 0),
        };
        assert_eq!(missing.level(), Level::Warn);
        let failed = Event::SolveFailed {
            failure: SolveFailure::Error("boom".into()),
            elapsed: Duration::ZERO,
        };
        assert_eq!(failed.level(), Level::Error);
        assert_eq!(
            missing.to_string(),
            "Availability data missing for teacher T1 at time slot (0, 0); treating as unavailable"
        );
    }
}
