//! Error types for every stage of a scheduling session.
//!
//! Data and configuration problems stop a session before any model is built.
//! Solve failures are ordinary outcomes: the caller can adjust weights or data
//! and try again. Model and projection errors point at bugs in this crate.

use thiserror::Error;

use crate::validation::ValidationError;

/// Malformed or missing entity data, detected at load time.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid entity data: {}", join_issues(.0))]
    Invalid(Vec<ValidationError>),

    #[error("failed to read {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("{file} row {row}: {message}")]
    Field {
        file: String,
        row: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_issues(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rejected solve configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("weight '{key}' must be finite and non-negative, got {value}")]
    InvalidWeight { key: &'static str, value: f64 },

    #[error("timeout must be at least one second")]
    ZeroTimeout,

    #[error("timeout of {secs}s exceeds the {max}s limit")]
    TimeoutTooLong { secs: u64, max: u64 },

    #[error("daily period cap must be positive")]
    ZeroDailyCap,
}

/// A model builder referenced an entity outside the variable space.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown {kind} '{id}' in variable space")]
    UnknownEntity { kind: &'static str, id: String },
}

/// Why a solve attempt did not produce a schedule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SolveFailure {
    #[error("no assignment satisfies every hard constraint")]
    Infeasible,

    #[error("objective is unbounded; the model is missing a bound")]
    Unbounded,

    #[error("time budget exhausted before a feasible assignment was found")]
    Timeout,

    #[error("solver error: {0}")]
    Error(String),
}

impl SolveFailure {
    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            SolveFailure::Infeasible => "infeasible",
            SolveFailure::Unbounded => "unbounded",
            SolveFailure::Timeout => "timeout",
            SolveFailure::Error(_) => "error",
        }
    }
}

/// Schedule requested at the wrong time, or from an inconsistent solution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("no solution available; run the solver first")]
    NotSolved,

    #[error("solution references unknown teacher '{0}'")]
    UnknownTeacher(String),

    #[error("solution references unknown class '{0}'")]
    UnknownClass(String),

    #[error("solution references unknown room '{0}'")]
    UnknownRoom(String),

    #[error("solution references time slot ({day}, {period}) outside the week grid")]
    UnknownTimeSlot { day: u32, period: u32 },
}
