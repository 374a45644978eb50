use good_lp::solvers::{ResolutionError, SolutionStatus};
use good_lp::{IntoAffineExpression, ProblemVariables, Solution, SolverModel, default_solver};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::config::{MAX_TIMEOUT_SECS, SolveConfig};
use crate::constraints;
use crate::data::{Assignment, Schedule, Timetable};
use crate::error::{ConfigError, ProjectionError, SolveFailure};
use crate::objectives::{self, ObjectiveKind};
use crate::observe::{Event, Observer};
use crate::projection;
use crate::validation;
use crate::variables::VariableSpace;

/// Fixed so that identical models reach identical objective values.
const RANDOM_SEED: i32 = 1234;

/// Values at or above this are read as 1.
const ASSIGNED_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Satisfies every hard constraint; the time limit stopped the search
    /// before optimality was proven.
    Feasible,
}

/// A successful solve attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Solved {
    pub status: SolveStatus,
    /// `sum(weight * component)`.
    pub objective: f64,
    /// Unweighted value of each built objective component.
    pub components: BTreeMap<ObjectiveKind, f64>,
    /// Every variable at 1, sorted by slot.
    pub assignments: Vec<Assignment>,
    pub elapsed: Duration,
}

impl Solved {
    pub fn component(&self, kind: ObjectiveKind) -> Option<f64> {
        self.components.get(&kind).copied()
    }
}

/// Wall-clock point after which a solve attempt must give up.
///
/// The deadline is enforced by handing the remaining time to HiGHS as its
/// `time_limit`; HiGHS cannot be interrupted from outside once it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    /// Budgets past what `Instant` can represent are cut to
    /// [`MAX_TIMEOUT_SECS`].
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        let cap = Duration::from_secs(MAX_TIMEOUT_SECS);
        Self(
            now.checked_add(budget)
                .unwrap_or_else(|| now.checked_add(cap).unwrap_or(now)),
        )
    }

    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// Builds a fresh model from `timetable` and solves it within `config`'s timeout.
pub fn solve(
    timetable: &Timetable,
    config: &SolveConfig,
    observer: &dyn Observer,
) -> Result<Solved, SolveFailure> {
    solve_until(timetable, config, Deadline::after(config.timeout()), observer)
}

/// solves the timetable with the HiGHS ILP solver, giving up at `deadline`.
pub fn solve_until(
    timetable: &Timetable,
    config: &SolveConfig,
    deadline: Deadline,
    observer: &dyn Observer,
) -> Result<Solved, SolveFailure> {
    let start_time = Instant::now();
    let result = build_and_solve(timetable, config, deadline, observer, start_time);
    let elapsed = start_time.elapsed();
    match &result {
        Ok(solved) => observer.record(Event::Solved {
            status: solved.status,
            objective: solved.objective,
            elapsed,
        }),
        Err(failure) => observer.record(Event::SolveFailed {
            failure: failure.clone(),
            elapsed,
        }),
    }
    result
}

fn build_and_solve(
    timetable: &Timetable,
    config: &SolveConfig,
    deadline: Deadline,
    observer: &dyn Observer,
    start_time: Instant,
) -> Result<Solved, SolveFailure> {
    // model setup
    let mut problem = ProblemVariables::new();
    let space = VariableSpace::build(&mut problem, timetable, observer);
    let objective = objectives::compose(&mut problem, &space, &config.weights, observer);
    let constraint_set = constraints::apply_all(&space, &config.extensions, observer);

    let costs = objective.costs();
    let total = objective.total();

    let time_limit = deadline.remaining();
    if time_limit.is_zero() {
        return Err(SolveFailure::Timeout);
    }

    let mut model = problem
        .minimise(total)
        .using(default_solver)
        .set_option("threads", 1) // single thread for reproducibility
        .set_option("random_seed", RANDOM_SEED)
        .set_option("time_limit", time_limit.as_secs_f64())
        .set_option(
            "log_to_console",
            if config.solver_log { "true" } else { "false" },
        );
    for c in constraint_set
        .into_constraints()
        .chain(objective.into_links())
    {
        model.add_constraint(c);
    }

    // solve
    observer.record(Event::SolveStarted { time_limit });
    let solution = model.solve().map_err(classify)?;

    let status = match solution.status() {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        _ => SolveStatus::Feasible,
    };
    let assignments = extract_assignments(&space, &solution);

    if let Err(violations) =
        validation::verify_assignments(timetable, &assignments, &config.extensions)
    {
        return Err(match status {
            // the time limit hit before any incumbent was found
            SolveStatus::Feasible => SolveFailure::Timeout,
            SolveStatus::Optimal => SolveFailure::Error(format!(
                "solver returned an assignment that breaks {} hard constraint(s), first: {}",
                violations.len(),
                violations[0]
            )),
        });
    }

    let mut components = BTreeMap::new();
    let mut objective_value = 0.0;
    for (kind, weight, cost) in costs {
        let value = cost.eval_with(&solution);
        objective_value += weight * value;
        components.insert(kind, value);
    }

    Ok(Solved {
        status,
        objective: objective_value,
        components,
        assignments,
        elapsed: start_time.elapsed(),
    })
}

fn extract_assignments(space: &VariableSpace, solution: &impl Solution) -> Vec<Assignment> {
    let mut assignments: Vec<Assignment> = space
        .iter()
        .filter(|(_, var)| solution.value(*var) >= ASSIGNED_THRESHOLD)
        .map(|(index, _)| {
            let key = space.key_of(index);
            Assignment {
                slot: key.slot,
                teacher_id: key.teacher_id,
                class_id: key.class_id,
                room_id: key.room_id,
            }
        })
        .collect();
    assignments.sort();
    assignments
}

/// HiGHS reports a time limit reached without any primal solution this way.
const NO_SOLUTION_FOUND: &str = "NoSolutionFound";

/// Maps a solver error onto the failure reported to the caller.
///
/// Every model runs under a `time_limit`, so a search that ended without
/// an incumbent is a timeout.
pub fn classify(error: ResolutionError) -> SolveFailure {
    match error {
        ResolutionError::Infeasible => SolveFailure::Infeasible,
        ResolutionError::Unbounded => SolveFailure::Unbounded,
        ResolutionError::Other(NO_SOLUTION_FOUND) => SolveFailure::Timeout,
        other => SolveFailure::Error(other.to_string()),
    }
}

/// Where a session stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveState {
    Built,
    Solved(Solved),
    Failed(SolveFailure),
}

/// One timetable and configuration, solved on demand.
///
/// Every [`run`](Self::run) rebuilds the whole model; nothing carries over
/// between attempts.
pub struct SolveSession<'a> {
    timetable: &'a Timetable,
    config: SolveConfig,
    state: SolveState,
}

impl<'a> SolveSession<'a> {
    pub fn new(timetable: &'a Timetable, config: SolveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            timetable,
            config,
            state: SolveState::Built,
        })
    }

    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    pub fn state(&self) -> &SolveState {
        &self.state
    }

    pub fn run(&mut self, observer: &dyn Observer) -> Result<&Solved, SolveFailure> {
        let deadline = Deadline::after(self.config.timeout());
        self.run_until(deadline, observer)
    }

    pub fn run_until(
        &mut self,
        deadline: Deadline,
        observer: &dyn Observer,
    ) -> Result<&Solved, SolveFailure> {
        self.state = match solve_until(self.timetable, &self.config, deadline, observer) {
            Ok(solved) => SolveState::Solved(solved),
            Err(failure) => SolveState::Failed(failure),
        };
        match &self.state {
            SolveState::Solved(solved) => Ok(solved),
            SolveState::Failed(failure) => Err(failure.clone()),
            SolveState::Built => Err(SolveFailure::Error("session did not run".into())),
        }
    }

    pub fn solution(&self) -> Option<&Solved> {
        match &self.state {
            SolveState::Solved(solved) => Some(solved),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&SolveFailure> {
        match &self.state {
            SolveState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Projects the solved assignment; fails unless the last run succeeded.
    pub fn schedule(&self) -> Result<Schedule, ProjectionError> {
        let solved = self.solution().ok_or(ProjectionError::NotSolved)?;
        projection::project(self.timetable, &solved.assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Weights;
    use crate::data::Availability;
    use crate::generator::{Generator, GeneratorConfig};
    use crate::observe::RecordingObserver;
    use crate::test_support::{class, room, teacher, TimetableBuilder};

    fn single_teacher(periods_per_week: u32) -> Timetable {
        TimetableBuilder::new(5, 8)
            .teacher(teacher("T1", 5, 8))
            .class(class("C1", 25, periods_per_week))
            .room(room("R1", 30))
            .build()
    }

    #[test]
    fn test_classify_solver_errors() {
        assert_eq!(classify(ResolutionError::Infeasible), SolveFailure::Infeasible);
        assert_eq!(classify(ResolutionError::Unbounded), SolveFailure::Unbounded);
        match classify(ResolutionError::Str("license expired".into())) {
            SolveFailure::Error(message) => assert!(message.contains("license expired")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_time_limit_without_incumbent_is_a_timeout() {
        assert_eq!(
            classify(ResolutionError::Other("NoSolutionFound")),
            SolveFailure::Timeout
        );
        assert!(matches!(
            classify(ResolutionError::Other("ReachedIterationLimit")),
            SolveFailure::Error(_)
        ));
    }

    #[test]
    fn test_one_second_budget_never_reports_a_solver_error() {
        let input = Generator::new(GeneratorConfig::small(), 11).generate();
        let tt = Timetable::try_from(input).unwrap();
        let config = SolveConfig {
            weights: Weights::all(1.0, 1.0, 1.0),
            timeout_secs: 1,
            ..SolveConfig::default()
        };
        match solve(&tt, &config, &RecordingObserver::new()) {
            Ok(solved) => assert!(
                validation::verify_assignments(&tt, &solved.assignments, &config.extensions)
                    .is_ok()
            ),
            Err(SolveFailure::Timeout | SolveFailure::Infeasible) => {}
            Err(other) => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_deadline_remaining() {
        assert!(Deadline::at(Instant::now()).is_expired());
        let d = Deadline::after(Duration::from_secs(60));
        assert!(!d.is_expired());
        assert!(d.remaining() <= Duration::from_secs(60));
    }

    #[test]
    fn test_deadline_saturates_huge_budgets() {
        let d = Deadline::after(Duration::MAX);
        assert!(!d.is_expired());
        assert!(d.remaining() <= Duration::from_secs(MAX_TIMEOUT_SECS));
    }

    #[test]
    fn test_expired_deadline_times_out_without_solving() {
        let tt = single_teacher(3);
        let obs = RecordingObserver::new();
        let result = solve_until(&tt, &SolveConfig::default(), Deadline::at(Instant::now()), &obs);

        assert_eq!(result, Err(SolveFailure::Timeout));
        assert_eq!(obs.count(|e| matches!(e, Event::SolveStarted { .. })), 0);
        assert_eq!(
            obs.count(|e| matches!(
                e,
                Event::SolveFailed {
                    failure: SolveFailure::Timeout,
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn test_single_class_is_placed() {
        let tt = single_teacher(3);
        let obs = RecordingObserver::new();
        let solved = solve(&tt, &SolveConfig::default(), &obs).unwrap();

        assert_eq!(solved.status, SolveStatus::Optimal);
        assert_eq!(solved.assignments.len(), 3);
        assert_eq!(solved.component(ObjectiveKind::Gaps), Some(0.0));
        assert!(solved.objective.abs() < 1e-3);
        assert_eq!(obs.count(|e| matches!(e, Event::Solved { .. })), 1);
    }

    #[test]
    fn test_unavailable_teacher_is_infeasible() {
        let mut t1 = teacher("T1", 5, 8);
        t1.availability = Availability::never(5, 8);
        let tt = TimetableBuilder::new(5, 8)
            .teacher(t1)
            .class(class("C1", 25, 3))
            .room(room("R1", 30))
            .build();
        let result = solve(&tt, &SolveConfig::default(), &RecordingObserver::new());
        assert_eq!(result, Err(SolveFailure::Infeasible));
    }

    #[test]
    fn test_session_state_machine() {
        let tt = single_teacher(2);
        let mut session =
            SolveSession::new(&tt, SolveConfig::with_weights(Weights::none())).unwrap();
        assert_eq!(session.state(), &SolveState::Built);
        assert_eq!(session.schedule(), Err(ProjectionError::NotSolved));

        let obs = RecordingObserver::new();
        assert!(session.run(&obs).is_ok());
        assert!(session.solution().is_some());
        assert!(session.failure().is_none());
        assert_eq!(session.schedule().unwrap().len(), 2);
    }

    #[test]
    fn test_session_failed_state_has_no_schedule() {
        let tt = TimetableBuilder::new(1, 2)
            .teacher(teacher("T1", 1, 2))
            .class(class("C1", 25, 3))
            .room(room("R1", 30))
            .build();
        let mut session = SolveSession::new(&tt, SolveConfig::default()).unwrap();
        assert_eq!(session.run(&RecordingObserver::new()), Err(SolveFailure::Infeasible));
        assert_eq!(session.state(), &SolveState::Failed(SolveFailure::Infeasible));
        assert_eq!(session.schedule(), Err(ProjectionError::NotSolved));
    }

    #[test]
    fn test_session_rejects_bad_config() {
        let tt = single_teacher(1);
        let config = SolveConfig {
            timeout_secs: 0,
            ..SolveConfig::default()
        };
        assert_eq!(
            SolveSession::new(&tt, config).err(),
            Some(ConfigError::ZeroTimeout)
        );
    }
}
