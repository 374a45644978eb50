mod common;

use std::collections::BTreeSet;

use timetable_solver::config::{ConstraintExtensions, SolveConfig, Weights};
use timetable_solver::data::{Availability, TimeSlot};
use timetable_solver::error::SolveFailure;
use timetable_solver::objectives::ObjectiveKind;
use timetable_solver::observe::{Event, RecordingObserver};
use timetable_solver::solver::{SolveSession, SolveStatus, solve};
use timetable_solver::{loader, projection, report, validation};

use common::{class, room, teacher, timetable};

#[test]
fn test_single_teacher_three_periods() {
    let tt = timetable(
        vec![teacher("T1", Availability::always(5, 8))],
        vec![class("C1", 25, 3)],
        vec![room("R1", 30)],
        5,
        8,
    );
    let solved = solve(&tt, &SolveConfig::default(), &RecordingObserver::new()).unwrap();

    assert_eq!(solved.assignments.len(), 3);
    let slots: BTreeSet<TimeSlot> = solved.assignments.iter().map(|a| a.slot).collect();
    assert_eq!(slots.len(), 3);
    assert!(solved.assignments.iter().all(|a| a.class_id == "C1"));
}

#[test]
fn test_unavailable_teacher_is_infeasible() {
    let tt = timetable(
        vec![teacher("T1", Availability::never(5, 8))],
        vec![class("C1", 25, 3)],
        vec![room("R1", 30)],
        5,
        8,
    );
    let obs = RecordingObserver::new();
    assert_eq!(
        solve(&tt, &SolveConfig::default(), &obs),
        Err(SolveFailure::Infeasible)
    );
    assert_eq!(obs.count(|e| matches!(e, Event::SolveFailed { .. })), 1);
}

#[test]
fn test_combined_demand_against_availability() {
    // one day of four periods for the only teacher
    let fits = timetable(
        vec![teacher("T1", Availability::always(1, 4))],
        vec![class("C1", 20, 2), class("C2", 20, 2)],
        vec![room("R1", 30)],
        1,
        4,
    );
    let solved = solve(&fits, &SolveConfig::default(), &RecordingObserver::new()).unwrap();
    assert_eq!(solved.assignments.len(), 4);

    let too_much = timetable(
        vec![teacher("T1", Availability::always(1, 4))],
        vec![class("C1", 20, 3), class("C2", 20, 2)],
        vec![room("R1", 30)],
        1,
        4,
    );
    assert_eq!(
        solve(&too_much, &SolveConfig::default(), &RecordingObserver::new()),
        Err(SolveFailure::Infeasible)
    );
}

#[test]
fn test_class_larger_than_every_room_is_infeasible() {
    let tt = timetable(
        vec![teacher("T1", Availability::always(2, 4))],
        vec![class("C1", 40, 1)],
        vec![room("R1", 30), room("R2", 35)],
        2,
        4,
    );
    assert_eq!(
        solve(&tt, &SolveConfig::default(), &RecordingObserver::new()),
        Err(SolveFailure::Infeasible)
    );
}

#[test]
fn test_forced_gap_is_reported_and_counted() {
    let mut availability = Availability::never(1, 3);
    availability.set(TimeSlot::new(0, 0), true);
    availability.set(TimeSlot::new(0, 2), true);
    let tt = timetable(
        vec![teacher("T1", availability)],
        vec![class("C1", 20, 2)],
        vec![room("R1", 30)],
        1,
        3,
    );
    let solved = solve(&tt, &SolveConfig::default(), &RecordingObserver::new()).unwrap();
    assert_eq!(solved.status, SolveStatus::Optimal);
    assert!((solved.component(ObjectiveKind::Gaps).unwrap() - 1.0).abs() < 1e-3);

    let schedule = projection::project(&tt, &solved.assignments).unwrap();
    assert_eq!(report::count_gaps(&schedule), 1);
}

#[test]
fn test_back_to_back_periods_have_no_gap() {
    let tt = timetable(
        vec![teacher("T1", Availability::always(1, 3))],
        vec![class("C1", 20, 3)],
        vec![room("R1", 30)],
        1,
        3,
    );
    let solved = solve(&tt, &SolveConfig::default(), &RecordingObserver::new()).unwrap();
    assert_eq!(solved.status, SolveStatus::Optimal);
    assert_eq!(solved.assignments.len(), 3);
    assert!(solved.component(ObjectiveKind::Gaps).unwrap().abs() < 1e-3);

    let schedule = projection::project(&tt, &solved.assignments).unwrap();
    assert_eq!(report::count_gaps(&schedule), 0);
}

#[test]
fn test_sample_data_satisfies_every_invariant() {
    let tt = loader::load_dir(common::sample_dir()).unwrap();
    let config = SolveConfig {
        weights: Weights::all(1.0, 0.5, 0.5),
        extensions: ConstraintExtensions {
            subject_qualification: true,
            max_periods_per_day: Some(6),
        },
        ..SolveConfig::default()
    };
    let solved = solve(&tt, &config, &RecordingObserver::new()).unwrap();

    assert!(validation::verify_assignments(&tt, &solved.assignments, &config.extensions).is_ok());
    let total: u32 = tt.classes().iter().map(|c| c.periods_per_week).sum();
    assert_eq!(solved.assignments.len(), total as usize);

    let schedule = projection::project(&tt, &solved.assignments).unwrap();
    let reported_gaps = solved.component(ObjectiveKind::Gaps).unwrap();
    assert!((reported_gaps - report::count_gaps(&schedule) as f64).abs() < 1e-3);
    assert_eq!(report::statistics(&schedule).total_classes, total as usize);
}

#[test]
fn test_objective_is_reproducible() {
    let tt = loader::load_dir(common::sample_dir()).unwrap();
    let config = SolveConfig::with_weights(Weights::all(1.0, 1.0, 1.0));

    let first = solve(&tt, &config, &RecordingObserver::new()).unwrap();
    let second = solve(&tt, &config, &RecordingObserver::new()).unwrap();
    assert!((first.objective - second.objective).abs() < 1e-3);
}

#[test]
fn test_workload_weight_balances_teachers() {
    let tt = timetable(
        vec![
            teacher("T1", Availability::always(5, 8)),
            teacher("T2", Availability::always(5, 8)),
        ],
        vec![class("C1", 20, 3), class("C2", 20, 3)],
        vec![room("R1", 30)],
        5,
        8,
    );
    let config = SolveConfig::with_weights(Weights {
        gaps: None,
        workload: Some(1.0),
        distribution: None,
    });
    let solved = solve(&tt, &config, &RecordingObserver::new()).unwrap();
    assert!(solved.component(ObjectiveKind::Workload).unwrap().abs() < 1e-3);

    let schedule = projection::project(&tt, &solved.assignments).unwrap();
    let stats = report::statistics(&schedule);
    assert_eq!(stats.max_teacher_workload, 3);
    assert_eq!(stats.min_teacher_workload, 3);
}

#[test]
fn test_distribution_weight_spreads_a_class_over_the_week() {
    let tt = timetable(
        vec![teacher("T1", Availability::always(5, 8))],
        vec![class("C1", 20, 5)],
        vec![room("R1", 30)],
        5,
        8,
    );
    let config = SolveConfig::with_weights(Weights {
        gaps: None,
        workload: None,
        distribution: Some(1.0),
    });
    let solved = solve(&tt, &config, &RecordingObserver::new()).unwrap();
    assert!(solved.component(ObjectiveKind::Distribution).unwrap().abs() < 1e-3);

    let days: BTreeSet<u32> = solved.assignments.iter().map(|a| a.slot.day).collect();
    assert_eq!(days.len(), 5);
}

#[test]
fn test_session_reruns_rebuild_the_model() {
    let tt = loader::load_dir(common::sample_dir()).unwrap();
    let mut session = SolveSession::new(&tt, SolveConfig::default()).unwrap();
    let obs = RecordingObserver::new();

    let first = session.run(&obs).unwrap().objective;
    let second = session.run(&obs).unwrap().objective;
    assert!((first - second).abs() < 1e-3);
    assert_eq!(obs.count(|e| matches!(e, Event::VariablesBuilt { .. })), 2);
    assert!(session.schedule().is_ok());
}
