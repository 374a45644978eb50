//! Hard constraints over the assignment space.
//!
//! Each family is built independently and an assignment is feasible only if
//! every family holds. All of them are linear in the 0/1 variables.

use good_lp::{Constraint, constraint};

use crate::config::ConstraintExtensions;
use crate::observe::{Event, Observer};
use crate::variables::VariableSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    RoomCapacity,
    TeacherAvailability,
    OneClassPerPeriod,
    RequiredPeriods,
    SubjectQualification,
    DailyPeriodCap,
}

impl Family {
    pub fn name(self) -> &'static str {
        match self {
            Family::RoomCapacity => "room capacity",
            Family::TeacherAvailability => "teacher availability",
            Family::OneClassPerPeriod => "one class per teacher per period",
            Family::RequiredPeriods => "required periods per class",
            Family::SubjectQualification => "subject qualification",
            Family::DailyPeriodCap => "daily period cap",
        }
    }
}

/// Constraints grouped by the family that produced them.
#[derive(Default)]
pub struct ConstraintSet {
    groups: Vec<(Family, Vec<Constraint>)>,
}

impl ConstraintSet {
    fn push(&mut self, family: Family, constraints: Vec<Constraint>, observer: &dyn Observer) {
        observer.record(Event::ConstraintsAdded {
            family: family.name(),
            count: constraints.len(),
        });
        self.groups.push((family, constraints));
    }

    pub fn count(&self, family: Family) -> usize {
        self.groups
            .iter()
            .filter(|(f, _)| *f == family)
            .map(|(_, c)| c.len())
            .sum()
    }

    pub fn families(&self) -> Vec<Family> {
        self.groups.iter().map(|(f, _)| *f).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, c)| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_constraints(self) -> impl Iterator<Item = Constraint> {
        self.groups.into_iter().flat_map(|(_, c)| c)
    }
}

/// For every (room, slot): total students seated <= room capacity.
/// The lower bound of zero follows from the variables being binary.
pub fn room_capacity(space: &VariableSpace) -> Vec<Constraint> {
    let tt = space.timetable();
    let mut constraints = Vec::new();
    for room in tt.rooms() {
        for &slot in tt.time_slots() {
            let enrolled = space.room_enrollment(&room.id, slot);
            constraints.push(constraint!(enrolled <= room.capacity as f64));
        }
    }
    constraints
}

/// For every (teacher, slot) the teacher cannot make: no assignment at all.
///
/// A slot the availability grid does not cover is treated as unavailable and
/// reported to the observer.
pub fn teacher_availability(space: &VariableSpace, observer: &dyn Observer) -> Vec<Constraint> {
    let tt = space.timetable();
    let mut constraints = Vec::new();
    for (t, teacher) in tt.teachers().iter().enumerate() {
        for (s, slot) in tt.time_slots().iter().enumerate() {
            match teacher.availability.get(*slot) {
                Some(true) => continue,
                Some(false) => {}
                None => observer.record(Event::MissingAvailability {
                    teacher_id: teacher.id.clone(),
                    slot: *slot,
                }),
            }
            let busy = space.teacher_at(t, s);
            constraints.push(constraint!(busy == 0));
        }
    }
    constraints
}

/// For every (teacher, slot): at most one class.
pub fn one_class_per_teacher_per_period(space: &VariableSpace) -> Vec<Constraint> {
    let tt = space.timetable();
    let mut constraints = Vec::new();
    for t in 0..tt.teachers().len() {
        for s in 0..tt.time_slots().len() {
            let busy = space.teacher_at(t, s);
            constraints.push(constraint!(busy <= 1));
        }
    }
    constraints
}

/// For every class: exactly `periods_per_week` assignments.
pub fn required_periods_per_class(space: &VariableSpace) -> Vec<Constraint> {
    space
        .timetable()
        .classes()
        .iter()
        .enumerate()
        .map(|(c, class)| {
            let scheduled = space.class_total(c);
            constraint!(scheduled == class.periods_per_week as f64)
        })
        .collect()
}

/// For every (teacher, class) whose subject the teacher does not list:
/// no assignment.
pub fn subject_qualification(space: &VariableSpace) -> Vec<Constraint> {
    let tt = space.timetable();
    let mut constraints = Vec::new();
    for (t, teacher) in tt.teachers().iter().enumerate() {
        for (c, class) in tt.classes().iter().enumerate() {
            if !teacher.subjects.contains(&class.subject) {
                let taught = space.teacher_class_total(t, c);
                constraints.push(constraint!(taught == 0));
            }
        }
    }
    constraints
}

/// For every (teacher, day): at most `cap` periods.
pub fn daily_period_cap(space: &VariableSpace, cap: u32) -> Vec<Constraint> {
    let tt = space.timetable();
    let mut constraints = Vec::new();
    for t in 0..tt.teachers().len() {
        for &day in tt.days() {
            let load = space.teacher_on_day(t, day);
            constraints.push(constraint!(load <= cap as f64));
        }
    }
    constraints
}

/// Builds the four mandatory families plus any enabled extensions.
pub fn apply_all(
    space: &VariableSpace,
    extensions: &ConstraintExtensions,
    observer: &dyn Observer,
) -> ConstraintSet {
    let mut set = ConstraintSet::default();
    set.push(Family::RoomCapacity, room_capacity(space), observer);
    set.push(
        Family::TeacherAvailability,
        teacher_availability(space, observer),
        observer,
    );
    set.push(
        Family::OneClassPerPeriod,
        one_class_per_teacher_per_period(space),
        observer,
    );
    set.push(
        Family::RequiredPeriods,
        required_periods_per_class(space),
        observer,
    );
    if extensions.subject_qualification {
        set.push(
            Family::SubjectQualification,
            subject_qualification(space),
            observer,
        );
    }
    if let Some(cap) = extensions.max_periods_per_day {
        set.push(Family::DailyPeriodCap, daily_period_cap(space, cap), observer);
    }
    set
}
