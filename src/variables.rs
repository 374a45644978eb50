//! The assignment decision space.
//!
//! x_tcrs = 1 if teacher t teaches class c in room r during slot s
//!          0 otherwise
//!
//! One binary variable exists for every (teacher, class, room, slot) tuple of
//! the timetable; nothing is filtered out here. Infeasible combinations are
//! ruled out by constraints instead, so every lookup by a key drawn from the
//! timetable succeeds and any other key reads as a zero coefficient.

use good_lp::{Expression, ProblemVariables, Variable, variable};
use itertools::Itertools;

use crate::data::{AssignmentKey, TimeSlot, Timetable};
use crate::error::ModelError;
use crate::observe::{Event, Observer};

/// Position of a variable along the four axes of the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Index {
    pub teacher: usize,
    pub class: usize,
    pub room: usize,
    pub slot: usize,
}

pub struct VariableSpace<'a> {
    timetable: &'a Timetable,
    vars: Vec<Variable>,
    teachers: usize,
    classes: usize,
    rooms: usize,
    slots: usize,
}

impl<'a> VariableSpace<'a> {
    pub fn build(
        problem: &mut ProblemVariables,
        timetable: &'a Timetable,
        observer: &dyn Observer,
    ) -> Self {
        let teachers = timetable.teachers().len();
        let classes = timetable.classes().len();
        let rooms = timetable.rooms().len();
        let slots = timetable.time_slots().len();
        let count = teachers * classes * rooms * slots;

        let vars = problem.add_vector(variable().binary(), count);
        observer.record(Event::VariablesBuilt { count });

        Self {
            timetable,
            vars,
            teachers,
            classes,
            rooms,
            slots,
        }
    }

    pub fn timetable(&self) -> &'a Timetable {
        self.timetable
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn offset(&self, t: usize, c: usize, r: usize, s: usize) -> usize {
        ((t * self.classes + c) * self.rooms + r) * self.slots + s
    }

    /// Variable at an index inside the space.
    pub fn var(&self, t: usize, c: usize, r: usize, s: usize) -> Variable {
        self.vars[self.offset(t, c, r, s)]
    }

    pub fn index_of(&self, key: &AssignmentKey) -> Option<Index> {
        let tt = self.timetable;
        Some(Index {
            teacher: tt.teacher_index(&key.teacher_id)?,
            class: tt.class_index(&key.class_id)?,
            room: tt.room_index(&key.room_id)?,
            slot: tt.slot_index(key.slot)?,
        })
    }

    pub fn key_of(&self, index: Index) -> AssignmentKey {
        let tt = self.timetable;
        AssignmentKey {
            teacher_id: tt.teachers()[index.teacher].id.clone(),
            class_id: tt.classes()[index.class].id.clone(),
            room_id: tt.rooms()[index.room].id.clone(),
            slot: tt.time_slots()[index.slot],
        }
    }

    pub fn get(&self, key: &AssignmentKey) -> Option<Variable> {
        self.index_of(key)
            .map(|i| self.var(i.teacher, i.class, i.room, i.slot))
    }

    /// Like [`get`](Self::get), for callers that hold a key which must exist.
    pub fn require(&self, key: &AssignmentKey) -> Result<Variable, ModelError> {
        let tt = self.timetable;
        let unknown = |kind: &'static str, id: String| ModelError::UnknownEntity { kind, id };
        if tt.teacher_index(&key.teacher_id).is_none() {
            return Err(unknown("teacher", key.teacher_id.clone()));
        }
        if tt.class_index(&key.class_id).is_none() {
            return Err(unknown("class", key.class_id.clone()));
        }
        if tt.room_index(&key.room_id).is_none() {
            return Err(unknown("room", key.room_id.clone()));
        }
        self.get(key)
            .ok_or_else(|| unknown("time slot", key.slot.to_string()))
    }

    /// `coefficient * x_key`, or the zero expression for a key outside the space.
    pub fn term(&self, key: &AssignmentKey, coefficient: f64) -> Expression {
        match self.get(key) {
            Some(var) => coefficient * var,
            None => Expression::from(0.0),
        }
    }

    /// Every variable with its index, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Index, Variable)> + '_ {
        (0..self.teachers).flat_map(move |teacher| {
            (0..self.classes).flat_map(move |class| {
                (0..self.rooms).flat_map(move |room| {
                    (0..self.slots).map(move |slot| {
                        let index = Index {
                            teacher,
                            class,
                            room,
                            slot,
                        };
                        (index, self.var(teacher, class, room, slot))
                    })
                })
            })
        })
    }

    /// Number of classes teacher `t` teaches during slot `s`.
    pub fn teacher_at(&self, t: usize, s: usize) -> Expression {
        (0..self.classes)
            .flat_map(|c| (0..self.rooms).map(move |r| (c, r)))
            .map(|(c, r)| self.var(t, c, r, s))
            .sum()
    }

    /// Like [`teacher_at`](Self::teacher_at), addressed by day and period.
    /// A (day, period) with no time slot yields the zero expression.
    pub fn teacher_at_period(&self, t: usize, day: u32, period: u32) -> Expression {
        match self.timetable.slot_index(TimeSlot::new(day, period)) {
            Some(s) => self.teacher_at(t, s),
            None => Expression::from(0.0),
        }
    }

    /// Periods taught by teacher `t` on `day`.
    pub fn teacher_on_day(&self, t: usize, day: u32) -> Expression {
        self.timetable
            .slots_on(day)
            .map(|s| self.teacher_at(t, s))
            .sum()
    }

    /// Periods taught by teacher `t` over the whole week.
    pub fn teacher_total(&self, t: usize) -> Expression {
        (0..self.slots).map(|s| self.teacher_at(t, s)).sum()
    }

    /// Periods of class `c` given by teacher `t` over the whole week.
    pub fn teacher_class_total(&self, t: usize, c: usize) -> Expression {
        (0..self.rooms)
            .flat_map(|r| (0..self.slots).map(move |s| (r, s)))
            .map(|(r, s)| self.var(t, c, r, s))
            .sum()
    }

    /// Students seated in `room_id` during `slot`, weighted per class size.
    /// Zero for a room or slot the timetable does not know.
    pub fn room_enrollment(&self, room_id: &str, slot: TimeSlot) -> Expression {
        let tt = self.timetable;
        tt.teachers()
            .iter()
            .cartesian_product(tt.classes())
            .map(|(teacher, class)| {
                let key = AssignmentKey {
                    teacher_id: teacher.id.clone(),
                    class_id: class.id.clone(),
                    room_id: room_id.to_string(),
                    slot,
                };
                self.term(&key, class.num_students as f64)
            })
            .sum()
    }

    /// Periods of class `c` on `day`.
    pub fn class_on_day(&self, c: usize, day: u32) -> Expression {
        self.timetable
            .slots_on(day)
            .map(|s| self.class_at(c, s))
            .sum()
    }

    /// Periods of class `c` over the whole week.
    pub fn class_total(&self, c: usize) -> Expression {
        (0..self.slots).map(|s| self.class_at(c, s)).sum()
    }

    fn class_at(&self, c: usize, s: usize) -> Expression {
        (0..self.teachers)
            .flat_map(|t| (0..self.rooms).map(move |r| (t, r)))
            .map(|(t, r)| self.var(t, c, r, s))
            .sum()
    }
}
