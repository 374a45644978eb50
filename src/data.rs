use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::error::DataError;
use crate::validation;

// Type aliases for clarity
pub type TeacherId = String;
pub type ClassId = String;
pub type RoomId = String;

/// One cell of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct TimeSlot {
    pub day: u32,
    pub period: u32,
}

impl TimeSlot {
    pub fn new(day: u32, period: u32) -> Self {
        Self { day, period }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.day, self.period)
    }
}

/// Availability grid indexed `[day][period]`, `true` meaning available.
///
/// Rows are kept exactly as supplied. A cell outside the supplied rows is
/// missing, which the constraint builder treats as unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Availability(Vec<Vec<bool>>);

impl Availability {
    pub fn new(rows: Vec<Vec<bool>>) -> Self {
        Self(rows)
    }

    /// Available in every cell of a `days` x `periods` grid.
    pub fn always(days: usize, periods: usize) -> Self {
        Self(vec![vec![true; periods]; days])
    }

    /// Unavailable in every cell of a `days` x `periods` grid.
    pub fn never(days: usize, periods: usize) -> Self {
        Self(vec![vec![false; periods]; days])
    }

    /// `None` when the grid has no cell for `slot`.
    pub fn get(&self, slot: TimeSlot) -> Option<bool> {
        self.0
            .get(slot.day as usize)
            .and_then(|row| row.get(slot.period as usize))
            .copied()
    }

    pub fn set(&mut self, slot: TimeSlot, available: bool) {
        let (day, period) = (slot.day as usize, slot.period as usize);
        if self.0.len() <= day {
            self.0.resize(day + 1, Vec::new());
        }
        let row = &mut self.0[day];
        if row.len() <= period {
            row.resize(period + 1, false);
        }
        row[period] = available;
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.0
    }
}

/// A teacher with the subjects they can teach and their weekly availability.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub subjects: BTreeSet<String>,
    #[serde(default)]
    pub full_time: bool,
    #[serde(default)]
    pub availability: Availability,
}

/// A class that must meet exactly `periods_per_week` times.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: ClassId,
    pub subject: String,
    pub grade_level: u32,
    pub num_students: u32,
    pub periods_per_week: u32,
}

/// Represents a physical room with a given capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
    #[serde(rename = "type", default)]
    pub room_type: String,
}

/// Unvalidated entity collections, as supplied by a loader or a request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableInput {
    pub teachers: Vec<Teacher>,
    pub classes: Vec<Class>,
    pub rooms: Vec<Room>,
    pub time_slots: Vec<TimeSlot>,
}

/// Validated, immutable entity collections for one scheduling session.
///
/// Time slots are sorted by `(day, period)`. Every collection is non-empty
/// and ids are unique, so index lookups by id are total over the input.
#[derive(Debug, Clone)]
pub struct Timetable {
    teachers: Vec<Teacher>,
    classes: Vec<Class>,
    rooms: Vec<Room>,
    time_slots: Vec<TimeSlot>,
    teacher_index: HashMap<TeacherId, usize>,
    class_index: HashMap<ClassId, usize>,
    room_index: HashMap<RoomId, usize>,
    slot_index: HashMap<TimeSlot, usize>,
    days: Vec<u32>,
}

impl Timetable {
    pub fn new(
        teachers: Vec<Teacher>,
        classes: Vec<Class>,
        rooms: Vec<Room>,
        mut time_slots: Vec<TimeSlot>,
    ) -> Result<Self, DataError> {
        validation::validate_entities(&teachers, &classes, &rooms, &time_slots)
            .map_err(DataError::Invalid)?;

        time_slots.sort();
        let teacher_index = teachers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let class_index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        let room_index = rooms
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        let slot_index = time_slots
            .iter()
            .enumerate()
            .map(|(i, s)| (*s, i))
            .collect();
        let mut days: Vec<u32> = time_slots.iter().map(|s| s.day).collect();
        days.dedup();

        Ok(Self {
            teachers,
            classes,
            rooms,
            time_slots,
            teacher_index,
            class_index,
            room_index,
            slot_index,
            days,
        })
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.time_slots
    }

    pub fn teacher_index(&self, id: &str) -> Option<usize> {
        self.teacher_index.get(id).copied()
    }

    pub fn class_index(&self, id: &str) -> Option<usize> {
        self.class_index.get(id).copied()
    }

    pub fn room_index(&self, id: &str) -> Option<usize> {
        self.room_index.get(id).copied()
    }

    pub fn slot_index(&self, slot: TimeSlot) -> Option<usize> {
        self.slot_index.get(&slot).copied()
    }

    pub fn teacher(&self, id: &str) -> Option<&Teacher> {
        self.teacher_index(id).map(|i| &self.teachers[i])
    }

    pub fn class(&self, id: &str) -> Option<&Class> {
        self.class_index(id).map(|i| &self.classes[i])
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.room_index(id).map(|i| &self.rooms[i])
    }

    /// Distinct days of the week grid, ascending.
    pub fn days(&self) -> &[u32] {
        &self.days
    }

    /// Indices of the time slots falling on `day`, in period order.
    pub fn slots_on(&self, day: u32) -> impl Iterator<Item = usize> + '_ {
        self.time_slots
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.day == day)
            .map(|(i, _)| i)
    }

    /// First and last period present on `day`.
    pub fn period_range(&self, day: u32) -> Option<(u32, u32)> {
        let mut periods = self
            .time_slots
            .iter()
            .filter(|s| s.day == day)
            .map(|s| s.period);
        let first = periods.next()?;
        let last = periods.last().unwrap_or(first);
        Some((first, last))
    }

    /// `(days, periods)` needed for a grid covering every time slot.
    pub fn grid_dims(&self) -> (usize, usize) {
        grid_dims(&self.time_slots)
    }
}

impl TryFrom<TimetableInput> for Timetable {
    type Error = DataError;

    fn try_from(input: TimetableInput) -> Result<Self, Self::Error> {
        Timetable::new(input.teachers, input.classes, input.rooms, input.time_slots)
    }
}

pub(crate) fn grid_dims(time_slots: &[TimeSlot]) -> (usize, usize) {
    let days = time_slots.iter().map(|s| s.day as usize + 1).max().unwrap_or(0);
    let periods = time_slots
        .iter()
        .map(|s| s.period as usize + 1)
        .max()
        .unwrap_or(0);
    (days, periods)
}

/// Key of one binary decision variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssignmentKey {
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub room_id: RoomId,
    pub slot: TimeSlot,
}

/// Represents a single scheduled (teacher, class, room, slot) assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub slot: TimeSlot,
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub room_id: RoomId,
}

/// One row of the projected schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub period: u32,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub class_id: ClassId,
    pub class_subject: String,
    pub room_id: RoomId,
}

/// Day to ordered list of entries. Every day of the week grid has a key,
/// even when nothing is scheduled on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    pub days: BTreeMap<u32, Vec<ScheduleEntry>>,
}

impl Schedule {
    pub fn entries(&self) -> impl Iterator<Item = (u32, &ScheduleEntry)> {
        self.days
            .iter()
            .flat_map(|(day, entries)| entries.iter().map(move |e| (*day, e)))
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
