//! Small builders shared by the unit tests.

use crate::data::{Assignment, Availability, Class, Room, Teacher, TimeSlot, Timetable};

pub(crate) fn week(days: u32, periods: u32) -> Vec<TimeSlot> {
    (0..days)
        .flat_map(|d| (0..periods).map(move |p| TimeSlot::new(d, p)))
        .collect()
}

/// Teacher of Maths, available in every cell of a `days` x `periods` grid.
pub(crate) fn teacher(id: &str, days: usize, periods: usize) -> Teacher {
    Teacher {
        id: id.to_string(),
        name: format!("Teacher {id}"),
        subjects: ["Maths".to_string()].into_iter().collect(),
        full_time: true,
        availability: Availability::always(days, periods),
    }
}

pub(crate) fn class(id: &str, num_students: u32, periods_per_week: u32) -> Class {
    Class {
        id: id.to_string(),
        subject: "Maths".to_string(),
        grade_level: 9,
        num_students,
        periods_per_week,
    }
}

pub(crate) fn room(id: &str, capacity: u32) -> Room {
    Room {
        id: id.to_string(),
        capacity,
        room_type: "General".to_string(),
    }
}

pub(crate) fn assignment(t: &str, c: &str, r: &str, day: u32, period: u32) -> Assignment {
    Assignment {
        slot: TimeSlot::new(day, period),
        teacher_id: t.to_string(),
        class_id: c.to_string(),
        room_id: r.to_string(),
    }
}

pub(crate) struct TimetableBuilder {
    teachers: Vec<Teacher>,
    classes: Vec<Class>,
    rooms: Vec<Room>,
    slots: Vec<TimeSlot>,
}

impl TimetableBuilder {
    pub(crate) fn new(days: u32, periods: u32) -> Self {
        Self {
            teachers: Vec::new(),
            classes: Vec::new(),
            rooms: Vec::new(),
            slots: week(days, periods),
        }
    }

    pub(crate) fn teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    pub(crate) fn class(mut self, class: Class) -> Self {
        self.classes.push(class);
        self
    }

    pub(crate) fn room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    pub(crate) fn build(self) -> Timetable {
        Timetable::new(self.teachers, self.classes, self.rooms, self.slots)
            .expect("test timetable is valid")
    }
}
