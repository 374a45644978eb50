#![allow(dead_code)]

use timetable_solver::data::{Availability, Class, Room, Teacher, TimeSlot, Timetable};

pub fn week(days: u32, periods: u32) -> Vec<TimeSlot> {
    (0..days)
        .flat_map(|d| (0..periods).map(move |p| TimeSlot::new(d, p)))
        .collect()
}

pub fn teacher(id: &str, availability: Availability) -> Teacher {
    Teacher {
        id: id.to_string(),
        name: format!("Teacher {id}"),
        subjects: ["Maths".to_string()].into_iter().collect(),
        full_time: true,
        availability,
    }
}

pub fn class(id: &str, num_students: u32, periods_per_week: u32) -> Class {
    Class {
        id: id.to_string(),
        subject: "Maths".to_string(),
        grade_level: 9,
        num_students,
        periods_per_week,
    }
}

pub fn room(id: &str, capacity: u32) -> Room {
    Room {
        id: id.to_string(),
        capacity,
        room_type: "General".to_string(),
    }
}

pub fn timetable(
    teachers: Vec<Teacher>,
    classes: Vec<Class>,
    rooms: Vec<Room>,
    days: u32,
    periods: u32,
) -> Timetable {
    Timetable::new(teachers, classes, rooms, week(days, periods)).unwrap()
}

pub fn sample_dir() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample")
}
