//! Synthetic school data.
//!
//! Generates random teachers, classes and rooms over a full week grid. The
//! data is not guaranteed to be solvable; it exercises the loader and the
//! model at realistic sizes.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

use crate::data::{Availability, Class, Room, Teacher, TimeSlot, TimetableInput};
use crate::error::DataError;
use crate::loader;

pub const SUBJECTS: [&str; 8] = [
    "Maths",
    "Science",
    "English",
    "History",
    "Art",
    "Music",
    "PE",
    "Computer Science",
];

pub const ROOM_TYPES: [&str; 4] = ["General", "Science Lab", "Computer Lab", "Gym"];

/// Configuration for generating timetable data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub teachers: usize,
    pub classes: usize,
    pub rooms: usize,
    pub days: u32,
    pub periods: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::small()
    }
}

impl GeneratorConfig {
    /// A handful of entities on a short week, for tests.
    pub fn tiny() -> Self {
        Self {
            teachers: 3,
            classes: 4,
            rooms: 2,
            days: 2,
            periods: 4,
        }
    }

    pub fn small() -> Self {
        Self {
            teachers: 10,
            classes: 15,
            rooms: 5,
            days: 5,
            periods: 8,
        }
    }

    pub fn full() -> Self {
        Self {
            teachers: 75,
            classes: 150,
            rooms: 30,
            days: 5,
            periods: 8,
        }
    }
}

pub struct Generator {
    config: GeneratorConfig,
    rng: ChaCha8Rng,
}

impl Generator {
    pub fn new(config: GeneratorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> TimetableInput {
        TimetableInput {
            teachers: self.teachers(),
            classes: self.classes(),
            rooms: self.rooms(),
            time_slots: self.time_slots(),
        }
    }

    /// Generates and writes the four CSV files into `dir`.
    pub fn write_dir(&mut self, dir: impl AsRef<Path>) -> Result<TimetableInput, DataError> {
        let input = self.generate();
        loader::write_dir(&input, dir)?;
        Ok(input)
    }

    fn teachers(&mut self) -> Vec<Teacher> {
        (0..self.config.teachers)
            .map(|i| {
                let count = self.rng.gen_range(1..=3);
                let subjects = SUBJECTS
                    .choose_multiple(&mut self.rng, count)
                    .map(|s| s.to_string())
                    .collect();
                Teacher {
                    id: format!("T{:03}", i + 1),
                    name: format!("Teacher {}", i + 1),
                    subjects,
                    full_time: self.rng.gen_bool(0.5),
                    availability: self.availability(),
                }
            })
            .collect()
    }

    /// Each day offers 3 to 5 periods, taken front to back with a 70% chance
    /// per period until the day's quota runs out.
    fn availability(&mut self) -> Availability {
        let rows = (0..self.config.days)
            .map(|_| {
                let mut remaining = self.rng.gen_range(3..=5);
                (0..self.config.periods)
                    .map(|_| {
                        let available = remaining > 0 && self.rng.gen_bool(0.7);
                        if available {
                            remaining -= 1;
                        }
                        available
                    })
                    .collect()
            })
            .collect();
        Availability::new(rows)
    }

    fn classes(&mut self) -> Vec<Class> {
        (0..self.config.classes)
            .map(|i| Class {
                id: format!("C{:03}", i + 1),
                subject: SUBJECTS[self.rng.gen_range(0..SUBJECTS.len())].to_string(),
                grade_level: self.rng.gen_range(7..=12),
                num_students: self.rng.gen_range(20..=35),
                periods_per_week: self.rng.gen_range(3..=5),
            })
            .collect()
    }

    fn rooms(&mut self) -> Vec<Room> {
        (0..self.config.rooms)
            .map(|i| Room {
                id: format!("R{:03}", i + 1),
                capacity: self.rng.gen_range(20..=40),
                room_type: ROOM_TYPES[self.rng.gen_range(0..ROOM_TYPES.len())].to_string(),
            })
            .collect()
    }

    fn time_slots(&self) -> Vec<TimeSlot> {
        (0..self.config.days)
            .flat_map(|day| (0..self.config.periods).map(move |period| TimeSlot::new(day, period)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Timetable;

    #[test]
    fn test_presets() {
        let small = GeneratorConfig::small();
        assert_eq!((small.teachers, small.classes, small.rooms), (10, 15, 5));
        let full = GeneratorConfig::full();
        assert_eq!((full.teachers, full.classes, full.rooms), (75, 150, 30));
        assert_eq!((full.days, full.periods), (5, 8));
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = Generator::new(GeneratorConfig::small(), 7).generate();
        let b = Generator::new(GeneratorConfig::small(), 7).generate();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_generated_values_in_range() {
        let input = Generator::new(GeneratorConfig::small(), 42).generate();
        assert_eq!(input.time_slots.len(), 40);
        for t in &input.teachers {
            assert!((1..=3).contains(&t.subjects.len()));
            assert_eq!(t.availability.rows().len(), 5);
            for row in t.availability.rows() {
                assert_eq!(row.len(), 8);
                assert!(row.iter().filter(|a| **a).count() <= 5);
            }
        }
        for c in &input.classes {
            assert!((7..=12).contains(&c.grade_level));
            assert!((20..=35).contains(&c.num_students));
            assert!((3..=5).contains(&c.periods_per_week));
            assert!(SUBJECTS.contains(&c.subject.as_str()));
        }
        for r in &input.rooms {
            assert!((20..=40).contains(&r.capacity));
            assert!(ROOM_TYPES.contains(&r.room_type.as_str()));
        }
        assert!(Timetable::try_from(input).is_ok());
    }

    #[test]
    fn test_write_dir_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let input = Generator::new(GeneratorConfig::tiny(), 1)
            .write_dir(dir.path())
            .unwrap();
        let tt = loader::load_dir(dir.path()).unwrap();
        assert_eq!(tt.teachers().len(), input.teachers.len());
        assert_eq!(tt.classes().len(), input.classes.len());
        assert_eq!(tt.grid_dims(), (2, 4));
        assert_eq!(
            tt.teachers()[0].availability,
            input.teachers[0].availability
        );
    }
}
