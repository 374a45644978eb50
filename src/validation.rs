//! Input validation and solution verification.
//!
//! [`validate_entities`] checks the structural integrity of the entity
//! collections before any model is built. Detects:
//! - Empty collections
//! - Duplicate IDs and duplicate time slots
//! - Zero grade level, class size, weekly periods or room capacity
//!
//! [`verify_assignments`] re-checks a solved assignment against every hard
//! constraint without involving the solver. The solve controller uses it to
//! tell a real incumbent from an empty one when the time limit is hit.

use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::ConstraintExtensions;
use crate::data::{Assignment, Class, Room, Teacher, TimeSlot, Timetable};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required collection is empty.
    Empty,
    /// Two entities share the same ID.
    DuplicateId,
    /// The same (day, period) appears twice.
    DuplicateTimeSlot,
    /// A count that must be positive is zero.
    NonPositive,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the entity collections for a scheduling session.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_entities(
    teachers: &[Teacher],
    classes: &[Class],
    rooms: &[Room],
    time_slots: &[TimeSlot],
) -> ValidationResult {
    let mut errors = Vec::new();

    for (name, empty) in [
        ("teachers", teachers.is_empty()),
        ("classes", classes.is_empty()),
        ("rooms", rooms.is_empty()),
        ("time slots", time_slots.is_empty()),
    ] {
        if empty {
            errors.push(ValidationError::new(
                ValidationErrorKind::Empty,
                format!("No {name} loaded."),
            ));
        }
    }

    check_unique("teacher", teachers.iter().map(|t| t.id.as_str()), &mut errors);
    check_unique("class", classes.iter().map(|c| c.id.as_str()), &mut errors);
    check_unique("room", rooms.iter().map(|r| r.id.as_str()), &mut errors);

    let mut seen_slots = HashSet::new();
    for slot in time_slots {
        if !seen_slots.insert(*slot) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateTimeSlot,
                format!("Duplicate time slot: {slot}"),
            ));
        }
    }

    for class in classes {
        for (field, value) in [
            ("GradeLevel", class.grade_level),
            ("NumStudents", class.num_students),
            ("PeriodsPerWeek", class.periods_per_week),
        ] {
            if value == 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NonPositive,
                    format!("Class '{}' has non-positive {field}", class.id),
                ));
            }
        }
    }

    for room in rooms {
        if room.capacity == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositive,
                format!("Room '{}' has non-positive Capacity", room.id),
            ));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_unique<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {kind} ID: {id}"),
            ));
        }
    }
}

/// A hard constraint broken by an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    RequiredPeriods {
        class_id: String,
        required: u32,
        scheduled: u32,
    },
    TeacherDoubleBooked {
        teacher_id: String,
        slot: TimeSlot,
        classes: usize,
    },
    RoomOverCapacity {
        room_id: String,
        slot: TimeSlot,
        students: u32,
        capacity: u32,
    },
    TeacherUnavailable {
        teacher_id: String,
        slot: TimeSlot,
    },
    SubjectNotQualified {
        teacher_id: String,
        class_id: String,
    },
    DailyCapExceeded {
        teacher_id: String,
        day: u32,
        periods: u32,
    },
    UnknownEntity(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::RequiredPeriods {
                class_id,
                required,
                scheduled,
            } => write!(
                f,
                "class {class_id} needs {required} periods but has {scheduled}"
            ),
            Violation::TeacherDoubleBooked {
                teacher_id,
                slot,
                classes,
            } => write!(f, "teacher {teacher_id} teaches {classes} classes at {slot}"),
            Violation::RoomOverCapacity {
                room_id,
                slot,
                students,
                capacity,
            } => write!(
                f,
                "room {room_id} holds {students} students at {slot}, capacity {capacity}"
            ),
            Violation::TeacherUnavailable { teacher_id, slot } => {
                write!(f, "teacher {teacher_id} is unavailable at {slot}")
            }
            Violation::SubjectNotQualified {
                teacher_id,
                class_id,
            } => write!(f, "teacher {teacher_id} cannot teach class {class_id}"),
            Violation::DailyCapExceeded {
                teacher_id,
                day,
                periods,
            } => write!(f, "teacher {teacher_id} teaches {periods} periods on day {day}"),
            Violation::UnknownEntity(what) => write!(f, "unknown entity {what}"),
        }
    }
}

/// Checks `assignments` against every hard constraint of the model.
///
/// Missing availability cells count as unavailable, matching the constraint
/// builder.
pub fn verify_assignments(
    timetable: &Timetable,
    assignments: &[Assignment],
    extensions: &ConstraintExtensions,
) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    for a in assignments {
        if timetable.teacher(&a.teacher_id).is_none() {
            violations.push(Violation::UnknownEntity(format!("teacher {}", a.teacher_id)));
        }
        if timetable.class(&a.class_id).is_none() {
            violations.push(Violation::UnknownEntity(format!("class {}", a.class_id)));
        }
        if timetable.room(&a.room_id).is_none() {
            violations.push(Violation::UnknownEntity(format!("room {}", a.room_id)));
        }
        if timetable.slot_index(a.slot).is_none() {
            violations.push(Violation::UnknownEntity(format!("time slot {}", a.slot)));
        }
    }
    if !violations.is_empty() {
        return Err(violations);
    }

    let per_class = assignments.iter().counts_by(|a| a.class_id.as_str());
    for class in timetable.classes() {
        let scheduled = per_class.get(class.id.as_str()).copied().unwrap_or(0) as u32;
        if scheduled != class.periods_per_week {
            violations.push(Violation::RequiredPeriods {
                class_id: class.id.clone(),
                required: class.periods_per_week,
                scheduled,
            });
        }
    }

    let per_teacher_slot = assignments
        .iter()
        .counts_by(|a| (a.teacher_id.as_str(), a.slot));
    for ((teacher_id, slot), classes) in per_teacher_slot.into_iter().sorted() {
        if classes > 1 {
            violations.push(Violation::TeacherDoubleBooked {
                teacher_id: teacher_id.to_string(),
                slot,
                classes,
            });
        }
    }

    let mut room_load: HashMap<(&str, TimeSlot), u32> = HashMap::new();
    for a in assignments {
        if let Some(class) = timetable.class(&a.class_id) {
            *room_load.entry((a.room_id.as_str(), a.slot)).or_default() += class.num_students;
        }
    }
    for ((room_id, slot), students) in room_load.into_iter().sorted() {
        if let Some(room) = timetable.room(room_id) {
            if students > room.capacity {
                violations.push(Violation::RoomOverCapacity {
                    room_id: room_id.to_string(),
                    slot,
                    students,
                    capacity: room.capacity,
                });
            }
        }
    }

    for a in assignments {
        let Some(teacher) = timetable.teacher(&a.teacher_id) else {
            continue;
        };
        if !teacher.availability.get(a.slot).unwrap_or(false) {
            violations.push(Violation::TeacherUnavailable {
                teacher_id: a.teacher_id.clone(),
                slot: a.slot,
            });
        }
        if extensions.subject_qualification {
            let qualified = timetable
                .class(&a.class_id)
                .is_some_and(|c| teacher.subjects.contains(&c.subject));
            if !qualified {
                violations.push(Violation::SubjectNotQualified {
                    teacher_id: a.teacher_id.clone(),
                    class_id: a.class_id.clone(),
                });
            }
        }
    }

    if let Some(cap) = extensions.max_periods_per_day {
        let per_day = assignments
            .iter()
            .counts_by(|a| (a.teacher_id.as_str(), a.slot.day));
        for ((teacher_id, day), periods) in per_day.into_iter().sorted() {
            if periods as u32 > cap {
                violations.push(Violation::DailyCapExceeded {
                    teacher_id: teacher_id.to_string(),
                    day,
                    periods: periods as u32,
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
