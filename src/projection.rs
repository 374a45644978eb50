//! Turns solved assignments into a per-day, per-period schedule.

use std::collections::BTreeMap;

use crate::data::{Assignment, Schedule, ScheduleEntry, Timetable};
use crate::error::ProjectionError;

/// Builds the schedule for `assignments`.
///
/// Every day of the week grid gets an entry list, sorted by period. An
/// assignment naming an entity the timetable does not know is a consistency
/// bug and fails the whole projection.
pub fn project(
    timetable: &Timetable,
    assignments: &[Assignment],
) -> Result<Schedule, ProjectionError> {
    let mut days: BTreeMap<u32, Vec<ScheduleEntry>> = timetable
        .days()
        .iter()
        .map(|day| (*day, Vec::new()))
        .collect();

    for a in assignments {
        let teacher = timetable
            .teacher(&a.teacher_id)
            .ok_or_else(|| ProjectionError::UnknownTeacher(a.teacher_id.clone()))?;
        let class = timetable
            .class(&a.class_id)
            .ok_or_else(|| ProjectionError::UnknownClass(a.class_id.clone()))?;
        let room = timetable
            .room(&a.room_id)
            .ok_or_else(|| ProjectionError::UnknownRoom(a.room_id.clone()))?;
        let unknown_slot = ProjectionError::UnknownTimeSlot {
            day: a.slot.day,
            period: a.slot.period,
        };
        if timetable.slot_index(a.slot).is_none() {
            return Err(unknown_slot);
        }
        let Some(entries) = days.get_mut(&a.slot.day) else {
            return Err(unknown_slot);
        };

        entries.push(ScheduleEntry {
            period: a.slot.period,
            teacher_id: teacher.id.clone(),
            teacher_name: teacher.name.clone(),
            class_id: class.id.clone(),
            class_subject: class.subject.clone(),
            room_id: room.id.clone(),
        });
    }

    for entries in days.values_mut() {
        entries.sort_by(|a, b| {
            (a.period, &a.teacher_id, &a.class_id).cmp(&(b.period, &b.teacher_id, &b.class_id))
        });
    }

    Ok(Schedule { days })
}
