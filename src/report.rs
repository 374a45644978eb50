//! Read-only views over a solved schedule: statistics, gap counts, CSV
//! export and a plain-text rendering.

use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::io::Write;

use crate::data::{RoomId, Schedule, TeacherId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStats {
    pub total_classes: usize,
    pub classes_per_day: BTreeMap<u32, usize>,
    pub teacher_workload: BTreeMap<TeacherId, usize>,
    pub room_utilization: BTreeMap<RoomId, usize>,
    pub avg_classes_per_day: f64,
    pub max_teacher_workload: usize,
    pub min_teacher_workload: usize,
}

pub fn statistics(schedule: &Schedule) -> ScheduleStats {
    let classes_per_day: BTreeMap<u32, usize> = schedule
        .days
        .iter()
        .map(|(day, entries)| (*day, entries.len()))
        .collect();
    let total_classes = schedule.len();
    let teacher_workload: BTreeMap<TeacherId, usize> = schedule
        .entries()
        .counts_by(|(_, e)| e.teacher_id.clone())
        .into_iter()
        .collect();
    let room_utilization: BTreeMap<RoomId, usize> = schedule
        .entries()
        .counts_by(|(_, e)| e.room_id.clone())
        .into_iter()
        .collect();
    let avg_classes_per_day = if classes_per_day.is_empty() {
        0.0
    } else {
        total_classes as f64 / classes_per_day.len() as f64
    };

    ScheduleStats {
        total_classes,
        max_teacher_workload: teacher_workload.values().copied().max().unwrap_or(0),
        min_teacher_workload: teacher_workload.values().copied().min().unwrap_or(0),
        classes_per_day,
        teacher_workload,
        room_utilization,
        avg_classes_per_day,
    }
}

/// Gaps per teacher: idle periods whose previous and next periods on the
/// same day are both teaching periods.
pub fn gaps_by_teacher(schedule: &Schedule) -> BTreeMap<TeacherId, usize> {
    let mut taught: HashMap<(&str, u32), BTreeSet<u32>> = HashMap::new();
    for (day, e) in schedule.entries() {
        taught
            .entry((e.teacher_id.as_str(), day))
            .or_default()
            .insert(e.period);
    }

    let mut gaps: BTreeMap<TeacherId, usize> = BTreeMap::new();
    for ((teacher_id, _), periods) in taught {
        let count = periods
            .iter()
            .tuple_windows()
            .filter(|&(a, b)| b - a == 2)
            .count();
        *gaps.entry(teacher_id.to_string()).or_default() += count;
    }
    gaps
}

/// Total gaps over all teachers and days.
pub fn count_gaps(schedule: &Schedule) -> usize {
    gaps_by_teacher(schedule).values().sum()
}

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Day")]
    day: u32,
    #[serde(rename = "Period")]
    period: u32,
    #[serde(rename = "Class")]
    class: &'a str,
    #[serde(rename = "Teacher")]
    teacher: &'a str,
    #[serde(rename = "Room")]
    room: &'a str,
}

/// Writes one row per entry with 1-based day and period numbers.
pub fn export_csv<W: Write>(schedule: &Schedule, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (day, e) in schedule.entries() {
        wtr.serialize(CsvRow {
            day: day + 1,
            period: e.period + 1,
            class: &e.class_subject,
            teacher: &e.teacher_name,
            room: &e.room_id,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (day, entries) in &self.days {
            writeln!(f, "Day {}:", day + 1)?;
            for e in entries {
                writeln!(
                    f,
                    "  Period {}: {} - Teacher: {}, Room: {}",
                    e.period + 1,
                    e.class_subject,
                    e.teacher_name,
                    e.room_id
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
