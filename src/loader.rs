//! CSV ingestion for the four entity files.

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crate::data::{self, Availability, Class, Room, Teacher, TimeSlot, Timetable, TimetableInput};
use crate::error::DataError;

pub const TEACHERS_FILE: &str = "teachers.csv";
pub const CLASSES_FILE: &str = "classes.csv";
pub const ROOMS_FILE: &str = "rooms.csv";
pub const TIME_SLOTS_FILE: &str = "time_slots.csv";

#[derive(Debug, Deserialize, Serialize)]
struct TeacherRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Subjects")]
    subjects: String,
    #[serde(rename = "FullTime")]
    full_time: String,
    #[serde(rename = "Availability")]
    availability: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct ClassRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "GradeLevel")]
    grade_level: u32,
    #[serde(rename = "NumStudents")]
    num_students: u32,
    #[serde(rename = "PeriodsPerWeek")]
    periods_per_week: u32,
}

#[derive(Debug, Deserialize, Serialize)]
struct RoomRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Capacity")]
    capacity: u32,
    #[serde(rename = "Type")]
    room_type: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct TimeSlotRow {
    #[serde(rename = "Day")]
    day: u32,
    #[serde(rename = "Period")]
    period: u32,
}

/// Parses `1,1,0;0,1,1` style availability into a `days` x `periods` grid.
///
/// Days are separated by `;` and cells by `,`. Only `1` counts as
/// available. Short rows and missing days are padded with `false`, extra
/// cells and days are dropped.
pub fn parse_availability(s: &str, days: usize, periods: usize) -> Availability {
    let mut rows: Vec<Vec<bool>> = s
        .split(';')
        .take(days)
        .map(|day| {
            let mut row: Vec<bool> = day
                .split(',')
                .take(periods)
                .map(|cell| cell.trim() == "1")
                .collect();
            row.resize(periods, false);
            row
        })
        .collect();
    rows.resize(days, vec![false; periods]);
    Availability::new(rows)
}

fn read_rows<T: DeserializeOwned, R: Read>(file: &str, reader: R) -> Result<Vec<T>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| DataError::Csv {
            file: file.to_string(),
            source,
        })?;
    debug!("Read {} rows from {}", rows.len(), file);
    Ok(rows)
}

fn require_id(file: &str, row: usize, id: &str) -> Result<(), DataError> {
    if id.is_empty() {
        return Err(DataError::Field {
            file: file.to_string(),
            row,
            message: "empty ID".to_string(),
        });
    }
    Ok(())
}

/// Availability strings are sized to the `days` x `periods` week grid.
pub fn load_teachers<R: Read>(
    reader: R,
    days: usize,
    periods: usize,
) -> Result<Vec<Teacher>, DataError> {
    let rows: Vec<TeacherRow> = read_rows(TEACHERS_FILE, reader)?;
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            require_id(TEACHERS_FILE, i + 1, &row.id)?;
            Ok(Teacher {
                id: row.id,
                name: row.name,
                subjects: row
                    .subjects
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
                full_time: row.full_time.eq_ignore_ascii_case("true"),
                availability: parse_availability(&row.availability, days, periods),
            })
        })
        .collect()
}

pub fn load_classes<R: Read>(reader: R) -> Result<Vec<Class>, DataError> {
    let rows: Vec<ClassRow> = read_rows(CLASSES_FILE, reader)?;
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            require_id(CLASSES_FILE, i + 1, &row.id)?;
            Ok(Class {
                id: row.id,
                subject: row.subject,
                grade_level: row.grade_level,
                num_students: row.num_students,
                periods_per_week: row.periods_per_week,
            })
        })
        .collect()
}

pub fn load_rooms<R: Read>(reader: R) -> Result<Vec<Room>, DataError> {
    let rows: Vec<RoomRow> = read_rows(ROOMS_FILE, reader)?;
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            require_id(ROOMS_FILE, i + 1, &row.id)?;
            Ok(Room {
                id: row.id,
                capacity: row.capacity,
                room_type: row.room_type,
            })
        })
        .collect()
}

pub fn load_time_slots<R: Read>(reader: R) -> Result<Vec<TimeSlot>, DataError> {
    let rows: Vec<TimeSlotRow> = read_rows(TIME_SLOTS_FILE, reader)?;
    Ok(rows
        .into_iter()
        .map(|row| TimeSlot::new(row.day, row.period))
        .collect())
}

/// Loads the four CSV files in `dir` without validating them.
pub fn load_input(dir: impl AsRef<Path>) -> Result<TimetableInput, DataError> {
    let dir = dir.as_ref();
    let time_slots = load_time_slots(File::open(dir.join(TIME_SLOTS_FILE))?)?;
    let (days, periods) = data::grid_dims(&time_slots);
    let teachers = load_teachers(File::open(dir.join(TEACHERS_FILE))?, days, periods)?;
    let classes = load_classes(File::open(dir.join(CLASSES_FILE))?)?;
    let rooms = load_rooms(File::open(dir.join(ROOMS_FILE))?)?;

    info!(
        "Loaded {} teachers, {} classes, {} rooms and {} time slots from {}",
        teachers.len(),
        classes.len(),
        rooms.len(),
        time_slots.len(),
        dir.display()
    );
    Ok(TimetableInput {
        teachers,
        classes,
        rooms,
        time_slots,
    })
}

/// Inverse of [`parse_availability`] for a full grid.
pub fn format_availability(availability: &Availability) -> String {
    availability
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|&a| if a { "1" } else { "0" })
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<(), DataError> {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let csv_err = |source| DataError::Csv {
        file: file.clone(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the four CSV files into `dir`, creating it if needed.
pub fn write_dir(input: &TimetableInput, dir: impl AsRef<Path>) -> Result<(), DataError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    write_rows(
        &dir.join(TEACHERS_FILE),
        input.teachers.iter().map(|t| TeacherRow {
            id: t.id.clone(),
            name: t.name.clone(),
            subjects: t.subjects.iter().map(String::as_str).collect::<Vec<_>>().join(","),
            full_time: if t.full_time { "True" } else { "False" }.to_string(),
            availability: format_availability(&t.availability),
        }),
    )?;
    write_rows(
        &dir.join(CLASSES_FILE),
        input.classes.iter().map(|c| ClassRow {
            id: c.id.clone(),
            subject: c.subject.clone(),
            grade_level: c.grade_level,
            num_students: c.num_students,
            periods_per_week: c.periods_per_week,
        }),
    )?;
    write_rows(
        &dir.join(ROOMS_FILE),
        input.rooms.iter().map(|r| RoomRow {
            id: r.id.clone(),
            capacity: r.capacity,
            room_type: r.room_type.clone(),
        }),
    )?;
    write_rows(
        &dir.join(TIME_SLOTS_FILE),
        input.time_slots.iter().map(|s| TimeSlotRow {
            day: s.day,
            period: s.period,
        }),
    )?;

    info!("Wrote timetable data to {}", dir.display());
    Ok(())
}

/// Loads and validates the four CSV files in `dir`.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Timetable, DataError> {
    Timetable::try_from(load_input(dir)?)
}
