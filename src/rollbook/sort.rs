//! Column sorting for record listings.
//!
//! Sorting is a view concern: it never touches the store, it reorders a
//! copy of whatever list the caller hands in (usually the filtered records).

use crate::model::StudentRecord;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    RollNo,
    Email,
    Branch,
    Class,
    CreatedAt,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "roll" | "rollno" | "roll-no" => Ok(SortField::RollNo),
            "email" => Ok(SortField::Email),
            "branch" => Ok(SortField::Branch),
            "class" => Ok(SortField::Class),
            "created" | "createdat" | "created-at" => Ok(SortField::CreatedAt),
            other => Err(format!("Unknown sort field: {}", other)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortField::Name => "name",
            SortField::RollNo => "roll",
            SortField::Email => "email",
            SortField::Branch => "branch",
            SortField::Class => "class",
            SortField::CreatedAt => "created",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Clicking the active column flips direction; another column starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        if field == self.field {
            self.direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }
}

// String columns compare by their text, case-sensitively.
fn compare(a: &StudentRecord, b: &StudentRecord, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::RollNo => a.roll_no.cmp(&b.roll_no),
        SortField::Email => a.email.cmp(&b.email),
        SortField::Branch => a.branch.as_str().cmp(b.branch.as_str()),
        SortField::Class => a.class.as_str().cmp(b.class.as_str()),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

/// Returns a sorted copy. Ties keep their input order in both directions.
pub fn sort_records(records: &[StudentRecord], sort: SortState) -> Vec<StudentRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}
