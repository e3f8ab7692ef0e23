use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Engineering branch a student is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Branch {
    #[serde(rename = "CS")]
    Cs,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "EXTC")]
    Extc,
    #[serde(rename = "ECS")]
    Ecs,
    #[serde(rename = "ELEC")]
    Elec,
    #[serde(rename = "Mech")]
    Mech,
}

impl Branch {
    pub const ALL: [Branch; 6] = [
        Branch::Cs,
        Branch::It,
        Branch::Extc,
        Branch::Ecs,
        Branch::Elec,
        Branch::Mech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Cs => "CS",
            Branch::It => "IT",
            Branch::Extc => "EXTC",
            Branch::Ecs => "ECS",
            Branch::Elec => "ELEC",
            Branch::Mech => "Mech",
        }
    }
}

/// Year of study: first, second, third or final year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassYear {
    #[serde(rename = "FE")]
    Fe,
    #[serde(rename = "SE")]
    Se,
    #[serde(rename = "TE")]
    Te,
    #[serde(rename = "BE")]
    Be,
}

impl ClassYear {
    pub const ALL: [ClassYear; 4] = [ClassYear::Fe, ClassYear::Se, ClassYear::Te, ClassYear::Be];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassYear::Fe => "FE",
            ClassYear::Se => "SE",
            ClassYear::Te => "TE",
            ClassYear::Be => "BE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HonoursDegree {
    None,
    #[serde(rename = "Data Science")]
    DataScience,
    #[serde(rename = "AI&ML")]
    AiMl,
    Robotics,
    #[serde(rename = "IoT")]
    Iot,
}

impl HonoursDegree {
    pub const ALL: [HonoursDegree; 5] = [
        HonoursDegree::None,
        HonoursDegree::DataScience,
        HonoursDegree::AiMl,
        HonoursDegree::Robotics,
        HonoursDegree::Iot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HonoursDegree::None => "None",
            HonoursDegree::DataScience => "Data Science",
            HonoursDegree::AiMl => "AI&ML",
            HonoursDegree::Robotics => "Robotics",
            HonoursDegree::Iot => "IoT",
        }
    }
}

/// Error returned when a string names none of an enum's variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

// Parsing is case-insensitive so `cs`, `Cs` and `CS` all name the same branch.
macro_rules! str_enum_impls {
    ($ty:ident, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

str_enum_impls!(Branch, "branch");
str_enum_impls!(ClassYear, "class");
str_enum_impls!(HonoursDegree, "honours degree");

/// The user-editable part of a student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentForm {
    pub name: String,
    pub branch: Branch,
    pub class: ClassYear,
    pub roll_no: u32,
    pub honours_degree: HonoursDegree,
    pub email: String,
}

/// A persisted student record. Serialized with the camelCase keys of the
/// storage and export format (`rollNo`, `honoursDegree`, `createdAt`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub branch: Branch,
    pub class: ClassYear,
    pub roll_no: u32,
    pub honours_degree: HonoursDegree,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentRecord {
    /// Builds a brand new record with a fresh id and both timestamps set to now.
    pub fn new(form: StudentForm) -> Self {
        let now = Utc::now();
        Self::from_form(Uuid::new_v4().to_string(), form, now, now)
    }

    pub fn from_form(
        id: String,
        form: StudentForm,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: form.name,
            branch: form.branch,
            class: form.class,
            roll_no: form.roll_no,
            honours_degree: form.honours_degree,
            email: form.email,
            created_at,
            updated_at,
        }
    }

    /// Returns the record that results from applying `form` to `self`.
    ///
    /// `id` and `created_at` are carried over. `updated_at` is set to now, but
    /// always moves strictly forward even if the wall clock did not.
    pub fn revised(&self, form: StudentForm) -> Self {
        let now = Utc::now();
        let updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
        Self::from_form(self.id.clone(), form, self.created_at, updated_at)
    }

    pub fn to_form(&self) -> StudentForm {
        StudentForm {
            name: self.name.clone(),
            branch: self.branch,
            class: self.class,
            roll_no: self.roll_no,
            honours_degree: self.honours_degree,
            email: self.email.clone(),
        }
    }
}

/// The in-memory view of the record collection handed to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordState {
    pub records: Vec<StudentRecord>,
    pub filtered_records: Vec<StudentRecord>,
    pub loading: bool,
    pub search_query: String,
}

impl RecordState {
    /// The empty state after a load or a wipe.
    pub fn ready(records: Vec<StudentRecord>) -> Self {
        Self {
            filtered_records: records.clone(),
            records,
            loading: false,
            search_query: String::new(),
        }
    }
}

impl Default for RecordState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            filtered_records: Vec::new(),
            loading: true,
            search_query: String::new(),
        }
    }
}
