use super::mem_backend::MemBackend;
use super::RecordTable;

pub type InMemoryTable = RecordTable<MemBackend>;

impl Default for InMemoryTable {
    fn default() -> Self {
        Self::new(MemBackend::new())
    }
}

impl InMemoryTable {
    pub fn in_memory() -> Self {
        Self::default()
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{Branch, ClassYear, HonoursDegree, StudentForm, StudentRecord};
    use chrono::{DateTime, Utc};

    fn stamp(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    /// `John Doe`, roll 101, CS/FE, id `1`.
    pub fn john() -> StudentRecord {
        StudentRecord {
            id: "1".into(),
            name: "John Doe".into(),
            branch: Branch::Cs,
            class: ClassYear::Fe,
            roll_no: 101,
            honours_degree: HonoursDegree::None,
            email: "john.doe@example.com".into(),
            created_at: stamp("2023-01-01T00:00:00Z"),
            updated_at: stamp("2023-01-01T00:00:00Z"),
        }
    }

    /// `Jane Smith`, roll 102, IT/SE, id `2`.
    pub fn jane() -> StudentRecord {
        StudentRecord {
            id: "2".into(),
            name: "Jane Smith".into(),
            branch: Branch::It,
            class: ClassYear::Se,
            roll_no: 102,
            honours_degree: HonoursDegree::AiMl,
            email: "jane.smith@example.com".into(),
            created_at: stamp("2023-01-02T00:00:00Z"),
            updated_at: stamp("2023-01-02T00:00:00Z"),
        }
    }

    pub fn form(name: &str, roll_no: u32) -> StudentForm {
        StudentForm {
            name: name.to_string(),
            branch: Branch::Cs,
            class: ClassYear::Fe,
            roll_no,
            honours_degree: HonoursDegree::None,
            email: "t@x.com".to_string(),
        }
    }

    pub struct TableFixture {
        pub table: InMemoryTable,
    }

    impl Default for TableFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TableFixture {
        pub fn new() -> Self {
            Self {
                table: InMemoryTable::in_memory(),
            }
        }

        /// Adds [`john`] and [`jane`], in that order.
        pub fn with_sample(self) -> Self {
            self.with_record(john()).with_record(jane())
        }

        pub fn with_record(self, record: StudentRecord) -> Self {
            self.table.add(&record).unwrap();
            self
        }

        pub fn with_records(mut self, count: u32) -> Self {
            for i in 0..count {
                let record = StudentRecord::new(form(&format!("Student {}", i + 1), 200 + i));
                self = self.with_record(record);
            }
            self
        }
    }
}
