use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "rollbook")]
#[command(about = "Keep student records in a local JSON store", long_about = None)]
#[command(version, long_version = LONG_VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding records, theme and config
    #[arg(long, global = true, env = "ROLLBOOK_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Record fields as typed on the command line. All optional so `edit`
/// can change just one of them.
#[derive(Args, Debug, Clone, Default)]
pub struct RecordFields {
    /// Full name (3-50 characters)
    #[arg(long)]
    pub name: Option<String>,

    /// CS, IT, EXTC, ECS, ELEC or Mech
    #[arg(long)]
    pub branch: Option<String>,

    /// FE, SE, TE or BE
    #[arg(long)]
    pub class: Option<String>,

    /// Roll number (positive, unique)
    #[arg(long = "roll")]
    pub roll_no: Option<String>,

    /// None, "Data Science", AI&ML, Robotics or IoT
    #[arg(long = "honours")]
    pub honours_degree: Option<String>,

    /// College email address
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List students
    #[command(alias = "ls")]
    List {
        /// Only show students matching this text
        #[arg(short, long)]
        search: Option<String>,

        /// Column to sort by: name, roll, email, branch, class, created
        #[arg(long, default_value = "name")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Write the listed rows to student_records.csv instead of printing them
        #[arg(long)]
        csv: bool,
    },

    /// Add a student
    #[command(alias = "n")]
    Add {
        #[command(flatten)]
        fields: RecordFields,
    },

    /// Change fields of a student
    #[command(alias = "e")]
    Edit {
        /// Student id (or a unique prefix of it)
        id: String,

        #[command(flatten)]
        fields: RecordFields,
    },

    /// Show one student
    #[command(alias = "v")]
    View {
        /// Student id (or a unique prefix of it)
        id: String,
    },

    /// Delete a student
    #[command(alias = "rm")]
    Delete {
        /// Student id (or a unique prefix of it)
        id: String,
    },

    /// Search students by name, email, roll number, branch or class
    Search { query: String },

    /// Delete every student record
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Export all records
    Export {
        #[arg(value_enum)]
        format: ExportFormat,

        /// Output directory (defaults to the configured export dir, then the current dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replace all records with the contents of a JSON export
    Import { file: PathBuf },

    /// Show or change the colour theme
    Theme {
        /// light, dark or toggle
        value: Option<String>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g., max-import-bytes)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}
