//! # Rollbook Architecture
//!
//! Rollbook is a **UI-agnostic student records library**. The `rollbook`
//! binary is one client of it; a desktop or web front end would be another.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, prints records and notifications       │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Record Store (records.rs) + Import/Export (transfer.rs)    │
//! │  - In-memory state, observers, notifications                │
//! │  - Commands return bool and never panic                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Persistence (store/)                                       │
//! │  - RecordTable: one JSON array under one key                │
//! │  - StorageBackend: FsBackend (production), MemBackend       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation (`validation.rs`) and sorting (`sort.rs`) are pure helpers
//! used by clients on the way in and on the way out.
//!
//! ## Wiring
//!
//! There is no global instance. A client builds one backend, one
//! [`store::RecordTable`], one [`notify::ToastQueue`] and one
//! [`records::RecordStore`] at startup and passes them where needed:
//!
//! ```
//! use rollbook::notify::ToastQueue;
//! use rollbook::records::RecordStore;
//! use rollbook::store::{mem_backend::MemBackend, RecordTable};
//!
//! let toasts = ToastQueue::default();
//! let mut store = RecordStore::new(RecordTable::new(MemBackend::new()), toasts.clone());
//! store.load();
//! assert!(!store.loading());
//! assert!(store.records().is_empty());
//! ```
//!
//! ## Module Overview
//!
//! - [`model`]: `StudentRecord`, `StudentForm`, `RecordState` and the field enums
//! - [`store`]: storage backends and the record table
//! - [`records`]: the reactive record store
//! - [`transfer`]: JSON/CSV export and JSON import
//! - [`validation`]: form rules and error messages
//! - [`notify`]: notifications
//! - [`sort`]: column sorting
//! - [`theme`]: light/dark preference
//! - [`config`]: configuration file
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod records;
pub mod sort;
pub mod store;
pub mod theme;
pub mod transfer;
pub mod validation;
