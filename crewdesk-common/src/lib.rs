//! # crewdesk Common Library
//!
//! Shared code for the crewdesk service including:
//! - Worker domain model (checklist, call stats, payment info, notes)
//! - Payday and sync-interval date arithmetic
//! - Configuration loading (TOML + environment)
//! - Common error type

pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{
    CallStats, Checklist, ChecklistKey, DirectoryMember, NewWorker, Note, PaymentInfo,
    PaymentMethod, StatsCounts, Worker, WorkerPatch, WorkerRole, WorkerStatus,
};
pub use time::{DateRange, StatsInterval};
