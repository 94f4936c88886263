//! SQL and row types for each table
//!
//! Queries are checked at runtime (`sqlx::query` / `query_as`), so the crate
//! builds without a live database.

pub mod policy_records;
pub mod enquiries;

pub use policy_records::{PolicyRecordRepository, PolicyRecordRow};
pub use enquiries::{ContactMessageRow, EnquiryRepository, InquiryRow};
