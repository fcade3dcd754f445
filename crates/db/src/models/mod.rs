//! Database models for the record portal.

pub mod announcement;
pub mod designation;
pub mod file_record;
pub mod task;
