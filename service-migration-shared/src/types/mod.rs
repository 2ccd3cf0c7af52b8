//! Core data structures used across the migration pipeline.

pub mod availability;
pub mod canonical;
pub mod legacy_record;
pub mod metadata;
pub mod version_history;
