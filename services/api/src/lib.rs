//! services/api/src/lib.rs
//!
//! The `api` service: storage adapters, configuration and the HTTP layer around
//! the note access controller from `doodle_notes_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
