//! Roster use-case services.
//!
//! # Responsibility
//! - Give presentation collaborators one serialized entry point.
//! - Own wall-clock capture so each operation reads "now" once.

pub mod roster_service;
