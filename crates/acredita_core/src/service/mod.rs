//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and sequencing into use-case level APIs.
//! - Keep callers decoupled from storage details.

pub mod outcome_service;
pub mod subject_outcome_service;
