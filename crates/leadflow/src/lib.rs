//! Lead capture and CRM relay engine for the marketing site backend.
//!
//! The crate owns the pure decision logic (quality scoring and analytics
//! rollups) plus the trait seams through which the HTTP layer reaches
//! storage, email notification, and CRM delivery collaborators.

pub mod config;
pub mod error;
pub mod leads;
pub mod telemetry;
