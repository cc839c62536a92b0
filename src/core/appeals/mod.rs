// Core appeals module - the appeal lifecycle engine.
// Submission, case ids and exactly-once decisions.

pub mod appeal_models;
pub mod appeal_service;
pub mod case_ids;

pub use appeal_models::*;
pub use appeal_service::*;
