// Core history module - violation history aggregation over the report log.

pub mod history_models;
pub mod history_service;

pub use history_models::*;
pub use history_service::*;
