pub mod session_models;

pub use session_models::*;
