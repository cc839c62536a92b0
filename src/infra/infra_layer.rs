// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "appeals/mod.rs"]
pub mod appeals;

#[path = "reports/mod.rs"]
pub mod reports;

#[path = "sessions/mod.rs"]
pub mod sessions;
