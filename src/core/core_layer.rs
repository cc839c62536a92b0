// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "appeals/mod.rs"]
pub mod appeals;

#[path = "history/mod.rs"]
pub mod history;

#[path = "sessions/mod.rs"]
pub mod sessions;
