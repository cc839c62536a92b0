// Discord layer - commands, button handlers and the appeal notifier.

use crate::core::appeals::AppealService;
use crate::core::history::HistoryService;
use crate::infra::appeals::SqliteAppealStore;
use crate::infra::reports::SqliteReportLedger;
use std::sync::Arc;

#[path = "appeals/mod.rs"]
pub mod appeals;

#[path = "commands/command_catalog.rs"]
pub mod commands;

/// Shared state handed to every command and event.
pub struct Data {
    pub appeals: Arc<AppealService<SqliteAppealStore>>,
    pub history: Arc<HistoryService<SqliteReportLedger>>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
