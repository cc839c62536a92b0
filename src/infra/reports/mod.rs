// Report ledger implementations (read-only access to the report log).

#[cfg(test)]
pub mod in_memory;
pub mod sqlite_ledger;

#[cfg(test)]
pub use in_memory::InMemoryReportLedger;
pub use sqlite_ledger::SqliteReportLedger;
