mod entry;
mod log;

pub use entry::HistoryEntry;
pub use log::HistoryLog;
