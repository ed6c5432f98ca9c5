pub mod logger;
pub mod record;

pub use logger::{StorageLogger, StorageState, WriteOutcome};
pub use record::LogRecord;
