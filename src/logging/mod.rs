//! Logging infrastructure for structured console and run-log output.

mod logger;
mod memory;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use memory::{LogEntry, MemoryLog};
pub use subscriber::init_subscriber;
pub use types::{Level, Log};
pub use utils::{LOG_DIR_ENV, run_log_name};
