//! Command implementations for the CLI.

mod config;
mod download;
mod equipment;
mod history;
mod ports;

pub use config::cmd_config;
pub use download::{DownloadArgs, DownloadReport, cmd_download};
pub use equipment::cmd_equipment;
pub use history::cmd_history;
pub use ports::cmd_ports;
