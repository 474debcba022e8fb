//! Command-line interface for Galileo temperature/humidity dataloggers.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `download` | Download the stored session over the serial port |
//! | `history` | List and show saved sessions |
//! | `equipment` | Show the equipment catalog and its limits |
//! | `ports` | List serial ports |
//! | `config` | Manage CLI configuration |
//!
//! # Configuration
//!
//! The CLI stores configuration in `~/.config/galileo/config.toml` (or
//! platform equivalent): serial port, baud rate, history directory,
//! default equipment, protocol timing and an optional equipment catalog.
//!
//! # Environment Variables
//!
//! - `GALILEO_PORT`: Serial port (overridden by `--port`)
//! - `NO_COLOR`: Disable colored output when set
//! - `RUST_LOG`: Log filter when neither `--verbose` nor `--quiet` is given
//!
//! # Examples
//!
//! ```bash
//! galileo download --port /dev/ttyUSB0 --equipment FREEZER --tag LAB1
//! galileo history list
//! galileo history show 2024-03-15__14-30-05__FREEZER__LAB1.csv --format json
//! ```

// Re-export the library crates for programmatic use.
pub use galileo_core;
pub use galileo_store;
pub use galileo_types;
