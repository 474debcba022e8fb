//! CSV history archive for Galileo datalogger sessions.
//!
//! Every download can be saved as one semicolon-delimited file in a
//! history directory, then listed and loaded back later.
//!
//! # Features
//!
//! - Encode sessions with a metadata row and column header
//! - Decode both the current layout and legacy files without a metadata row
//! - Recover equipment and tag from the file name
//! - Per-file error isolation when scanning a whole directory
//!
//! # Example
//!
//! ```no_run
//! use galileo_store::Archive;
//!
//! let archive = Archive::open_default()?;
//! for name in archive.list()? {
//!     let record = archive.load(&name)?;
//!     println!("{}: {} samples", name, record.session.len());
//! }
//! # Ok::<(), galileo_store::Error>(())
//! ```

pub mod archive;
pub mod codec;
mod error;
pub mod naming;

pub use archive::Archive;
pub use codec::{HistoricalRecord, RecordVariant, decode_record, encode_session, format_decimal};
pub use error::{Error, Result};
pub use naming::{FileNameParts, file_name, parse_file_name, sanitize_segment};

/// Default history directory following platform conventions.
///
/// - Linux: `~/.local/share/galileo/historial_lecturas`
/// - macOS: `~/Library/Application Support/galileo/historial_lecturas`
/// - Windows: `C:\Users\<user>\AppData\Local\galileo\historial_lecturas`
pub fn default_history_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("galileo")
        .join("historial_lecturas")
}
