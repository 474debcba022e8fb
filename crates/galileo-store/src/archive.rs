//! Directory of history files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use time::PrimitiveDateTime;
use tracing::{debug, info, warn};

use galileo_types::Session;

use crate::codec::{HistoricalRecord, decode_record, encode_session};
use crate::error::{Error, Result};
use crate::naming::{EXTENSION, file_name, is_plain_file_name};

/// A history directory on disk.
#[derive(Debug, Clone)]
pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    /// Open (creating if needed) the archive at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| Error::CreateDirectory {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        debug!("Opened history archive at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Open the archive at the platform default location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_history_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `session` and return the new file's name.
    ///
    /// An existing file with the same name is overwritten.
    pub fn save(&self, session: &Session, captured_at: PrimitiveDateTime) -> Result<String> {
        if session.is_empty() {
            return Err(Error::EmptySession);
        }

        let name = file_name(captured_at, session.equipment(), session.tag());
        let path = self.dir.join(&name);
        if path.exists() {
            warn!("Overwriting {}", path.display());
        }

        let file = File::create(&path)?;
        encode_session(session, BufWriter::new(file))?;

        info!("Saved {} samples to {}", session.len(), name);
        Ok(name)
    }

    /// Names of all history files, most recently modified first.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut entries: Vec<(SystemTime, String)> = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.ends_with(EXTENSION) {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, name));
        }

        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries.into_iter().map(|(_, name)| name).collect())
    }

    /// Decode one history file by name.
    pub fn load(&self, name: &str) -> Result<HistoricalRecord> {
        if !is_plain_file_name(name) {
            return Err(Error::InvalidFileName(name.to_string()));
        }

        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(Error::NotFound(name.to_string()));
        }

        let file = File::open(&path)?;
        let record = decode_record(name, BufReader::new(file))?;
        debug!("Loaded {} samples from {}", record.session.len(), name);
        Ok(record)
    }

    /// Decode every history file. A broken file yields an error in its own
    /// slot and does not affect the others.
    pub fn scan(&self) -> Result<Vec<(String, Result<HistoricalRecord>)>> {
        let names = self.list()?;
        Ok(names
            .into_iter()
            .map(|name| {
                let result = self.load(&name);
                if let Err(e) = &result {
                    warn!("Skipping {}: {}", name, e);
                }
                (name, result)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galileo_types::SampleRecord;
    use tempfile::TempDir;
    use time::macros::datetime;

    fn session(equipment: &str, tag: &str) -> Session {
        Session::new(
            equipment,
            vec![
                SampleRecord::new(datetime!(2024-01-01 0:00), 5.0, 60.0),
                SampleRecord::new(datetime!(2024-01-01 0:15), 5.5, 61.0),
            ],
        )
        .with_tag(tag)
    }

    fn archive() -> (TempDir, Archive) {
        let dir = TempDir::new().unwrap();
        let archive = Archive::open(dir.path().join("historial_lecturas")).unwrap();
        (dir, archive)
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_open_creates_directory() {
        let (_dir, archive) = archive();
        assert!(archive.dir().is_dir());
    }

    #[test]
    fn test_save_and_load() {
        let (_dir, archive) = archive();
        let original = session("HELADERA", "LAB1");

        let name = archive
            .save(&original, datetime!(2024-02-03 04:05:06))
            .unwrap();
        assert_eq!(name, "2024-02-03__04-05-06__HELADERA__LAB1.csv");

        let record = archive.load(&name).unwrap();
        assert_eq!(record.session, original);
    }

    #[test]
    fn test_empty_session_is_not_saved() {
        let (_dir, archive) = archive();
        let err = archive
            .save(&Session::new("HELADERA", vec![]), datetime!(2024-01-01 0:00))
            .unwrap_err();
        assert!(matches!(err, Error::EmptySession));
        assert!(archive.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_newest_first_and_csv_only() {
        let (_dir, archive) = archive();
        let old = archive
            .save(&session("FREEZER", ""), datetime!(2024-01-01 0:00))
            .unwrap();
        let new = archive
            .save(&session("HELADERA", ""), datetime!(2023-01-01 0:00))
            .unwrap();
        fs::write(archive.dir().join("notes.txt"), "x").unwrap();

        set_mtime(&archive.dir().join(&old), 1_000);
        set_mtime(&archive.dir().join(&new), 2_000);

        assert_eq!(archive.list().unwrap(), vec![new, old]);
    }

    #[test]
    fn test_load_rejects_paths() {
        let (_dir, archive) = archive();
        assert!(matches!(
            archive.load("../x.csv"),
            Err(Error::InvalidFileName(_))
        ));
        assert!(matches!(
            archive.load("missing.csv"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_scan_isolates_broken_files() {
        let (_dir, archive) = archive();
        let good = archive
            .save(&session("HELADERA", "A"), datetime!(2024-01-01 0:00))
            .unwrap();
        fs::write(
            archive.dir().join("2024-01-02__00-00-00__FREEZER.csv"),
            "Fecha;Temperatura;Humedad\nnot-a-date;1.0;2.0\n",
        )
        .unwrap();

        let results = archive.scan().unwrap();
        assert_eq!(results.len(), 2);

        let ok: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].0, good);

        let (bad_name, bad) = results.iter().find(|(_, r)| r.is_err()).unwrap();
        assert_eq!(bad_name, "2024-01-02__00-00-00__FREEZER.csv");
        assert!(matches!(bad, Err(Error::InvalidTimestamp { row: 2, .. })));
    }
}
