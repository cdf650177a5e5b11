//! JSONL file store for the audit journal.
//!
//! Each [`JournalEntry`] is serialized as a single JSON line and appended to
//! the file for the current UTC day (`journal-YYYY-MM-DD.jsonl`). The file is
//! opened in append mode for every write and synced before `append`
//! returns, so there is no buffered state to lose and no lock to hold.
//!
//! A line torn by a killed writer is terminated before the next record goes
//! out, and the reader skips anything that is not valid UTF-8 JSON.

use chrono::{NaiveDate, Utc};
use mender_application::ports::journal::{AuditJournal, JournalError};
use mender_domain::JournalEntry;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FILE_PREFIX: &str = "journal-";
const FILE_SUFFIX: &str = ".jsonl";

/// Append-only JSONL journal rooted at one directory
pub struct JsonlJournal {
    dir: PathBuf,
}

impl JsonlJournal {
    /// Create a journal in `dir`, creating the directory if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, JournalError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| JournalError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// `<data_local_dir>/mender/journal`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("mender").join("journal"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding entries written on `day`
    pub fn file_for(&self, day: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", FILE_PREFIX, day.format("%Y-%m-%d"), FILE_SUFFIX))
    }

    /// Journal files in name (and therefore date) order
    pub fn files(&self) -> Result<Vec<PathBuf>, JournalError> {
        let read_dir = std::fs::read_dir(&self.dir).map_err(|source| JournalError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_file(path: &Path, entries: &mut Vec<JournalEntry>) -> Result<(), JournalError> {
        let file = File::open(path).map_err(|source| JournalError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        for (number, raw) in BufReader::new(file).split(b'\n').enumerate() {
            let raw = raw.map_err(|source| JournalError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    warn!(
                        "Skipping non-UTF-8 journal line {}:{}: {}",
                        path.display(),
                        number + 1,
                        e
                    );
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    "Skipping malformed journal line {}:{}: {}",
                    path.display(),
                    number + 1,
                    e
                ),
            }
        }
        Ok(())
    }
}

/// True for an empty file or one whose last byte is a newline
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl AuditJournal for JsonlJournal {
    fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        let line = serde_json::to_string(entry)?;
        let path = self.file_for(Utc::now().date_naive());
        let io_err = |source: std::io::Error| JournalError::Io {
            path: path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;

        let mut record = String::with_capacity(line.len() + 2);
        if !ends_with_newline(&mut file).map_err(io_err)? {
            warn!("{} ends in a partial line; terminating it", path.display());
            record.push('\n');
        }
        record.push_str(&line);
        record.push('\n');

        // One write per record keeps each line whole
        file.write_all(record.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.sync_data().map_err(io_err)?;

        debug!(
            "Journaled {} {} for session {}",
            entry.tool_name, entry.outcome, entry.session_id
        );
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = Vec::new();
        for path in self.files()? {
            Self::read_file(&path, &mut entries)?;
        }
        Ok(entries)
    }
}
