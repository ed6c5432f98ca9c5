/// Append-only CSV log on the removable storage medium
///
/// The logger never returns an error to the acquisition loop. A missing medium
/// leaves it `Unavailable` and every later call is a no-op; a write failure in
/// the middle of a run degrades it to `Unavailable` for the rest of the run.
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::error::StorageError;
use crate::models::SensorPacket;
use crate::sensors::RtcDateTime;
use crate::storage::record::LogRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageState {
    Uninitialized,
    Available,
    Unavailable,
}

/// Result of a log operation, as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Nothing was attempted: the medium is unavailable or no log is open
    Skipped,
    /// The write failed and the logger is now unavailable
    Degraded,
}

pub struct StorageLogger {
    mount_point: PathBuf,
    state: StorageState,
    log_path: Option<PathBuf>,
}

impl StorageLogger {
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        StorageLogger {
            mount_point: mount_point.into(),
            state: StorageState::Uninitialized,
            log_path: None,
        }
    }

    pub fn state(&self) -> StorageState {
        self.state
    }

    /// Path of the log opened by `create_log`, if any
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Check that the medium is present. May be retried after a failure.
    pub fn init(&mut self) -> StorageState {
        self.state = match self.try_mount() {
            Ok(()) => {
                info!("Storage medium ready at {}", self.mount_point.display());
                StorageState::Available
            }
            Err(e) => {
                warn!("Storage unavailable, logging disabled: {}", e);
                StorageState::Unavailable
            }
        };
        self.state
    }

    fn try_mount(&self) -> Result<(), StorageError> {
        match std::fs::metadata(&self.mount_point) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StorageError::MediumMissing(self.mount_point.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::MediumMissing(self.mount_point.clone()))
            }
            Err(source) => Err(StorageError::Io {
                path: self.mount_point.clone(),
                source,
            }),
        }
    }

    /// Open `logs_YYYYMMDD_HHMMSS.csv` and write the header row
    pub fn create_log(&mut self, started: &RtcDateTime) -> WriteOutcome {
        if self.state != StorageState::Available {
            debug!("Skipping log creation, storage is {:?}", self.state);
            return WriteOutcome::Skipped;
        }

        let path = self
            .mount_point
            .join(format!("logs_{}.csv", started.file_stamp()));

        match Self::write_header(&path) {
            Ok(()) => {
                info!("Logging to {}", path.display());
                self.log_path = Some(path);
                WriteOutcome::Written
            }
            Err(e) => {
                self.degrade(e);
                WriteOutcome::Degraded
            }
        }
    }

    fn write_header(path: &Path) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::create(path).map_err(io_err)?;
        writeln!(file, "{}", LogRecord::header()).map_err(io_err)?;
        file.sync_data().map_err(io_err)
    }

    /// Append one row for `packet`
    pub fn append(&mut self, packet: &SensorPacket) -> WriteOutcome {
        if self.state != StorageState::Available {
            return WriteOutcome::Skipped;
        }
        let Some(path) = self.log_path.clone() else {
            warn!("Cannot append: {}", StorageError::NoLogFile);
            return WriteOutcome::Skipped;
        };

        match Self::write_row(&path, &LogRecord::from_packet(packet)) {
            Ok(()) => WriteOutcome::Written,
            Err(e) => {
                self.degrade(e);
                WriteOutcome::Degraded
            }
        }
    }

    fn write_row(path: &Path, record: &LogRecord) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };
        // No create: a vanished file means the medium went away
        let mut file = OpenOptions::new().append(true).open(path).map_err(io_err)?;
        writeln!(file, "{}", record.as_str()).map_err(io_err)
    }

    fn degrade(&mut self, e: StorageError) {
        error!("Storage write failed, logging disabled for this run: {}", e);
        self.state = StorageState::Unavailable;
    }
}
