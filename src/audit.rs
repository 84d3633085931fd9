use std::{
    fmt,
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{account::Account, command::MovementKind};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to write audit log `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Receives one call per successful balance mutation, after the mutation
/// has been applied.
pub trait AuditRecorder {
    fn record_movement(
        &mut self,
        account: &Account,
        kind: MovementKind,
        amount: Decimal,
    ) -> Result<(), AuditError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: NaiveDateTime,
    pub holder: String,
    pub routing_code: u32,
    pub kind: MovementKind,
    pub amount: Decimal,
}

impl AuditEntry {
    pub fn now(account: &Account, kind: MovementKind, amount: Decimal) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            holder: account.full_name(),
            routing_code: account.routing_code(),
            kind,
            amount,
        }
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({}) [{}] ${:.2}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.holder,
            self.routing_code,
            self.kind,
            self.amount
        )
    }
}

/// Append-only movement log backed by a file.
///
/// Every record opens the file, appends one line and closes it again, so no
/// handle is held between operations. Hosts that share a log between threads
/// must serialize calls themselves.
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        writeln!(file, "{entry}").map_err(|source| self.io_error(source))
    }

    /// Truncates the log. This is the only operation that removes entries.
    pub fn clear(&self) -> Result<(), AuditError> {
        File::create(&self.path)
            .map(drop)
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> AuditError {
        AuditError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl AuditRecorder for FileAuditLog {
    fn record_movement(
        &mut self,
        account: &Account,
        kind: MovementKind,
        amount: Decimal,
    ) -> Result<(), AuditError> {
        self.append(&AuditEntry::now(account, kind, amount))
    }
}

/// Keeps entries in memory, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    pub entries: Vec<AuditEntry>,
}

impl AuditRecorder for MemoryAuditLog {
    fn record_movement(
        &mut self,
        account: &Account,
        kind: MovementKind,
        amount: Decimal,
    ) -> Result<(), AuditError> {
        self.entries.push(AuditEntry::now(account, kind, amount));
        Ok(())
    }
}
