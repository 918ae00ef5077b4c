//! Append-only CSV table of expense entries.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
    str::FromStr,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    errors::Error,
    ledger::types::{Entry, DATE_FORMAT},
    Result,
};

pub const HEADER: [&str; 3] = ["date", "amount", "description"];

/// Header written by the first deployment; same columns, same order.
const LEGACY_HEADER: [&str; 3] = ["data", "valor", "descricao"];

#[derive(Debug, Deserialize)]
struct RawRow {
    date: String,
    amount: String,
    description: String,
}

/// The ledger table on disk.
///
/// One instance per table, shared behind an `Arc`. Writers (`append`, `reset`,
/// `ensure_initialized`) hold the lock exclusively, so a scan never observes a
/// half-written row or a missing header.
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the table with its header if it does not exist yet.
    ///
    /// Returns `true` when the table was created (or an empty file was given
    /// its header), `false` when it already held data.
    pub fn ensure_initialized(&self) -> Result<bool> {
        let _guard = self.write_guard();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if fs::metadata(&self.path)?.len() > 0 {
                    return Ok(false);
                }
                info!(path = %self.path.display(), "ledger file is empty, writing header");
                OpenOptions::new().append(true).open(&self.path)?
            }
            Err(e) => return Err(Error::StoreIo(e)),
        };

        file.write_all(&encode_row(HEADER)?)?;
        file.sync_all()?;
        info!(path = %self.path.display(), "ledger initialized");
        Ok(true)
    }

    /// Append one entry with a single write + flush.
    pub fn append(&self, entry: &Entry) -> Result<()> {
        let date = entry.date.format(DATE_FORMAT).to_string();
        let amount = entry.amount.to_string();
        let row = encode_row([date.as_str(), amount.as_str(), entry.description.as_str()])?;

        let _guard = self.write_guard();

        // Keep the header invariant even if the table vanished since startup.
        let needs_header = match fs::metadata(&self.path) {
            Ok(md) => md.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(Error::StoreIo(e)),
        };
        let mut buf = if needs_header {
            encode_row(HEADER)?
        } else {
            Vec::new()
        };
        buf.extend_from_slice(&row);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&buf)?;
        file.sync_data()?;

        debug!(date = %date, amount = %amount, "ledger entry appended");
        Ok(())
    }

    /// Every entry in append order.
    pub fn scan(&self) -> Result<Vec<Entry>> {
        let _guard = self.read_guard();

        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::StoreNotFound(self.path.clone()))
            }
            Err(e) => return Err(Error::StoreIo(e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(BufReader::new(file));

        let header = reader.headers().map_err(|e| csv_read_error(e, 1))?;
        let header: Vec<&str> = header.iter().map(str::trim).collect();
        if header != HEADER && header != LEGACY_HEADER {
            return Err(Error::StoreCorrupt {
                line: 1,
                reason: format!("unexpected header {header:?}"),
            });
        }

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                csv_read_error(e, line)
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let raw: RawRow = record
                .deserialize(None)
                .map_err(|e| corrupt(line, e.to_string()))?;
            entries.push(parse_row(raw, line)?);
        }

        Ok(entries)
    }

    /// Replace the table with a header-only one. Prior entries are gone.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.write_guard();

        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&encode_row(HEADER)?)?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::StoreIo(e));
        }

        info!(path = %self.path.display(), "ledger reset");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    // The guarded state is the file; poisoning carries no meaning here.
    fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn encode_row(fields: [&str; 3]) -> Result<Vec<u8>> {
    let mut w = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    w.write_record(fields).map_err(csv_write_error)?;
    w.into_inner()
        .map_err(|e| Error::StoreIo(io::Error::new(e.error().kind(), e.error().to_string())))
}

fn parse_row(raw: RawRow, line: u64) -> Result<Entry> {
    let date = NaiveDate::parse_from_str(raw.date.trim(), DATE_FORMAT)
        .map_err(|e| corrupt(line, format!("invalid date {:?}: {e}", raw.date)))?;
    let amount = parse_stored_amount(&raw.amount)
        .ok_or_else(|| corrupt(line, format!("invalid amount {:?}", raw.amount)))?;

    Ok(Entry {
        date,
        amount,
        description: raw.description,
    })
}

/// Stored amounts are plain decimals; older rows may carry a float repr such
/// as `25.0` or `1e-05`.
fn parse_stored_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn corrupt(line: u64, reason: String) -> Error {
    Error::StoreCorrupt { line, reason }
}

fn csv_read_error(e: csv::Error, line: u64) -> Error {
    if e.is_io_error() {
        if let csv::ErrorKind::Io(io) = e.into_kind() {
            return Error::StoreIo(io);
        }
        return Error::StoreIo(io::Error::other("csv i/o error"));
    }
    corrupt(line, e.to_string())
}

fn csv_write_error(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => Error::StoreIo(io),
        other => Error::StoreIo(io::Error::other(format!("{other:?}"))),
    }
}
