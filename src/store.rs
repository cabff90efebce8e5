use std::{
    fs::{self, File, create_dir_all},
    io::{BufReader, BufWriter, ErrorKind, Read, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tracing::{debug, info, warn};

use crate::{
    Entry, Ledger,
    entry::canonical_timestamp,
    error::StoreError,
};

/// Default file name of the persisted ledger.
pub const DEFAULT_FILE: &str = "blockchain.json";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One entry as it appears in the persisted document.
///
/// Field names are the on-disk contract. The amount keeps the exact decimal
/// text as a JSON number, so large values survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub index: u64,
    pub timestamp: String,
    pub description: String,
    pub amount: Number,
    pub previous_hash: String,
    pub hash: String,
}

impl From<&Entry> for EntryRecord {
    fn from(entry: &Entry) -> Self {
        EntryRecord {
            index: entry.sequence_number(),
            timestamp: canonical_timestamp(&entry.timestamp()),
            description: entry.description().to_string(),
            amount: Number::from_str(&entry.amount().to_string())
                .expect("Decimal text is a valid JSON number"),
            previous_hash: entry.previous_hash().to_string(),
            hash: entry.content_hash().to_string(),
        }
    }
}

impl EntryRecord {
    /// Rebuilds the entry, trusting the stored hash.
    ///
    /// `position` is only used to point at the record in error messages.
    pub fn into_entry(self, position: usize) -> Result<Entry, StoreError> {
        let invalid = |reason: String| StoreError::InvalidRecord {
            index: position,
            reason,
        };
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| invalid(format!("bad timestamp {:?}: {e}", self.timestamp)))?
            .with_timezone(&Utc);
        let text = self.amount.to_string();
        let amount = Decimal::from_str_exact(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|e| invalid(format!("bad amount {text}: {e}")))?;
        Ok(Entry::from_stored(
            self.index,
            timestamp,
            &self.description,
            amount,
            &self.previous_hash,
            &self.hash,
        ))
    }
}

/// Reads and writes a ledger as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    compression: Option<Compression>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            compression: None,
        }
    }

    /// Gzip the document on save. Loading detects compression by itself.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted ledger, or a fresh one when there is nothing usable.
    ///
    /// A missing file, or one that cannot be read or decoded as a document at
    /// all, falls back to [`Ledger::create`]. A document that decodes but holds
    /// records that do not convert is an error, since it may be tampered with.
    pub fn load(&self) -> Result<Ledger, StoreError> {
        match self.try_load() {
            Ok(Some(ledger)) => Ok(ledger),
            Ok(None) => {
                info!(path = ?self.path, "no ledger found, starting a new one");
                Ok(Ledger::create())
            }
            Err(error @ (StoreError::Io { .. } | StoreError::Json { .. })) => {
                warn!(path = ?self.path, %error, "could not read ledger, starting a new one");
                Ok(Ledger::create())
            }
            Err(error) => Err(error),
        }
    }

    /// Strict load: `Ok(None)` when the file does not exist, errors otherwise.
    pub fn try_load(&self) -> Result<Option<Ledger>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        let bytes = read_maybe_gzipped(file).map_err(|e| self.io_error(e))?;
        let records: Vec<EntryRecord> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        let entries = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| record.into_entry(position))
            .collect::<Result<Vec<_>, _>>()?;
        let ledger = Ledger::from_entries(entries)?;
        debug!(path = ?self.path, entries = ledger.len(), "loaded ledger");
        Ok(Some(ledger))
    }

    /// Overwrites the persisted ledger.
    ///
    /// Writes to a sibling temporary file first and renames it into place.
    pub fn save(&self, ledger: &Ledger) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let records: Vec<EntryRecord> = ledger.entries().iter().map(EntryRecord::from).collect();

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        self.write_document(&tmp_path, &records)?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;
        debug!(path = ?self.path, entries = records.len(), "saved ledger");
        Ok(())
    }

    fn write_document(&self, path: &Path, records: &[EntryRecord]) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = BufWriter::new(File::create(path).map_err(io_error)?);
        let mut output = match self.compression {
            Some(level) => {
                let mut encoder = GzEncoder::new(file, level);
                write_json(&mut encoder, records, path)?;
                encoder.finish().map_err(io_error)?
            }
            None => {
                let mut file = file;
                write_json(&mut file, records, path)?;
                file
            }
        };
        output.flush().map_err(io_error)?;
        output
            .into_inner()
            .map_err(|e| io_error(e.into_error()))?
            .sync_all()
            .map_err(io_error)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Pretty-prints the records with four space indentation.
fn write_json<W: Write>(
    mut output: W,
    records: &[EntryRecord],
    path: &Path,
) -> Result<(), StoreError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut output, formatter);
    records
        .serialize(&mut serializer)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    output.write_all(b"\n").map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the whole file, decompressing it when it starts with a gzip header.
fn read_maybe_gzipped<R: Read>(reader: R) -> std::io::Result<Vec<u8>> {
    let mut raw = Vec::new();
    BufReader::new(reader).read_to_end(&mut raw)?;
    if !raw.starts_with(&GZIP_MAGIC) {
        return Ok(raw);
    }
    let mut decoded = Vec::new();
    GzDecoder::new(&raw[..]).read_to_end(&mut decoded)?;
    Ok(decoded)
}
