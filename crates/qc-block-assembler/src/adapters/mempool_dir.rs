//! Transaction source backed by a directory of JSON files
//!
//! Every `*.json` file holds one transaction. Files are read in file-name
//! order. A record without a `txid` field is identified by its file stem.
//!
//! Amounts may be integers or whole-number floats (`1000.0`). A file that
//! does not decode, e.g. an output without `value` or a fractional amount,
//! is skipped with a warning before validation: it is reported by
//! [`MempoolDirectory::skipped`], not counted as a rejected record.

use crate::domain::TransactionRecord;
use crate::error::{AssemblyError, Result};
use crate::ports::TransactionSource;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Mempool directory reader
#[derive(Clone, Debug)]
pub struct MempoolDirectory {
    path: PathBuf,
    skipped: Vec<PathBuf>,
}

impl MempoolDirectory {
    /// Reader over `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            skipped: Vec::new(),
        }
    }

    /// Directory being read
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Files skipped as undecodable by the last load
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    fn json_files(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.path).map_err(|e| {
            AssemblyError::Source(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| AssemblyError::Source(format!("{}: {}", self.path.display(), e)))?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn decode(path: &Path) -> Result<Option<TransactionRecord>> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AssemblyError::Source(format!("cannot read {}: {}", path.display(), e)))?;

        let mut record: TransactionRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping undecodable transaction file {}: {}", path.display(), e);
                return Ok(None);
            }
        };

        if record.txid.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                record.txid = stem.to_string();
            }
        }
        Ok(Some(record))
    }
}

impl TransactionSource for MempoolDirectory {
    fn load_transactions(&mut self) -> Result<Vec<TransactionRecord>> {
        let files = self.json_files()?;
        debug!("Found {} transaction files in {}", files.len(), self.path.display());

        self.skipped.clear();
        let mut records = Vec::with_capacity(files.len());
        for file in files {
            match Self::decode(&file)? {
                Some(record) => records.push(record),
                None => self.skipped.push(file),
            }
        }

        info!(
            "Loaded {} transactions from {} ({} skipped)",
            records.len(),
            self.path.display(),
            self.skipped.len()
        );
        Ok(records)
    }
}
