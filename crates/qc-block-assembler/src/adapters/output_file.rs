//! Sink writing the block to a text file, one line per entry
//!
//! Lines go to a temporary file next to the destination, which is then
//! renamed over it: readers see the previous output or the whole block.

use crate::error::{AssemblyError, Result};
use crate::ports::BlockSink;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Output file sink (replaces the file on every write)
#[derive(Clone, Debug)]
pub struct OutputFile {
    path: PathBuf,
}

impl OutputFile {
    /// Sink writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, lines: &[String]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            for line in lines {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        staged.as_file().sync_all()?;
        staged.persist(&self.path)?;
        Ok(())
    }
}

impl BlockSink for OutputFile {
    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        self.write_all(lines).map_err(|e| {
            AssemblyError::Sink(format!("cannot write {}: {}", self.path.display(), e))
        })?;
        info!("Wrote {} lines to {}", lines.len(), self.path.display());
        Ok(())
    }
}
