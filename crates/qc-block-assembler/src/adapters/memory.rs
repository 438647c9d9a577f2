//! In-memory source and sink

use crate::domain::TransactionRecord;
use crate::error::Result;
use crate::ports::{BlockSink, TransactionSource};

/// Source handing out a fixed set of records
#[derive(Clone, Debug, Default)]
pub struct InMemorySource {
    records: Vec<TransactionRecord>,
}

impl InMemorySource {
    /// Source over `records`
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }
}

impl TransactionSource for InMemorySource {
    fn load_transactions(&mut self) -> Result<Vec<TransactionRecord>> {
        Ok(self.records.clone())
    }
}

/// Sink keeping every written line
#[derive(Clone, Debug, Default)]
pub struct InMemorySink {
    /// Lines of the last write
    pub lines: Vec<String>,
    /// Number of write calls received
    pub writes: usize,
}

impl InMemorySink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockSink for InMemorySink {
    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        self.lines = lines.to_vec();
        self.writes += 1;
        Ok(())
    }
}
