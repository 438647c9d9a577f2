//! Outbound ports (driven side - SPI)
//!
//! Storage formats are owned by the implementations. Failures are returned
//! unchanged to the caller of the assembler.

use crate::domain::TransactionRecord;
use crate::error::Result;

/// Port: Supply decoded candidate transactions
pub trait TransactionSource {
    /// Pull every available record, in source order
    fn load_transactions(&mut self) -> Result<Vec<TransactionRecord>>;
}

/// Port: Persist the assembled block as ordered text lines
pub trait BlockSink {
    /// Write all lines of one block in a single call
    fn write_lines(&mut self, lines: &[String]) -> Result<()>;
}

impl<T: TransactionSource + ?Sized> TransactionSource for &mut T {
    fn load_transactions(&mut self) -> Result<Vec<TransactionRecord>> {
        (**self).load_transactions()
    }
}

impl<T: BlockSink + ?Sized> BlockSink for &mut T {
    fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        (**self).write_lines(lines)
    }
}
