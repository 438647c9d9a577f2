//! Port implementations
//!
//! - [`MempoolDirectory`]: directory of JSON transaction files
//! - [`OutputFile`]: line-oriented output file
//! - [`InMemorySource`] / [`InMemorySink`]: embedding and tests

pub mod memory;
pub mod mempool_dir;
pub mod output_file;

pub use memory::{InMemorySink, InMemorySource};
pub use mempool_dir::MempoolDirectory;
pub use output_file::OutputFile;
