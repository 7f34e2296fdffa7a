// PDF combiner: split an ordered upload into fixed-size groups and concatenate each
// group's pages into one document.
// Combining is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod combine;
pub mod group;
pub mod handlers;

use bytes::Bytes;
use thiserror::Error;

pub use combine::combine_all;
pub use group::{group, PdfGroup};

/// One uploaded PDF, named after its archive entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfBlob {
    pub name: String,
    pub data: Bytes,
}

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Group size must be at least 1 (got {0})")]
    InvalidGroupSize(usize),

    #[error("Cannot combine '{name}': {reason}")]
    Unprocessable { name: String, reason: String },

    #[error("Failed to write combined PDF: {0}")]
    Write(String),
}
