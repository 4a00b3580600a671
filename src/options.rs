use std::time::Duration;

use serde::{Deserialize, Serialize};

const KILOBYTE: usize = 1024;
const MEGABYTE: usize = 1024 * KILOBYTE;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * KILOBYTE;
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * MEGABYTE;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Tuning knobs for reading a profile stream.
///
/// Embedding applications may keep these in their own configuration file,
/// hence the serde derives; missing fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Bytes requested from the stream per read. Cancellation is checked
    /// between reads, so this also bounds how late a cancel is noticed.
    pub chunk_size: usize,
    /// Streams longer than this are rejected. `None` disables the limit.
    pub max_document_size: Option<usize>,
    /// Back-off before retrying a stream that reported `WouldBlock`.
    pub poll_interval_ms: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_document_size: Some(DEFAULT_MAX_DOCUMENT_SIZE),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl LoadOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_document_size(mut self, limit: Option<usize>) -> Self {
        self.max_document_size = limit;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms =
            u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    // a zero-sized buffer would never make progress
    pub(crate) fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}
