//! Pre-parse size enforcement for submitted report bodies.

use tracing::debug;

use crate::error::{Error, Result};

/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 4000;

/// Rejects request bodies larger than a configured byte limit.
///
/// The check is a plain byte-length comparison and runs before any
/// content-type or JSON inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionFilter {
    max_content_length: u64,
}

impl Default for AdmissionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_LENGTH)
    }
}

impl AdmissionFilter {
    /// Create a filter admitting bodies of at most `max_content_length` bytes.
    #[must_use]
    pub fn new(max_content_length: u64) -> Self {
        Self { max_content_length }
    }

    /// The configured limit in bytes.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.max_content_length
    }

    /// Check a declared `Content-Length` before reading the body.
    ///
    /// An absent declaration is admitted; the body is checked once read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the declared size exceeds the limit.
    pub fn admit_declared(&self, declared: Option<u64>) -> Result<()> {
        match declared {
            Some(size) => self.admit(size),
            None => Ok(()),
        }
    }

    /// Check the size of a body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if `size` exceeds the limit.
    pub fn admit(&self, size: u64) -> Result<()> {
        if size > self.max_content_length {
            debug!(size, limit = self.max_content_length, "Rejecting oversized body");
            return Err(Error::PayloadTooLarge {
                size,
                limit: self.max_content_length,
            });
        }
        Ok(())
    }

    /// Check a body that has already been read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the body exceeds the limit.
    pub fn admit_body(&self, body: &[u8]) -> Result<()> {
        self.admit(u64::try_from(body.len()).unwrap_or(u64::MAX))
    }

    /// Largest number of bytes worth buffering for a body.
    ///
    /// One byte past the limit, so an over-long body is detected without
    /// reading it in full.
    #[must_use]
    pub fn read_limit(&self) -> usize {
        usize::try_from(self.max_content_length)
            .unwrap_or(usize::MAX)
            .saturating_add(1)
    }
}
