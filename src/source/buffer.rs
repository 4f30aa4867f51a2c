//! Decode buffer for archive entries.
//!
//! One buffer exists per archive handle. It stages a compressed entry's bytes
//! before raster decoding and is reused across calls. Capacity starts at
//! `w * h * 6 + 10000` bytes and escalates once to `w * h * 30` on overflow;
//! an overflow after escalation is fatal for that frame.
//!
//! Not reentrant: reads take `&mut self`, so two in-flight reads against the
//! same handle cannot be expressed.

use std::io::Read;

use crate::error::{DecodeError, SourceRole};

const INITIAL_BYTES_PER_PIXEL: usize = 6;
const INITIAL_SLACK_BYTES: usize = 10_000;
const ESCALATED_BYTES_PER_PIXEL: usize = 30;

/// Anything that can open a named entry as a fresh reader.
pub trait EntryStore {
    type Entry<'a>: Read
    where
        Self: 'a;

    fn open_entry(&mut self, role: SourceRole, name: &str) -> Result<Self::Entry<'_>, DecodeError>;
}

#[derive(Debug)]
pub struct DecodeBuffer {
    data: Vec<u8>,
    capacity: usize,
    escalated_capacity: usize,
    escalated: bool,
}

impl DecodeBuffer {
    /// Size a buffer for frames of the given original dimensions.
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        let pixels = width as usize * height as usize;
        let capacity = pixels * INITIAL_BYTES_PER_PIXEL + INITIAL_SLACK_BYTES;
        // Tiny frames would otherwise "escalate" to a smaller buffer.
        let escalated_capacity = (pixels * ESCALATED_BYTES_PER_PIXEL).max(capacity);
        Self {
            data: Vec::new(),
            capacity,
            escalated_capacity,
            escalated: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_escalated(&self) -> bool {
        self.escalated
    }

    /// Read `entry` from `store` into the buffer.
    ///
    /// On overflow the buffer escalates and the entry is reopened and read
    /// once more. A second overflow is `BufferExhausted`.
    pub fn read_entry<S: EntryStore>(
        &mut self,
        store: &mut S,
        role: SourceRole,
        entry: &str,
    ) -> Result<&[u8], DecodeError> {
        let reader = store.open_entry(role, entry)?;
        if self.fill(role, entry, reader)? {
            return Ok(&self.data);
        }
        if self.escalated {
            return Err(self.exhausted(role, entry));
        }

        log::warn!(
            "read more than {} bytes for {} entry {}. increase buffer to {} bytes",
            self.capacity,
            role,
            entry,
            self.escalated_capacity
        );
        self.escalate();

        let reader = store.open_entry(role, entry)?;
        if self.fill(role, entry, reader)? {
            Ok(&self.data)
        } else {
            log::error!(
                "buffer still too small for {} entry {} ({} bytes)",
                role,
                entry,
                self.capacity
            );
            Err(self.exhausted(role, entry))
        }
    }

    /// Returns `Ok(false)` when the entry did not fit.
    fn fill<R: Read>(&mut self, role: SourceRole, entry: &str, reader: R) -> Result<bool, DecodeError> {
        if self.data.capacity() == 0 {
            self.data = Vec::with_capacity(self.capacity + 1);
        }
        self.data.clear();

        // One byte past capacity is enough to detect an overflow.
        let limit = self.capacity as u64 + 1;
        reader
            .take(limit)
            .read_to_end(&mut self.data)
            .map_err(|source| DecodeError::Io {
                role,
                entry: entry.to_string(),
                source,
            })?;
        Ok(self.data.len() <= self.capacity)
    }

    fn escalate(&mut self) {
        // Free the old allocation before taking the larger one.
        self.data = Vec::new();
        self.capacity = self.escalated_capacity;
        self.data = Vec::with_capacity(self.capacity + 1);
        self.escalated = true;
    }

    fn exhausted(&self, role: SourceRole, entry: &str) -> DecodeError {
        DecodeError::BufferExhausted {
            role,
            entry: entry.to_string(),
            capacity: self.capacity,
        }
    }
}
