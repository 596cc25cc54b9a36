//! Fixed-capacity sliding window over the most recent readings.
//!
//! Storage is a ring of `capacity` slots; the write cursor wraps and the
//! oldest reading is overwritten once the ring is full. `count_seen` keeps
//! counting past capacity so readiness does not depend on slot bookkeeping.

use crate::error::SohError;
use crate::types::{BufferStatus, Reading, Window};

#[derive(Debug, Clone)]
pub struct WindowBuffer {
    slots: Vec<Reading>,
    capacity: usize,
    /// Index the next reading is written to.
    head: usize,
    count_seen: u64,
}

impl WindowBuffer {
    /// Empty buffer holding at most `capacity` readings.
    ///
    /// `capacity` must be at least 1; the builder rejects zero before this is reached.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 1, "WindowBuffer capacity must be >= 1");
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            count_seen: 0,
        }
    }

    /// Append a reading, evicting the oldest when full.
    ///
    /// Non-finite readings are rejected and leave the buffer unchanged.
    pub fn push(&mut self, reading: Reading) -> Result<(), SohError> {
        reading.validate()?;
        if self.slots.len() < self.capacity {
            self.slots.push(reading);
        } else {
            self.slots[self.head] = reading;
        }
        self.head = (self.head + 1) % self.capacity;
        self.count_seen = self.count_seen.saturating_add(1);
        Ok(())
    }

    /// True once at least `capacity` readings have been accepted.
    pub fn is_ready(&self) -> bool {
        self.count_seen >= self.capacity as u64
    }

    /// Oldest-first copy of the current window.
    pub fn snapshot(&self) -> Result<Window, SohError> {
        if !self.is_ready() {
            return Err(SohError::BufferNotReady {
                seen: self.count_seen,
                required: self.capacity,
            });
        }
        // Full ring: `head` points at the oldest slot.
        let (newer, older) = self.slots.split_at(self.head);
        let mut readings = Vec::with_capacity(self.capacity);
        readings.extend_from_slice(older);
        readings.extend_from_slice(newer);
        Ok(Window::new(readings))
    }

    /// Readings currently held, at most `capacity`.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Accepted readings since construction.
    pub fn count_seen(&self) -> u64 {
        self.count_seen
    }

    pub fn status(&self) -> BufferStatus {
        BufferStatus {
            filled: self.len(),
            capacity: self.capacity,
            count_seen: self.count_seen,
            ready: self.is_ready(),
        }
    }
}
