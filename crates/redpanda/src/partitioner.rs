//! Partition routing for published events.
//!
//! Messages carry no key. Each publish goes to the partition that has been
//! handed the fewest bytes so far, which keeps partitions evenly loaded at
//! the cost of per-user ordering.

use parking_lot::Mutex;

/// Least-bytes partition balancer.
#[derive(Debug)]
pub struct LeastBytes {
    written: Mutex<Vec<u64>>,
}

impl LeastBytes {
    pub fn new(partitions: usize) -> Self {
        Self {
            written: Mutex::new(vec![0; partitions]),
        }
    }

    /// Picks the partition index for a message of `len` bytes and charges
    /// the bytes to it. Ties go to the lowest index.
    pub fn pick(&self, len: usize) -> usize {
        let mut written = self.written.lock();

        let idx = written
            .iter()
            .enumerate()
            .min_by_key(|(_, bytes)| **bytes)
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        if let Some(bytes) = written.get_mut(idx) {
            *bytes = bytes.saturating_add(len as u64);
        }

        idx
    }

    /// Bytes charged to each partition so far.
    pub fn written(&self) -> Vec<u64> {
        self.written.lock().clone()
    }

    pub fn partitions(&self) -> usize {
        self.written.lock().len()
    }
}
