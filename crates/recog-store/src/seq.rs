//! Monotonic request sequencing: only the latest issued request may apply.

use crate::StoreError;

#[derive(Debug, Default)]
pub struct SequenceGuard {
    latest: u64,
}

impl SequenceGuard {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn check(&self, seq: u64) -> Result<(), StoreError> {
        if self.is_current(seq) {
            Ok(())
        } else {
            Err(StoreError::Stale {
                issued: seq,
                latest: self.latest,
            })
        }
    }
}
