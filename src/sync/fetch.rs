//! Summary fetch coalescing.
//!
//! At most one summary request is in flight. Requests made meanwhile
//! collapse into a single pending flag, answered by exactly one follow-up
//! fetch when the current one completes.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SummaryFetcher {
    in_flight: bool,
    pending: bool,
    issued: u64,
    coalesced: u64,
}

impl SummaryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a fetch. Returns true if the caller should issue it now.
    pub fn request(&mut self) -> bool {
        if self.in_flight {
            if !self.pending {
                self.coalesced += 1;
            }
            self.pending = true;
            return false;
        }
        self.in_flight = true;
        self.issued += 1;
        true
    }

    /// The in-flight fetch finished (either way). Returns true if a
    /// follow-up fetch should be issued now.
    pub fn complete(&mut self) -> bool {
        self.in_flight = false;
        if std::mem::take(&mut self.pending) {
            self.request()
        } else {
            false
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Requests absorbed by an in-flight fetch.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
