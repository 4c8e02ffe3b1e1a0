//! Reserved even/odd port-pair pool.
//!
//! RTP sessions need two adjacent ports: even for media, odd for its
//! control companion (RFC 3550 §11). The pool hands out pair *indices*
//! (`index * 2` / `index * 2 + 1`) drawn from a configured `"min-max"`
//! port range.
//!
//! Issuance order is randomized at seed time so a restarted server does
//! not deterministically reuse the lowest ports while peers may still be
//! sending to them. Released pairs go to the *end* of the free list —
//! every seeded pair is issued once before any recycled pair reappears.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rand::RngExt;

use crate::error::{Result, RtspError};

/// Default `"min-max"` port range when none is configured.
pub const DEFAULT_PORT_RANGE: &str = "30000-35000";

struct PoolShared {
    free: Mutex<VecDeque<u16>>,
}

/// A reserved even/odd port pair.
///
/// Shared (via `Arc`) between the pool's caller and every socket opened
/// against the pair; when the last owner drops it, the pair returns to
/// its pool. Release after the pool itself is gone is a no-op.
pub struct PortPair {
    index: u16,
    pool: Weak<PoolShared>,
}

impl PortPair {
    /// Even media port.
    pub fn rtp_port(&self) -> u16 {
        self.index * 2
    }

    /// Odd control port.
    pub fn rtcp_port(&self) -> u16 {
        self.index * 2 + 1
    }
}

impl Drop for PortPair {
    fn drop(&mut self) {
        let Some(pool) = self.pool.upgrade() else {
            return;
        };
        tracing::info!(
            rtp_port = self.rtp_port(),
            rtcp_port = self.rtcp_port(),
            "return port to pool"
        );
        pool.free.lock().push_back(self.index);
    }
}

/// Thread-safe allocator of reserved port pairs.
pub struct PortPool {
    shared: Arc<PoolShared>,
}

impl PortPool {
    /// Build a pool from a `"min-max"` port range string. An unparseable
    /// half falls back to its default bound (30000 / 35000). The range
    /// must satisfy `max >= min + 35` so the pool seeds a usable number
    /// of pairs.
    pub fn from_range(range: &str) -> Result<Self> {
        let (min, max) = match range.split_once('-') {
            Some((min, max)) => (min, max),
            None => (range, ""),
        };
        let min: u16 = min.trim().parse().unwrap_or(30000);
        let max: u16 = max.trim().parse().unwrap_or(35000);
        if (max as u32) < min as u32 + 35 {
            return Err(RtspError::InvalidPortRange(range.to_string()));
        }
        Ok(Self::with_bounds(min, max))
    }

    /// Seed pair indices over `[(min+1)/2, max/2)`: ascending values,
    /// each inserted at the current position, the position then re-drawn
    /// uniformly — a complete, duplicate-free set whose iteration order
    /// is random.
    pub(crate) fn with_bounds(min_port: u16, max_port: u16) -> Self {
        let mut free: VecDeque<u16> = VecDeque::new();
        let mut rng = rand::rng();
        let mut index = ((min_port as u32 + 1) / 2) as u16;
        let end = max_port / 2;
        let mut at = 0usize;
        while index < end {
            free.insert(at, index);
            index += 1;
            at = rng.random_range(0..=free.len());
        }
        tracing::debug!(
            min_port,
            max_port,
            pairs = free.len(),
            "port pair pool seeded"
        );
        Self {
            shared: Arc::new(PoolShared { free: Mutex::new(free) }),
        }
    }

    /// Reserve the next pair. Fails with
    /// [`RtspError::PortPoolExhausted`] when the free list is empty —
    /// never blocks waiting for a release.
    pub fn allocate(&self) -> Result<Arc<PortPair>> {
        let index = {
            let mut free = self.shared.free.lock();
            free.pop_front().ok_or(RtspError::PortPoolExhausted)?
        };
        tracing::info!(
            rtp_port = index * 2,
            rtcp_port = index * 2 + 1,
            "got port from pool"
        );
        Ok(Arc::new(PortPair {
            index,
            pool: Arc::downgrade(&self.shared),
        }))
    }

    /// Number of pairs currently free.
    pub fn free_pairs(&self) -> usize {
        self.shared.free.lock().len()
    }
}
