use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct ProcessingCounters {
    pub header_counts: AtomicU64,
    pub body_counts: AtomicU64,
    pub txs_counts: AtomicU64,
    pub reorg_counts: AtomicU64,
    pub invalidated_counts: AtomicU64,
}

impl ProcessingCounters {
    pub fn snapshot(&self) -> ProcessingCountersSnapshot {
        ProcessingCountersSnapshot {
            header_counts: self.header_counts.load(Ordering::Relaxed),
            body_counts: self.body_counts.load(Ordering::Relaxed),
            txs_counts: self.txs_counts.load(Ordering::Relaxed),
            reorg_counts: self.reorg_counts.load(Ordering::Relaxed),
            invalidated_counts: self.invalidated_counts.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ProcessingCountersSnapshot {
    pub header_counts: u64,
    pub body_counts: u64,
    pub txs_counts: u64,
    pub reorg_counts: u64,
    pub invalidated_counts: u64,
}

impl core::ops::Sub for &ProcessingCountersSnapshot {
    type Output = ProcessingCountersSnapshot;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output {
            header_counts: self.header_counts.saturating_sub(rhs.header_counts),
            body_counts: self.body_counts.saturating_sub(rhs.body_counts),
            txs_counts: self.txs_counts.saturating_sub(rhs.txs_counts),
            reorg_counts: self.reorg_counts.saturating_sub(rhs.reorg_counts),
            invalidated_counts: self.invalidated_counts.saturating_sub(rhs.invalidated_counts),
        }
    }
}
