// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Counters describing browse activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for browse operations.
#[derive(Debug, Default)]
pub struct BrowseStatistics {
    browses: AtomicU64,
    skipped: AtomicU64,
    failures: AtomicU64,
    pages: AtomicU64,
    references: AtomicU64,
}

/// Point-in-time copy of [`BrowseStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrowseStatsSnapshot {
    /// Completed fetches from the server.
    pub browses: u64,
    /// Calls answered from cached children.
    pub skipped: u64,
    /// Failed calls.
    pub failures: u64,
    /// Pages received, first pages included.
    pub pages: u64,
    /// References received.
    pub references: u64,
}

impl BrowseStatistics {
    /// Creates new statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed fetch.
    pub fn record_browse(&self, pages: usize, references: usize) {
        self.browses.fetch_add(1, Ordering::Relaxed);
        self.pages.fetch_add(pages as u64, Ordering::Relaxed);
        self.references.fetch_add(references as u64, Ordering::Relaxed);
    }

    /// Records a call served from cached children.
    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of every counter.
    pub fn snapshot(&self) -> BrowseStatsSnapshot {
        BrowseStatsSnapshot {
            browses: self.browses.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            pages: self.pages.load(Ordering::Relaxed),
            references: self.references.load(Ordering::Relaxed),
        }
    }

    /// Resets all statistics.
    pub fn reset(&self) {
        self.browses.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.pages.store(0, Ordering::Relaxed);
        self.references.store(0, Ordering::Relaxed);
    }
}
