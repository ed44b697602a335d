// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Hierarchical browse engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        BrowseEngine<S>                          │
//! │     (fetch decision, pagination drain, commit, status events)   │
//! └─────────────────────────────────────────────────────────────────┘
//!          │                     │                      │
//!          ▼                     ▼                      ▼
//!     Session (trait)       classify()            TreeCache
//!   browse_first/next    Category + rank      arena + UpdateScope
//!          │                     │                      │
//!          └──────── NodeRef ────┘                BrowseListener
//! ```
//!
//! Children are fetched only when an entry is expanded. An unbrowsed entry
//! shows a single placeholder child; after a successful browse it holds the
//! complete, classified and sorted sibling set.

pub mod classify;
mod engine;
mod listener;
mod node_ref;
mod stats;

pub use classify::{classify, Category};
pub use engine::{
    BrowseCancel, BrowseEngine, BrowseOutcome, DragPayload, STATUS_CACHED, STATUS_FAILED_PREFIX,
    STATUS_SUCCEEDED,
};
pub use listener::{BrowseEvent, BrowseListener, ChannelListener, NullListener};
pub use node_ref::{NodeRef, MISSING_DISPLAY_NAME};
pub use stats::{BrowseStatistics, BrowseStatsSnapshot};
