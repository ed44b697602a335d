// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # uaview-tests
//!
//! Integration tests for the explorer core.
//!
//! ## Test Categories
//!
//! - **Browse**: lazy tree population, pagination, ordering and status
//! - **Subscription**: binding, delivery, staleness and rebinding
//! - **Dispatch**: thread affinity of callbacks
//! - **Config**: file loading, environment overrides and validation
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p uaview-tests
//!
//! # Run one category
//! cargo test -p uaview-tests --test integration_browse
//! ```

pub mod common;
