// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Attribute writes through the session.
//!
//! A bad per-item status is not an error: it is returned so the caller can
//! render it. Only service-level failures surface as [`SessionError`].

use std::sync::Arc;

use crate::error::{SessionError, SessionResult};
use crate::session::{Session, WriteValue};
use crate::types::{NodeId, StatusCode, UaValue};

/// Namespace index of the demo start flag.
pub const START_FLAG_NAMESPACE: u16 = 3;

/// String identifier of the demo start flag.
pub const START_FLAG_IDENTIFIER: &str = "\"start\"";

/// Returns the id of the Boolean start/stop flag (`ns=3;s="start"`).
pub fn start_flag() -> NodeId {
    NodeId::string(START_FLAG_NAMESPACE, START_FLAG_IDENTIFIER)
}

/// Writes Value attributes.
#[derive(Debug)]
pub struct ValueWriter<S: Session + ?Sized> {
    session: Arc<S>,
}

impl<S: Session + ?Sized> ValueWriter<S> {
    /// Creates a writer over `session`.
    pub fn new(session: Arc<S>) -> Self {
        Self { session }
    }

    /// Writes several values and returns one status per value.
    pub async fn write_values(&self, values: &[WriteValue]) -> SessionResult<Vec<StatusCode>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let statuses = self.session.write(values).await?;
        if statuses.len() < values.len() {
            return Err(SessionError::EmptyResponse { service: "Write" });
        }
        for (value, status) in values.iter().zip(&statuses) {
            if status.is_good() {
                tracing::debug!(node_id = %value.node_id, "Value written");
            } else {
                tracing::warn!(node_id = %value.node_id, status = %status, "Write rejected");
            }
        }
        Ok(statuses)
    }

    /// Writes the Value attribute of one node.
    pub async fn write_value(
        &self,
        node_id: NodeId,
        value: impl Into<UaValue>,
    ) -> SessionResult<StatusCode> {
        let statuses = self.write_values(&[WriteValue::value(node_id, value)]).await?;
        statuses
            .first()
            .copied()
            .ok_or(SessionError::EmptyResponse { service: "Write" })
    }

    /// Writes a Boolean.
    pub async fn write_boolean(&self, node_id: NodeId, value: bool) -> SessionResult<StatusCode> {
        self.write_value(node_id, value).await
    }
}

impl<S: Session + ?Sized> Clone for ValueWriter<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}
