//! Operation Context
//!
//! Identifies who is acting and carries tracing metadata for a request.

use uuid::Uuid;

/// Context for an operation. Every repository access is scoped to `user_id`.
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Owner of every record touched by this operation
    pub user_id: Uuid,

    /// Correlation ID attached to handler log lines
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a context for a user
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            correlation_id: None,
        }
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}
