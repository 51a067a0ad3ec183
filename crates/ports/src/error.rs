//! Error types for port operations.
//!
//! Every port method returns `Result<_, PortsError>`. Drivers map their
//! internal failures into these variants; the service layer translates the
//! uniqueness signal into hierarchy errors without knowing the backend.

use std::fmt;
use std::time::Duration;

use buildline_core::{PartId, TemplateId};

/// A uniqueness constraint enforced at the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// `(workflow_template_id, part_number)` is unique.
    PartNumber {
        /// Owning template.
        template_id: TemplateId,
        /// Contested part number.
        part_number: u32,
    },
    /// `(workflow_part_id, order)` is unique.
    AssignmentOrder {
        /// Owning part.
        part_id: PartId,
        /// Contested position.
        order: u32,
    },
    /// Category names are unique.
    CategoryName {
        /// Contested name.
        name: String,
    },
}

impl fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartNumber {
                template_id,
                part_number,
            } => write!(f, "part number {part_number} in template {template_id}"),
            Self::AssignmentOrder { part_id, order } => {
                write!(f, "order {order} in part {part_id}")
            }
            Self::CategoryName { name } => write!(f, "category name {name:?}"),
        }
    }
}

/// Error type for all port operations.
///
/// Distinguishes retryable failures (connection, timeout) from permanent
/// ones (not found, constraint violation) so callers can decide without
/// inspecting messages.
#[derive(Debug, thiserror::Error)]
pub enum PortsError {
    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity (e.g. "WorkflowPart").
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A write would break a uniqueness constraint.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(UniqueConstraint),

    /// Backend connection failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Operation exceeded its timeout.
    #[error("timeout: {operation} after {duration:?}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: String,
        /// How long was waited before giving up.
        duration: Duration,
    },

    /// Catch-all internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortsError {
    /// Convenience constructor for [`PortsError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`PortsError::Timeout`].
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Returns `true` for transient errors that a caller may retry.
    ///
    /// Currently [`Connection`](Self::Connection) and [`Timeout`](Self::Timeout).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Construction ────────────────────────────────────────────────────

    #[test]
    fn not_found_convenience() {
        let err = PortsError::not_found("WorkflowTemplate", TemplateId::new(8));
        match &err {
            PortsError::NotFound { entity, id } => {
                assert_eq!(*entity, "WorkflowTemplate");
                assert_eq!(id, "8");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    // ── is_retryable ────────────────────────────────────────────────────

    #[test]
    fn connection_and_timeout_are_retryable() {
        assert!(PortsError::Connection("refused".into()).is_retryable());
        assert!(PortsError::timeout("create_part", Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn constraint_violation_is_not_retryable() {
        let err = PortsError::UniqueViolation(UniqueConstraint::PartNumber {
            template_id: TemplateId::new(1),
            part_number: 1,
        });
        assert!(!err.is_retryable());
        assert!(!PortsError::not_found("X", 1).is_retryable());
        assert!(!PortsError::Internal("oops".into()).is_retryable());
    }

    // ── Display ─────────────────────────────────────────────────────────

    #[test]
    fn display_unique_violation() {
        let err = PortsError::UniqueViolation(UniqueConstraint::AssignmentOrder {
            part_id: PartId::new(3),
            order: 2,
        });
        assert_eq!(
            err.to_string(),
            "unique constraint violated: order 2 in part 3"
        );
    }

    #[test]
    fn display_category_name_constraint() {
        let constraint = UniqueConstraint::CategoryName {
            name: "Assembly".into(),
        };
        assert_eq!(constraint.to_string(), "category name \"Assembly\"");
    }

    #[test]
    fn display_not_found() {
        let err = PortsError::not_found("WorkflowPart", 4);
        assert_eq!(err.to_string(), "WorkflowPart not found: 4");
    }
}
