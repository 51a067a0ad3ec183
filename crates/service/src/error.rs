//! Service error types.

use std::fmt;

use buildline_ports::{PortsError, UniqueConstraint};
use buildline_workflow::WorkflowError;

/// Coarse classification of a [`ServiceError`], stable enough for a transport
/// to map onto status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    InvalidArgument,
    /// A referenced id does not exist.
    NotFound,
    /// Part number already used within the template.
    DuplicatePartNumber,
    /// Order already used within the part.
    DuplicateOrder,
    /// Template already holds its declared part count.
    CapacityExceeded,
    /// Assignment points at a master step that does not exist.
    UnknownMasterStep,
    /// Master step still referenced by live assignments.
    ReferencedByAssignment,
    /// Active template without its full part count.
    IncompleteHierarchy,
    /// Backend failure unrelated to the caller's input.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::DuplicatePartNumber => "duplicate_part_number",
            Self::DuplicateOrder => "duplicate_order",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::UnknownMasterStep => "unknown_master_step",
            Self::ReferencedByAssignment => "referenced_by_assignment",
            Self::IncompleteHierarchy => "incomplete_hierarchy",
            Self::Storage => "storage",
        };
        f.write_str(s)
    }
}

/// Errors returned by the template and catalog services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request violates a hierarchy rule.
    #[error(transparent)]
    Rejected(#[from] WorkflowError),

    /// The backend failed for a reason the caller cannot correct.
    #[error("storage failure: {0}")]
    Storage(PortsError),
}

impl ServiceError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Rejected(e) => match e {
                WorkflowError::InvalidArgument(_) => ErrorKind::InvalidArgument,
                WorkflowError::NotFound { .. } => ErrorKind::NotFound,
                WorkflowError::DuplicatePartNumber { .. } => ErrorKind::DuplicatePartNumber,
                WorkflowError::DuplicateOrder { .. } => ErrorKind::DuplicateOrder,
                WorkflowError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
                WorkflowError::UnknownMasterStep(_) => ErrorKind::UnknownMasterStep,
                WorkflowError::ReferencedByAssignment { .. } => ErrorKind::ReferencedByAssignment,
                WorkflowError::IncompleteHierarchy { .. } => ErrorKind::IncompleteHierarchy,
            },
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// The underlying hierarchy rejection, if this is one.
    #[must_use]
    pub fn as_rejection(&self) -> Option<&WorkflowError> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Storage(_) => None,
        }
    }

    /// Returns `true` if the backend reported a transient failure.
    ///
    /// Rejections are never retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_retryable())
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::Rejected(WorkflowError::not_found(entity, id))
    }
}

impl From<PortsError> for ServiceError {
    fn from(err: PortsError) -> Self {
        match err {
            PortsError::NotFound { entity, id } => {
                Self::Rejected(WorkflowError::NotFound { entity, id })
            }
            PortsError::UniqueViolation(UniqueConstraint::PartNumber {
                template_id,
                part_number,
            }) => Self::Rejected(WorkflowError::DuplicatePartNumber {
                template_id,
                part_number,
            }),
            PortsError::UniqueViolation(UniqueConstraint::AssignmentOrder { part_id, order }) => {
                Self::Rejected(WorkflowError::DuplicateOrder { part_id, order })
            }
            PortsError::UniqueViolation(UniqueConstraint::CategoryName { name }) => Self::Rejected(
                WorkflowError::invalid(format!("category name {name:?} is already in use")),
            ),
            other => Self::Storage(other),
        }
    }
}
