//! Hierarchy error taxonomy.

use buildline_core::{MasterStepId, PartId, TemplateId};
use thiserror::Error;

/// Reasons a hierarchy mutation is rejected.
///
/// Every variant is terminal for the call that triggered it: each one describes
/// a condition the caller has to correct, so none of them is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Malformed or out-of-range input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity (e.g. "WorkflowTemplate").
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Another part of the same template already uses this number.
    #[error("template {template_id} already has a part numbered {part_number}")]
    DuplicatePartNumber {
        /// Owning template.
        template_id: TemplateId,
        /// The contested part number.
        part_number: u32,
    },

    /// Another assignment in the same part already sits at this position.
    #[error("part {part_id} already has an assignment at order {order}")]
    DuplicateOrder {
        /// Owning part.
        part_id: PartId,
        /// The contested position.
        order: u32,
    },

    /// The template already owns its declared number of parts.
    #[error("template {template_id} already holds its declared {number_of_parts} parts")]
    CapacityExceeded {
        /// The full template.
        template_id: TemplateId,
        /// Its declared part count.
        number_of_parts: u32,
    },

    /// The master step does not resolve in the catalog.
    #[error("unknown master step: {0}")]
    UnknownMasterStep(MasterStepId),

    /// The master step is still used by live step assignments.
    #[error("master step {master_step_id} is referenced by {assignments} step assignment(s)")]
    ReferencedByAssignment {
        /// The master step that was to be deleted.
        master_step_id: MasterStepId,
        /// How many live assignments point at it.
        assignments: usize,
    },

    /// An active template must own exactly its declared number of parts.
    #[error("active template needs {expected} parts but would own {actual}")]
    IncompleteHierarchy {
        /// Declared `numberOfParts`.
        expected: u32,
        /// Parts actually owned.
        actual: usize,
    },
}

impl WorkflowError {
    /// Convenience constructor for [`WorkflowError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Convenience constructor for [`WorkflowError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn not_found_display() {
        let err = WorkflowError::not_found("WorkflowPart", PartId::new(4));
        assert_eq!(err.to_string(), "WorkflowPart not found: 4");
    }

    #[test]
    fn duplicate_part_number_display() {
        let err = WorkflowError::DuplicatePartNumber {
            template_id: TemplateId::new(1),
            part_number: 2,
        };
        assert_eq!(
            err.to_string(),
            "template 1 already has a part numbered 2"
        );
    }

    #[test]
    fn capacity_exceeded_display() {
        let err = WorkflowError::CapacityExceeded {
            template_id: TemplateId::new(9),
            number_of_parts: 2,
        };
        assert_eq!(
            err.to_string(),
            "template 9 already holds its declared 2 parts"
        );
    }

    #[test]
    fn incomplete_hierarchy_display() {
        let err = WorkflowError::IncompleteHierarchy {
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "active template needs 2 parts but would own 1"
        );
    }

    #[test]
    fn referenced_by_assignment_display() {
        let err = WorkflowError::ReferencedByAssignment {
            master_step_id: MasterStepId::new(12),
            assignments: 3,
        };
        assert_eq!(
            err.to_string(),
            "master step 12 is referenced by 3 step assignment(s)"
        );
    }
}
