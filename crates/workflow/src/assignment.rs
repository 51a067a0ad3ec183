//! Step assignments: a master step bound to a position within a part.

use buildline_core::{AssignmentId, MasterStepId, PartId};
use serde::{Deserialize, Serialize};

/// A binding of a master step to a position (`order`) within a part.
///
/// The master step is held by id only; display data is resolved from the
/// catalog on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAssignment {
    /// Repository-assigned identifier.
    pub id: AssignmentId,
    /// Owning part; fixed at creation.
    pub workflow_part_id: PartId,
    /// Referenced catalog step.
    pub master_step_id: MasterStepId,
    /// Position within the part, unique per part, at least 1.
    pub order: u32,
    /// Overrides the master step's own default.
    pub is_required: bool,
}

/// Input for adding an assignment to a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    /// Owning part.
    pub workflow_part_id: PartId,
    /// Referenced catalog step; must exist at commit time.
    pub master_step_id: MasterStepId,
    /// Requested position.
    pub order: u32,
    /// Requiredness for this template.
    #[serde(default = "default_required")]
    pub is_required: bool,
}

fn default_required() -> bool {
    true
}

impl NewAssignment {
    /// Start an assignment request.
    #[must_use]
    pub fn new(workflow_part_id: PartId, master_step_id: MasterStepId, order: u32) -> Self {
        Self {
            workflow_part_id,
            master_step_id,
            order,
            is_required: default_required(),
        }
    }

    /// Set requiredness.
    #[must_use]
    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    /// Materialize the stored record once the repository has assigned an id.
    #[must_use]
    pub fn into_assignment(self, id: AssignmentId) -> StepAssignment {
        StepAssignment {
            id,
            workflow_part_id: self.workflow_part_id,
            master_step_id: self.master_step_id,
            order: self.order,
            is_required: self.is_required,
        }
    }
}

/// Reorder / requiredness patch. Owning part and master step are immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    /// New position.
    #[serde(default)]
    pub order: Option<u32>,
    /// New requiredness.
    #[serde(default)]
    pub is_required: Option<bool>,
}

impl AssignmentPatch {
    /// A patch that only moves the assignment.
    #[must_use]
    pub fn reorder(order: u32) -> Self {
        Self {
            order: Some(order),
            is_required: None,
        }
    }
}
