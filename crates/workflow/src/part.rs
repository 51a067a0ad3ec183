//! Workflow parts: ordered sub-units of a template.

use buildline_core::{PartId, TemplateId};
use serde::{Deserialize, Serialize};

/// An ordered sub-unit of a template, exclusively owned by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPart {
    /// Repository-assigned identifier.
    pub id: PartId,
    /// Owning template; fixed at creation.
    pub workflow_template_id: TemplateId,
    /// Position within the template, unique per template, at least 1.
    pub part_number: u32,
    /// Display name; never empty.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for adding a part to a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPart {
    /// Owning template.
    pub workflow_template_id: TemplateId,
    /// Requested part number.
    pub part_number: u32,
    /// Display name.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
}

impl NewPart {
    /// Start a part request.
    #[must_use]
    pub fn new(workflow_template_id: TemplateId, part_number: u32, name: impl Into<String>) -> Self {
        Self {
            workflow_template_id,
            part_number,
            name: name.into(),
            description: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Materialize the stored record once the repository has assigned an id.
    #[must_use]
    pub fn into_part(self, id: PartId) -> WorkflowPart {
        WorkflowPart {
            id,
            workflow_template_id: self.workflow_template_id,
            part_number: self.part_number,
            name: self.name,
            description: self.description,
        }
    }
}

/// Field-level patch for a [`WorkflowPart`]. The owning template cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartPatch {
    /// New part number.
    #[serde(default)]
    pub part_number: Option<u32>,
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    #[serde(default, deserialize_with = "crate::serde_patch_opt::deserialize")]
    pub description: Option<Option<String>>,
}

impl PartPatch {
    /// Set the new part number.
    #[must_use]
    pub fn part_number(mut self, part_number: u32) -> Self {
        self.part_number = Some(part_number);
        self
    }

    /// Set the new name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
