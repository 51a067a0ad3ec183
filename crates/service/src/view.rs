//! Read-side response shapes.

use buildline_core::{AssignmentId, CategoryId, MasterStepId, PartId, TemplateId};
use buildline_workflow::{Category, MasterStep, TemplateState, WorkflowTemplate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display copy of a master step taken at projection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterStepSnapshot {
    /// Current name.
    pub name: String,
    /// Current description.
    pub description: Option<String>,
    /// Current duration estimate.
    pub estimated_time_minutes: u32,
    /// Current category.
    pub category_id: CategoryId,
}

impl From<&MasterStep> for MasterStepSnapshot {
    fn from(step: &MasterStep) -> Self {
        Self {
            name: step.name.clone(),
            description: step.description.clone(),
            estimated_time_minutes: step.estimated_time_minutes,
            category_id: step.category_id,
        }
    }
}

/// A step assignment with its master step resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    /// Assignment id.
    pub id: AssignmentId,
    /// Owning part.
    pub workflow_part_id: PartId,
    /// Position within the part.
    pub order: u32,
    /// Effective requiredness.
    pub is_required: bool,
    /// Referenced master step.
    pub master_step_id: MasterStepId,
    /// `None` when the master step no longer resolves.
    pub master_step: Option<MasterStepSnapshot>,
}

/// A part with its assignments in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartView {
    /// Part id.
    pub id: PartId,
    /// Owning template.
    pub workflow_template_id: TemplateId,
    /// Position within the template.
    pub part_number: u32,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Sum of resolved step estimates.
    pub total_estimated_minutes: u64,
    /// Assignments ordered by `order`.
    pub step_assignments: Vec<AssignmentView>,
}

/// A fully expanded template, as returned by `get_template`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateView {
    /// Template id.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Declared part count.
    pub number_of_parts: u32,
    /// Activation flag.
    pub is_active: bool,
    /// Structural revision.
    pub version: u32,
    /// Creation timestamp.
    pub created_date: DateTime<Utc>,
    /// Lifecycle state.
    pub state: TemplateState,
    /// Sum over all parts.
    pub total_estimated_minutes: u64,
    /// Parts ordered by `partNumber`.
    pub parts: Vec<PartView>,
}

/// A template without its parts, as returned by `list_templates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    /// Template id.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Declared part count.
    pub number_of_parts: u32,
    /// Activation flag.
    pub is_active: bool,
    /// Structural revision.
    pub version: u32,
    /// Creation timestamp.
    pub created_date: DateTime<Utc>,
    /// Parts currently owned.
    pub part_count: usize,
}

impl TemplateSummary {
    pub(crate) fn new(template: WorkflowTemplate, part_count: usize) -> Self {
        Self {
            id: template.id,
            name: template.name,
            description: template.description,
            number_of_parts: template.number_of_parts,
            is_active: template.is_active,
            version: template.version,
            created_date: template.created_date,
            part_count,
        }
    }
}

/// A category with the number of master steps filed under it, as returned by
/// `list_categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// The category record.
    #[serde(flatten)]
    pub category: Category,
    /// Master steps currently referencing the category.
    pub master_steps_count: usize,
}

/// Filter for `list_templates`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFilter {
    /// Keep only templates with this activation flag.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TemplateFilter {
    /// Match every template.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match active templates only.
    #[must_use]
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
        }
    }

    /// Match draft templates only.
    #[must_use]
    pub fn drafts() -> Self {
        Self {
            is_active: Some(false),
        }
    }

    /// Returns `true` if the template passes the filter.
    #[must_use]
    pub fn matches(&self, template: &WorkflowTemplate) -> bool {
        self.is_active.is_none_or(|flag| flag == template.is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filter_matches_by_activation() {
        let mut template = WorkflowTemplate {
            id: TemplateId::new(1),
            name: "Assembly".into(),
            description: None,
            number_of_parts: 1,
            is_active: false,
            version: 1,
            created_date: Utc::now(),
        };
        assert!(TemplateFilter::all().matches(&template));
        assert!(TemplateFilter::drafts().matches(&template));
        assert!(!TemplateFilter::active().matches(&template));
        template.is_active = true;
        assert!(TemplateFilter::active().matches(&template));
    }

    #[test]
    fn assignment_view_serializes_null_master_step() {
        let view = AssignmentView {
            id: AssignmentId::new(1),
            workflow_part_id: PartId::new(2),
            order: 1,
            is_required: true,
            master_step_id: MasterStepId::new(3),
            master_step: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["masterStep"], serde_json::Value::Null);
        assert_eq!(json["workflowPartId"], 2);
        assert_eq!(json["masterStepId"], 3);
    }
}
