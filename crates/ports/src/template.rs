//! Template repository port.
//!
//! Defines the persistence interface for the template hierarchy.
//! Backend drivers (in-memory, SQL) implement this trait.

use async_trait::async_trait;
use buildline_core::{AssignmentId, MasterStepId, PartId, TemplateId};
use buildline_workflow::{
    NewAssignment, NewPart, NewTemplate, StepAssignment, TemplateHierarchy, WorkflowPart,
    WorkflowTemplate,
};

use crate::error::PortsError;

/// Persistence interface for templates, parts, and step assignments.
///
/// Contract every driver must honour:
///
/// - `create_part` rejects a duplicate `(template, part_number)` with
///   [`PortsError::UniqueViolation`]; `create_assignment` and
///   `update_assignment` do the same for `(part, order)`, and `update_part`
///   for a renumber clash.
/// - `delete_part` and `delete_template` cascade atomically: no reader ever
///   observes a part without its template or an assignment without its part.
/// - Creating a child under a missing parent fails with
///   [`PortsError::NotFound`].
#[async_trait]
pub trait TemplateRepo: Send + Sync {
    // ── templates ───────────────────────────────────────────────────────

    /// Get a template record by id.
    async fn get_template(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, PortsError>;

    /// All template records, ordered by id.
    async fn list_templates(&self) -> Result<Vec<WorkflowTemplate>, PortsError>;

    /// Persist a new template and return it with its assigned id and creation date.
    async fn create_template(&self, template: NewTemplate) -> Result<WorkflowTemplate, PortsError>;

    /// Replace the stored template fields. `created_date` is never overwritten.
    async fn update_template(&self, template: &WorkflowTemplate) -> Result<(), PortsError>;

    /// Delete a template with all its parts and assignments. Returns `true` if it existed.
    async fn delete_template(&self, id: TemplateId) -> Result<bool, PortsError>;

    // ── parts ───────────────────────────────────────────────────────────

    /// Get a part record by id.
    async fn get_part(&self, id: PartId) -> Result<Option<WorkflowPart>, PortsError>;

    /// Parts owned by the template, ordered by part number.
    async fn parts_of(&self, template_id: TemplateId) -> Result<Vec<WorkflowPart>, PortsError>;

    /// Persist a new part.
    async fn create_part(&self, part: NewPart) -> Result<WorkflowPart, PortsError>;

    /// Replace the stored part fields. The owning template is never changed.
    async fn update_part(&self, part: &WorkflowPart) -> Result<(), PortsError>;

    /// Delete a part with all its assignments. Returns `true` if it existed.
    async fn delete_part(&self, id: PartId) -> Result<bool, PortsError>;

    // ── assignments ─────────────────────────────────────────────────────

    /// Get an assignment record by id.
    async fn get_assignment(&self, id: AssignmentId) -> Result<Option<StepAssignment>, PortsError>;

    /// Assignments owned by the part, ordered by position.
    async fn assignments_of(&self, part_id: PartId) -> Result<Vec<StepAssignment>, PortsError>;

    /// Persist a new assignment.
    async fn create_assignment(&self, assignment: NewAssignment)
    -> Result<StepAssignment, PortsError>;

    /// Replace the stored assignment fields. Owning part and master step never change.
    async fn update_assignment(&self, assignment: &StepAssignment) -> Result<(), PortsError>;

    /// Delete an assignment. Returns `true` if it existed.
    async fn delete_assignment(&self, id: AssignmentId) -> Result<bool, PortsError>;

    // ── queries ─────────────────────────────────────────────────────────

    /// Number of live assignments pointing at the master step.
    async fn count_assignments_referencing(
        &self,
        master_step_id: MasterStepId,
    ) -> Result<usize, PortsError>;

    /// Number of parts the template owns.
    async fn count_parts(&self, template_id: TemplateId) -> Result<usize, PortsError> {
        Ok(self.parts_of(template_id).await?.len())
    }

    /// Load a template with its parts and assignments.
    ///
    /// The default composes the scoped queries; drivers that can read the
    /// whole hierarchy in one consistent snapshot should override it.
    async fn load_hierarchy(
        &self,
        template_id: TemplateId,
    ) -> Result<Option<TemplateHierarchy>, PortsError> {
        let Some(template) = self.get_template(template_id).await? else {
            return Ok(None);
        };
        let parts = self.parts_of(template_id).await?;
        let mut assignments = Vec::new();
        for part in &parts {
            assignments.extend(self.assignments_of(part.id).await?);
        }
        Ok(Some(TemplateHierarchy::assemble(template, parts, assignments)))
    }
}
