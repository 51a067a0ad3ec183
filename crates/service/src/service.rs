//! Template service: the write path of the hierarchy.
//!
//! Every mutation follows the same shape: take the owning template's write
//! lock, load current state, run the matching check from
//! [`buildline_workflow::validate`], commit, invalidate the cached projection,
//! release. Child ids are resolved to their template before locking and
//! re-read afterwards, since the child may have gone in between.

use std::sync::Arc;

use buildline_core::{AssignmentId, PartId, TemplateId};
use buildline_ports::{CatalogAdmin, CatalogStore, TemplateRepo};
use buildline_workflow::validate::{
    validate_assignment_update, validate_new_assignment, validate_new_part, validate_new_template,
    validate_part_removal, validate_part_update, validate_template_deletion,
    validate_template_update,
};
use buildline_workflow::{
    AssignmentPatch, NewAssignment, NewPart, NewTemplate, PartPatch, StepAssignment, TemplatePatch,
    TemplateState, WorkflowPart, WorkflowTemplate,
};

use crate::catalog::CatalogService;
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::locks::LockRegistry;
use crate::projector::ReadProjector;
use crate::view::{TemplateFilter, TemplateSummary, TemplateView};

const TEMPLATE: &str = "WorkflowTemplate";
const PART: &str = "WorkflowPart";
const ASSIGNMENT: &str = "WorkflowStepAssignment";

/// Creates, edits and deletes templates, parts and step assignments.
///
/// Cheap to clone; clones share the repository, locks and projection cache.
#[derive(Clone)]
pub struct TemplateService {
    repo: Arc<dyn TemplateRepo>,
    catalog: Arc<dyn CatalogAdmin>,
    locks: Arc<LockRegistry>,
    projector: Arc<ReadProjector>,
    config: ServiceConfig,
}

impl TemplateService {
    /// Wire a service over the given drivers.
    pub fn new(
        repo: Arc<dyn TemplateRepo>,
        catalog: Arc<dyn CatalogAdmin>,
        config: ServiceConfig,
    ) -> Self {
        let locks = Arc::new(LockRegistry::new());
        let store: Arc<dyn CatalogStore> = catalog.clone();
        let projector = Arc::new(ReadProjector::new(
            Arc::clone(&repo),
            store,
            Arc::clone(&locks),
            &config,
        ));
        Self {
            repo,
            catalog,
            locks,
            projector,
            config,
        }
    }

    /// Catalog service sharing this service's locks and projection cache.
    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.repo),
            Arc::clone(&self.locks),
            Arc::clone(&self.projector),
        )
    }

    /// The read projector behind [`get_template`](Self::get_template).
    pub fn projector(&self) -> &ReadProjector {
        &self.projector
    }

    /// Active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ── templates ───────────────────────────────────────────────────────

    /// Create an empty template.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn create_template(&self, req: NewTemplate) -> Result<WorkflowTemplate, ServiceError> {
        validate_new_template(&req, self.config.max_parts_per_template)?;
        let template = self.repo.create_template(req).await?;
        tracing::info!(
            template_id = %template.id,
            number_of_parts = template.number_of_parts,
            "template created"
        );
        Ok(template)
    }

    /// Apply a field-level patch.
    ///
    /// The version goes up by one when name, description or number of parts
    /// actually change.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn update_template_fields(
        &self,
        id: TemplateId,
        patch: TemplatePatch,
    ) -> Result<WorkflowTemplate, ServiceError> {
        if patch.is_empty() {
            return self.load_template(id).await;
        }
        let _guard = self.locks.write_template(id).await;
        let current = self.load_template(id).await?;
        let part_count = self.repo.count_parts(id).await?;
        let next = validate_template_update(
            &current,
            part_count,
            &patch,
            self.config.max_parts_per_template,
        )?;
        if next != current {
            self.repo.update_template(&next).await?;
            self.projector.invalidate(id).await;
            tracing::info!(
                template_id = %id,
                version = next.version,
                state = %next.state(),
                "template updated"
            );
        }
        Ok(next)
    }

    /// Mark the template active. Requires its full part count.
    pub async fn activate(&self, id: TemplateId) -> Result<WorkflowTemplate, ServiceError> {
        self.update_template_fields(id, TemplatePatch::activation(true))
            .await
    }

    /// Return the template to draft. Always permitted.
    pub async fn deactivate(&self, id: TemplateId) -> Result<WorkflowTemplate, ServiceError> {
        self.update_template_fields(id, TemplatePatch::activation(false))
            .await
    }

    /// Delete the template with every part and assignment it owns.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn delete_template(&self, id: TemplateId) -> Result<(), ServiceError> {
        let _guard = self.locks.write_template(id).await;
        let template = self.load_template(id).await?;
        let from = validate_template_deletion(&template)?;
        if !self.repo.delete_template(id).await? {
            return Err(ServiceError::not_found(TEMPLATE, id));
        }
        self.projector.invalidate(id).await;
        tracing::info!(
            template_id = %id,
            from = %from,
            to = %TemplateState::Deleted,
            "template deleted"
        );
        Ok(())
    }

    // ── parts ───────────────────────────────────────────────────────────

    /// Add a part to a template.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn add_part(&self, req: NewPart) -> Result<WorkflowPart, ServiceError> {
        let template_id = req.workflow_template_id;
        let _guard = self.locks.write_template(template_id).await;
        let template = self.load_template(template_id).await?;
        let parts = self.repo.parts_of(template_id).await?;
        validate_new_part(&template, &parts, &req)?;

        let part = self.repo.create_part(req).await?;
        self.projector.invalidate(template_id).await;
        tracing::info!(
            template_id = %template_id,
            part_id = %part.id,
            part_number = part.part_number,
            "part added"
        );
        Ok(part)
    }

    /// Rename, describe or renumber a part.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn update_part(
        &self,
        id: PartId,
        patch: PartPatch,
    ) -> Result<WorkflowPart, ServiceError> {
        let template_id = self.owner_of_part(id).await?;
        let _guard = self.locks.write_template(template_id).await;
        let part = self.load_part(id).await?;
        let siblings = self.repo.parts_of(template_id).await?;
        let next = validate_part_update(&part, &siblings, &patch)?;
        if next != part {
            self.repo.update_part(&next).await?;
            self.projector.invalidate(template_id).await;
            tracing::info!(template_id = %template_id, part_id = %id, "part updated");
        }
        Ok(next)
    }

    /// Remove a part and its assignments.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn remove_part(&self, id: PartId) -> Result<(), ServiceError> {
        let template_id = self.owner_of_part(id).await?;
        let _guard = self.locks.write_template(template_id).await;
        self.load_part(id).await?;
        let template = self.load_template(template_id).await?;
        let part_count = self.repo.count_parts(template_id).await?;
        validate_part_removal(&template, part_count)?;

        if !self.repo.delete_part(id).await? {
            return Err(ServiceError::not_found(PART, id));
        }
        self.projector.invalidate(template_id).await;
        tracing::info!(template_id = %template_id, part_id = %id, "part removed");
        Ok(())
    }

    /// Parts of a template ordered by part number.
    #[tracing::instrument(skip(self))]
    pub async fn parts_of(&self, template_id: TemplateId) -> Result<Vec<WorkflowPart>, ServiceError> {
        Ok(self.repo.parts_of(template_id).await?)
    }

    // ── assignments ─────────────────────────────────────────────────────

    /// Bind a master step to a position within a part.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn add_step_assignment(
        &self,
        req: NewAssignment,
    ) -> Result<StepAssignment, ServiceError> {
        let template_id = self.owner_of_part(req.workflow_part_id).await?;
        let _template = self.locks.write_template(template_id).await;
        let part = self.load_part(req.workflow_part_id).await?;

        let _step = self.locks.lock_master_step(req.master_step_id).await;
        let resolved = self.catalog.get_master_step(req.master_step_id).await?;
        let assignments = self.repo.assignments_of(part.id).await?;
        validate_new_assignment(&part, &assignments, &req, resolved.as_ref())?;

        let assignment = self.repo.create_assignment(req).await?;
        self.projector.invalidate(template_id).await;
        tracing::info!(
            template_id = %template_id,
            part_id = %part.id,
            assignment_id = %assignment.id,
            master_step_id = %assignment.master_step_id,
            order = assignment.order,
            "step assignment added"
        );
        Ok(assignment)
    }

    /// Move an assignment to another position or change its requiredness.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn update_step_assignment(
        &self,
        id: AssignmentId,
        patch: AssignmentPatch,
    ) -> Result<StepAssignment, ServiceError> {
        let template_id = self.owner_of_assignment(id).await?;
        let _guard = self.locks.write_template(template_id).await;
        let assignment = self.load_assignment(id).await?;
        let siblings = self.repo.assignments_of(assignment.workflow_part_id).await?;
        let next = validate_assignment_update(&assignment, &siblings, &patch)?;
        if next != assignment {
            self.repo.update_assignment(&next).await?;
            self.projector.invalidate(template_id).await;
            tracing::info!(
                template_id = %template_id,
                assignment_id = %id,
                order = next.order,
                "step assignment updated"
            );
        }
        Ok(next)
    }

    /// Remove a single assignment.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn remove_step_assignment(&self, id: AssignmentId) -> Result<(), ServiceError> {
        let template_id = self.owner_of_assignment(id).await?;
        let _guard = self.locks.write_template(template_id).await;
        if !self.repo.delete_assignment(id).await? {
            return Err(ServiceError::not_found(ASSIGNMENT, id));
        }
        self.projector.invalidate(template_id).await;
        tracing::info!(template_id = %template_id, assignment_id = %id, "step assignment removed");
        Ok(())
    }

    /// Assignments of a part ordered by position.
    #[tracing::instrument(skip(self))]
    pub async fn assignments_of(&self, part_id: PartId) -> Result<Vec<StepAssignment>, ServiceError> {
        Ok(self.repo.assignments_of(part_id).await?)
    }

    // ── reads ───────────────────────────────────────────────────────────

    /// Fully expanded template. See [`ReadProjector::get_template`].
    pub async fn get_template(&self, id: TemplateId) -> Result<Arc<TemplateView>, ServiceError> {
        self.projector.get_template(id).await
    }

    /// Template summaries. See [`ReadProjector::list_templates`].
    pub async fn list_templates(
        &self,
        filter: TemplateFilter,
    ) -> Result<Vec<TemplateSummary>, ServiceError> {
        self.projector.list_templates(filter).await
    }

    // ── helpers ─────────────────────────────────────────────────────────

    async fn load_template(&self, id: TemplateId) -> Result<WorkflowTemplate, ServiceError> {
        self.repo
            .get_template(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(TEMPLATE, id))
    }

    async fn load_part(&self, id: PartId) -> Result<WorkflowPart, ServiceError> {
        self.repo
            .get_part(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(PART, id))
    }

    async fn load_assignment(&self, id: AssignmentId) -> Result<StepAssignment, ServiceError> {
        self.repo
            .get_assignment(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ASSIGNMENT, id))
    }

    async fn owner_of_part(&self, id: PartId) -> Result<TemplateId, ServiceError> {
        Ok(self.load_part(id).await?.workflow_template_id)
    }

    async fn owner_of_assignment(&self, id: AssignmentId) -> Result<TemplateId, ServiceError> {
        let assignment = self.load_assignment(id).await?;
        self.owner_of_part(assignment.workflow_part_id).await
    }
}

impl std::fmt::Debug for TemplateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateService")
            .field("config", &self.config)
            .field("projector", &self.projector)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildline_core::MasterStepId;
    use buildline_repo_memory::{MemoryCatalog, MemoryTemplateRepo};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn unknown_ids_leave_no_lock_entries() {
        let service = TemplateService::new(
            Arc::new(MemoryTemplateRepo::new()),
            Arc::new(MemoryCatalog::new()),
            ServiceConfig::default(),
        );
        let catalog = service.catalog();
        let template = service
            .create_template(NewTemplate::new("Assembly", 1))
            .await
            .unwrap();
        let part = service
            .add_part(NewPart::new(template.id, 1, "Chassis"))
            .await
            .unwrap();

        for raw in 1000..2000 {
            let id = TemplateId::new(raw);
            assert!(service.get_template(id).await.is_err());
            assert!(service.delete_template(id).await.is_err());
            assert!(service.activate(id).await.is_err());
            let req = NewAssignment::new(part.id, MasterStepId::new(raw), 1);
            assert!(service.add_step_assignment(req).await.is_err());
            assert!(catalog.delete_master_step(MasterStepId::new(raw)).await.is_err());
        }
        assert_eq!(service.locks.tracked(), (0, 0));

        service.get_template(template.id).await.unwrap();
        service.delete_template(template.id).await.unwrap();
        assert_eq!(service.locks.tracked(), (0, 0));
    }
}
