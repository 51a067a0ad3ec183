//! Catalog service: categories and master steps.

use std::sync::Arc;

use buildline_core::{CategoryId, MasterStepId};
use buildline_ports::{CatalogAdmin, TemplateRepo};
use buildline_workflow::validate::validate_deletion;
use buildline_workflow::{
    Category, CategoryPatch, MasterStep, MasterStepPatch, NewCategory, NewMasterStep,
    WorkflowError,
};

use crate::error::ServiceError;
use crate::locks::LockRegistry;
use crate::projector::ReadProjector;
use crate::view::CategorySummary;

const CATEGORY: &str = "Category";
const MASTER_STEP: &str = "MasterStep";

/// Manages catalog records and guards the references the hierarchy holds
/// into them.
///
/// Obtained from [`TemplateService::catalog`](crate::TemplateService::catalog)
/// so both services share master-step locks and the projection cache.
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogAdmin>,
    repo: Arc<dyn TemplateRepo>,
    locks: Arc<LockRegistry>,
    projector: Arc<ReadProjector>,
}

impl CatalogService {
    pub(crate) fn new(
        catalog: Arc<dyn CatalogAdmin>,
        repo: Arc<dyn TemplateRepo>,
        locks: Arc<LockRegistry>,
        projector: Arc<ReadProjector>,
    ) -> Self {
        Self {
            catalog,
            repo,
            locks,
            projector,
        }
    }

    // ── categories ──────────────────────────────────────────────────────

    /// Create a category with a unique name.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn create_category(&self, req: NewCategory) -> Result<Category, ServiceError> {
        req.validate()?;
        let category = self.catalog.create_category(req).await?;
        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    /// Apply a field-level patch to a category.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, ServiceError> {
        let current = self.get_category(id).await?;
        let next = patch.apply_to(&current)?;
        if next != current {
            self.catalog.update_category(&next).await?;
            tracing::info!(category_id = %id, "category updated");
        }
        Ok(next)
    }

    /// Delete a category no master step is filed under.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ServiceError> {
        let in_use = self.catalog.count_master_steps_in(id).await?;
        if in_use > 0 {
            return Err(WorkflowError::invalid(format!(
                "category {id} still has {in_use} master step(s)"
            ))
            .into());
        }
        if !self.catalog.delete_category(id).await? {
            return Err(ServiceError::not_found(CATEGORY, id));
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }

    /// Look up a category.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, ServiceError> {
        self.catalog
            .get_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(CATEGORY, id))
    }

    /// All categories with their master-step counts, ordered by id.
    pub async fn list_categories(&self) -> Result<Vec<CategorySummary>, ServiceError> {
        let categories = self.catalog.list_categories().await?;
        let mut summaries = Vec::with_capacity(categories.len());
        for category in categories {
            let master_steps_count = self.catalog.count_master_steps_in(category.id).await?;
            summaries.push(CategorySummary {
                category,
                master_steps_count,
            });
        }
        Ok(summaries)
    }

    // ── master steps ────────────────────────────────────────────────────

    /// Create a master step under an existing category.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn create_master_step(&self, req: NewMasterStep) -> Result<MasterStep, ServiceError> {
        req.validate()?;
        self.get_category(req.category_id).await?;
        let step = self.catalog.create_master_step(req).await?;
        tracing::info!(
            master_step_id = %step.id,
            category_id = %step.category_id,
            "master step created"
        );
        Ok(step)
    }

    /// Edit a master step. Every cached projection is dropped, since any of
    /// them may embed the old values.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn update_master_step(
        &self,
        id: MasterStepId,
        patch: MasterStepPatch,
    ) -> Result<MasterStep, ServiceError> {
        let current = self.get_master_step(id).await?;
        let next = patch.apply_to(&current)?;
        if next.category_id != current.category_id {
            self.get_category(next.category_id).await?;
        }
        if next != current {
            self.catalog.update_master_step(&next).await?;
            self.projector.invalidate_all();
            tracing::info!(master_step_id = %id, "master step updated");
        }
        Ok(next)
    }

    /// Delete a master step that no live assignment references.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn delete_master_step(&self, id: MasterStepId) -> Result<(), ServiceError> {
        let _guard = self.locks.lock_master_step(id).await;
        self.get_master_step(id).await?;
        let live = self.repo.count_assignments_referencing(id).await?;
        validate_deletion(id, live)?;

        if !self.catalog.delete_master_step(id).await? {
            return Err(ServiceError::not_found(MASTER_STEP, id));
        }
        tracing::info!(master_step_id = %id, "master step deleted");
        Ok(())
    }

    /// Look up a master step.
    pub async fn get_master_step(&self, id: MasterStepId) -> Result<MasterStep, ServiceError> {
        self.catalog
            .get_master_step(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(MASTER_STEP, id))
    }

    /// All master steps, ordered by id.
    pub async fn list_master_steps(&self) -> Result<Vec<MasterStep>, ServiceError> {
        Ok(self.catalog.list_master_steps().await?)
    }
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}
