//! Catalog ports.
//!
//! The hierarchy reads categories and master steps but never mutates them;
//! mutations go through [`CatalogAdmin`], which only the catalog service holds.

use async_trait::async_trait;
use buildline_core::{CategoryId, MasterStepId};
use buildline_workflow::{Category, MasterStep, NewCategory, NewMasterStep};

use crate::error::PortsError;

/// Read-only access to the catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Get a category by id.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, PortsError>;

    /// All categories, ordered by id.
    async fn list_categories(&self) -> Result<Vec<Category>, PortsError>;

    /// Get a master step by id.
    async fn get_master_step(&self, id: MasterStepId) -> Result<Option<MasterStep>, PortsError>;

    /// All master steps, ordered by id.
    async fn list_master_steps(&self) -> Result<Vec<MasterStep>, PortsError>;

    /// Number of master steps filed under the category.
    async fn count_master_steps_in(&self, category_id: CategoryId) -> Result<usize, PortsError>;
}

/// Catalog mutations.
///
/// `create_category` and `update_category` reject a duplicate name with
/// [`PortsError::UniqueViolation`].
#[async_trait]
pub trait CatalogAdmin: CatalogStore {
    /// Persist a new category.
    async fn create_category(&self, category: NewCategory) -> Result<Category, PortsError>;

    /// Replace the stored category fields.
    async fn update_category(&self, category: &Category) -> Result<(), PortsError>;

    /// Delete a category. Returns `true` if it existed.
    async fn delete_category(&self, id: CategoryId) -> Result<bool, PortsError>;

    /// Persist a new master step.
    async fn create_master_step(&self, step: NewMasterStep) -> Result<MasterStep, PortsError>;

    /// Replace the stored master step fields.
    async fn update_master_step(&self, step: &MasterStep) -> Result<(), PortsError>;

    /// Delete a master step. Returns `true` if it existed.
    async fn delete_master_step(&self, id: MasterStepId) -> Result<bool, PortsError>;
}
