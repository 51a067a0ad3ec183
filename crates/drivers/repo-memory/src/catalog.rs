//! In-memory catalog of categories and master steps.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use buildline_core::{CategoryId, MasterStepId};
use buildline_ports::{CatalogAdmin, CatalogStore, PortsError, UniqueConstraint};
use buildline_workflow::{Category, MasterStep, NewCategory, NewMasterStep};
use parking_lot::RwLock;

/// In-memory [`CatalogStore`] and [`CatalogAdmin`].
///
/// Category names are compared after trimming, case-sensitively.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    categories: RwLock<BTreeMap<CategoryId, Category>>,
    master_steps: RwLock<BTreeMap<MasterStepId, MasterStep>>,
    next_category: AtomicU64,
    next_master_step: AtomicU64,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_taken(
    categories: &BTreeMap<CategoryId, Category>,
    name: &str,
    except: Option<CategoryId>,
) -> bool {
    let name = name.trim();
    categories
        .values()
        .any(|c| c.name.trim() == name && Some(c.id) != except)
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, PortsError> {
        Ok(self.categories.read().get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, PortsError> {
        Ok(self.categories.read().values().cloned().collect())
    }

    async fn get_master_step(&self, id: MasterStepId) -> Result<Option<MasterStep>, PortsError> {
        Ok(self.master_steps.read().get(&id).cloned())
    }

    async fn list_master_steps(&self) -> Result<Vec<MasterStep>, PortsError> {
        Ok(self.master_steps.read().values().cloned().collect())
    }

    async fn count_master_steps_in(&self, category_id: CategoryId) -> Result<usize, PortsError> {
        Ok(self
            .master_steps
            .read()
            .values()
            .filter(|s| s.category_id == category_id)
            .count())
    }
}

#[async_trait]
impl CatalogAdmin for MemoryCatalog {
    async fn create_category(&self, category: NewCategory) -> Result<Category, PortsError> {
        let mut categories = self.categories.write();
        if name_taken(&categories, &category.name, None) {
            return Err(PortsError::UniqueViolation(UniqueConstraint::CategoryName {
                name: category.name,
            }));
        }
        let id = CategoryId::new(self.next_category.fetch_add(1, Ordering::Relaxed) + 1);
        let record = Category {
            id,
            name: category.name,
            description: category.description,
            color: category.color,
        };
        categories.insert(id, record.clone());
        Ok(record)
    }

    async fn update_category(&self, category: &Category) -> Result<(), PortsError> {
        let mut categories = self.categories.write();
        if !categories.contains_key(&category.id) {
            return Err(PortsError::not_found("Category", category.id));
        }
        if name_taken(&categories, &category.name, Some(category.id)) {
            return Err(PortsError::UniqueViolation(UniqueConstraint::CategoryName {
                name: category.name.clone(),
            }));
        }
        categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, PortsError> {
        Ok(self.categories.write().remove(&id).is_some())
    }

    async fn create_master_step(&self, step: NewMasterStep) -> Result<MasterStep, PortsError> {
        let id = MasterStepId::new(self.next_master_step.fetch_add(1, Ordering::Relaxed) + 1);
        let record = MasterStep {
            id,
            name: step.name,
            description: step.description,
            estimated_time_minutes: step.estimated_time_minutes,
            category_id: step.category_id,
            is_required: step.is_required,
        };
        self.master_steps.write().insert(id, record.clone());
        Ok(record)
    }

    async fn update_master_step(&self, step: &MasterStep) -> Result<(), PortsError> {
        let mut steps = self.master_steps.write();
        match steps.get_mut(&step.id) {
            Some(stored) => {
                *stored = step.clone();
                Ok(())
            }
            None => Err(PortsError::not_found("MasterStep", step.id)),
        }
    }

    async fn delete_master_step(&self, id: MasterStepId) -> Result<bool, PortsError> {
        Ok(self.master_steps.write().remove(&id).is_some())
    }
}
