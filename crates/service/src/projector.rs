//! Read projector: expands a template into its display shape and caches it.
//!
//! Cached projections are keyed by template id. Writers invalidate the entry
//! while holding the template's write lock; a reader that misses loads and
//! inserts while holding the read lock, so an insert can never land after an
//! invalidation it raced with.
//!
//! Catalog edits affect every projection that embeds the edited master step.
//! Those bump a generation counter instead of taking template locks: an entry
//! tagged with an older generation is treated as a miss.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use buildline_core::{MasterStepId, TemplateId};
use buildline_ports::{CatalogStore, PortsError, TemplateRepo};
use buildline_workflow::{MasterStep, TemplateHierarchy, validate_hierarchy};
use moka::future::Cache;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::locks::LockRegistry;
use crate::view::{
    AssignmentView, MasterStepSnapshot, PartView, TemplateFilter, TemplateSummary, TemplateView,
};

#[derive(Debug, Clone)]
struct CachedView {
    generation: u64,
    view: Arc<TemplateView>,
}

/// Projection cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to load from the repository.
    pub misses: u64,
    /// Entries currently held (approximate).
    pub size: u64,
}

/// Builds [`TemplateView`]s and [`TemplateSummary`]s from repository state.
pub struct ReadProjector {
    repo: Arc<dyn TemplateRepo>,
    catalog: Arc<dyn CatalogStore>,
    locks: Arc<LockRegistry>,
    cache: Option<Cache<TemplateId, CachedView>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReadProjector {
    pub(crate) fn new(
        repo: Arc<dyn TemplateRepo>,
        catalog: Arc<dyn CatalogStore>,
        locks: Arc<LockRegistry>,
        config: &ServiceConfig,
    ) -> Self {
        let cache = (config.projection_cache_capacity > 0).then(|| {
            let mut builder = Cache::builder().max_capacity(config.projection_cache_capacity);
            if let Some(ttl) = config.projection_cache_ttl {
                builder = builder.time_to_live(ttl);
            }
            builder.build()
        });
        Self {
            repo,
            catalog,
            locks,
            cache,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Load a template with its parts and assignments in display order.
    #[tracing::instrument(skip(self))]
    pub async fn get_template(&self, id: TemplateId) -> Result<Arc<TemplateView>, ServiceError> {
        if let Some(view) = self.cached(id).await {
            return Ok(view);
        }

        let _guard = self.locks.read_template(id).await;
        let generation = self.generation.load(Ordering::Acquire);
        let hierarchy = self
            .repo
            .load_hierarchy(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("WorkflowTemplate", id))?;
        let view = Arc::new(self.project(&hierarchy).await?);

        if let Some(cache) = &self.cache {
            cache
                .insert(
                    id,
                    CachedView {
                        generation,
                        view: Arc::clone(&view),
                    },
                )
                .await;
        }
        Ok(view)
    }

    /// Templates matching `filter`, without parts, ordered by id.
    #[tracing::instrument(skip(self))]
    pub async fn list_templates(
        &self,
        filter: TemplateFilter,
    ) -> Result<Vec<TemplateSummary>, ServiceError> {
        let templates = self.repo.list_templates().await?;
        let mut summaries = Vec::with_capacity(templates.len());
        for template in templates.into_iter().filter(|t| filter.matches(t)) {
            let part_count = match self.repo.count_parts(template.id).await {
                Ok(count) => count,
                // Deleted between the listing and the count.
                Err(PortsError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            };
            summaries.push(TemplateSummary::new(template, part_count));
        }
        summaries.sort_by_key(|s| s.id);
        Ok(summaries)
    }

    /// Expand a loaded hierarchy, resolving every referenced master step.
    ///
    /// A master step that no longer resolves yields `master_step: None`.
    /// Stored state that breaks a hierarchy invariant is still projected, with
    /// one warning per violation.
    pub async fn project(&self, hierarchy: &TemplateHierarchy) -> Result<TemplateView, ServiceError> {
        let wanted: BTreeSet<MasterStepId> =
            hierarchy.assignments().map(|a| a.master_step_id).collect();
        let mut steps: HashMap<MasterStepId, MasterStep> = HashMap::with_capacity(wanted.len());
        for id in wanted {
            if let Some(step) = self.catalog.get_master_step(id).await? {
                steps.insert(id, step);
            }
        }
        for violation in validate_hierarchy(hierarchy, |id| steps.contains_key(&id)) {
            tracing::warn!(
                template_id = %hierarchy.template.id,
                %violation,
                "stored hierarchy violates an invariant"
            );
        }

        let parts: Vec<PartView> = hierarchy
            .parts
            .iter()
            .map(|p| {
                let step_assignments: Vec<AssignmentView> = p
                    .assignments
                    .iter()
                    .map(|a| AssignmentView {
                        id: a.id,
                        workflow_part_id: a.workflow_part_id,
                        order: a.order,
                        is_required: a.is_required,
                        master_step_id: a.master_step_id,
                        master_step: steps.get(&a.master_step_id).map(MasterStepSnapshot::from),
                    })
                    .collect();
                PartView {
                    id: p.part.id,
                    workflow_template_id: p.part.workflow_template_id,
                    part_number: p.part.part_number,
                    name: p.part.name.clone(),
                    description: p.part.description.clone(),
                    total_estimated_minutes: total_minutes(&step_assignments),
                    step_assignments,
                }
            })
            .collect();

        let template = &hierarchy.template;
        Ok(TemplateView {
            id: template.id,
            name: template.name.clone(),
            description: template.description.clone(),
            number_of_parts: template.number_of_parts,
            is_active: template.is_active,
            version: template.version,
            created_date: template.created_date,
            state: template.state(),
            total_estimated_minutes: parts.iter().map(|p| p.total_estimated_minutes).sum(),
            parts,
        })
    }

    /// Cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.cache.as_ref().map_or(0, |c| c.entry_count()),
        }
    }

    async fn cached(&self, id: TemplateId) -> Option<Arc<TemplateView>> {
        let cache = self.cache.as_ref()?;
        let current = self.generation.load(Ordering::Acquire);
        match cache.get(&id).await {
            Some(entry) if entry.generation == current => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(template_id = %id, "projection cache hit");
                Some(entry.view)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(template_id = %id, "projection cache miss");
                None
            }
        }
    }

    /// Drop the cached projection of one template. Callers hold its write lock.
    pub(crate) async fn invalidate(&self, id: TemplateId) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&id).await;
        }
    }

    /// Drop every cached projection after a catalog edit has committed.
    pub(crate) fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}

fn total_minutes(assignments: &[AssignmentView]) -> u64 {
    assignments
        .iter()
        .filter_map(|a| a.master_step.as_ref())
        .map(|s| u64::from(s.estimated_time_minutes))
        .sum()
}

impl std::fmt::Debug for ReadProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadProjector")
            .field("cached", &self.cache.is_some())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildline_repo_memory::{MemoryCatalog, MemoryTemplateRepo};
    use buildline_ports::CatalogAdmin;
    use buildline_workflow::{NewAssignment, NewCategory, NewMasterStep, NewPart, NewTemplate};
    use pretty_assertions::assert_eq;

    struct Fixture {
        repo: Arc<MemoryTemplateRepo>,
        catalog: Arc<MemoryCatalog>,
        projector: ReadProjector,
    }

    fn fixture(config: &ServiceConfig) -> Fixture {
        let repo = Arc::new(MemoryTemplateRepo::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let projector = ReadProjector::new(
            repo.clone(),
            catalog.clone(),
            Arc::new(LockRegistry::new()),
            config,
        );
        Fixture {
            repo,
            catalog,
            projector,
        }
    }

    #[tokio::test]
    async fn unresolved_master_step_projects_as_none() {
        let f = fixture(&ServiceConfig::uncached());
        let category = f
            .catalog
            .create_category(NewCategory::new("Assembly", "#1976d2"))
            .await
            .unwrap();
        let step = f
            .catalog
            .create_master_step(NewMasterStep::new("Mount CPU", 5, category.id))
            .await
            .unwrap();
        let template = f.repo.create_template(NewTemplate::new("Desktop", 1)).await.unwrap();
        let part = f
            .repo
            .create_part(NewPart::new(template.id, 1, "Board"))
            .await
            .unwrap();
        f.repo
            .create_assignment(NewAssignment::new(part.id, step.id, 1))
            .await
            .unwrap();
        // Written straight to the driver, so nothing guards the reference.
        f.repo
            .create_assignment(NewAssignment::new(part.id, MasterStepId::new(999), 2))
            .await
            .unwrap();

        let view = f.projector.get_template(template.id).await.unwrap();
        let assignments = &view.parts[0].step_assignments;
        assert_eq!(assignments[0].master_step.as_ref().map(|s| s.name.as_str()), Some("Mount CPU"));
        assert_eq!(assignments[1].master_step, None);
        assert_eq!(view.parts[0].total_estimated_minutes, 5);
        assert_eq!(view.total_estimated_minutes, 5);
    }

    #[tokio::test]
    async fn second_read_is_a_cache_hit() {
        let f = fixture(&ServiceConfig::default());
        let template = f.repo.create_template(NewTemplate::new("Desktop", 1)).await.unwrap();

        let first = f.projector.get_template(template.id).await.unwrap();
        let second = f.projector.get_template(template.id).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        let stats = f.projector.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn generation_bump_turns_entries_stale() {
        let f = fixture(&ServiceConfig::default());
        let template = f.repo.create_template(NewTemplate::new("Desktop", 1)).await.unwrap();

        let first = f.projector.get_template(template.id).await.unwrap();
        f.projector.invalidate_all();
        let second = f.projector.get_template(template.id).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(f.projector.stats().hits, 0);
    }

    #[tokio::test]
    async fn missing_template_is_not_found() {
        let f = fixture(&ServiceConfig::default());
        let err = f.projector.get_template(TemplateId::new(7)).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }
}
