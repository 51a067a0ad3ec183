//! In-memory template repository.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use buildline_core::{AssignmentId, MasterStepId, PartId, TemplateId};
use buildline_ports::{PortsError, TemplateRepo, UniqueConstraint};
use buildline_workflow::{
    NewAssignment, NewPart, NewTemplate, StepAssignment, TemplateHierarchy, WorkflowPart,
    WorkflowTemplate,
};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;

const TEMPLATE: &str = "WorkflowTemplate";
const PART: &str = "WorkflowPart";
const ASSIGNMENT: &str = "WorkflowStepAssignment";

/// Everything one template owns, guarded together.
#[derive(Debug)]
struct Aggregate {
    template: WorkflowTemplate,
    parts: BTreeMap<PartId, WorkflowPart>,
    assignments: BTreeMap<AssignmentId, StepAssignment>,
    /// Set under the write lock by `delete_template`; late writers that
    /// already cloned the `Arc` must not resurrect children.
    deleted: bool,
}

impl Aggregate {
    fn new(template: WorkflowTemplate) -> Self {
        Self {
            template,
            parts: BTreeMap::new(),
            assignments: BTreeMap::new(),
            deleted: false,
        }
    }

    fn sorted_parts(&self) -> Vec<WorkflowPart> {
        let mut parts: Vec<WorkflowPart> = self.parts.values().cloned().collect();
        parts.sort_by_key(|p| (p.part_number, p.id));
        parts
    }

    fn sorted_assignments(&self, part_id: PartId) -> Vec<StepAssignment> {
        let mut assignments: Vec<StepAssignment> = self
            .assignments
            .values()
            .filter(|a| a.workflow_part_id == part_id)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| (a.order, a.id));
        assignments
    }

    fn order_taken(&self, part_id: PartId, order: u32, except: Option<AssignmentId>) -> bool {
        self.assignments.values().any(|a| {
            a.workflow_part_id == part_id && a.order == order && Some(a.id) != except
        })
    }
}

type Shared = Arc<RwLock<Aggregate>>;

/// In-memory [`TemplateRepo`].
///
/// Lookups by part or assignment id go through secondary indexes that map the
/// child to its owning template; every mutation then takes that template's
/// aggregate lock, so a cascade is a single critical section.
#[derive(Debug, Default)]
pub struct MemoryTemplateRepo {
    templates: DashMap<TemplateId, Shared>,
    part_index: DashMap<PartId, TemplateId>,
    assignment_index: DashMap<AssignmentId, TemplateId>,
    step_refs: DashMap<MasterStepId, usize>,
    next_template: AtomicU64,
    next_part: AtomicU64,
    next_assignment: AtomicU64,
}

impl MemoryTemplateRepo {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn aggregate(&self, id: TemplateId) -> Option<Shared> {
        self.templates.get(&id).map(|e| Arc::clone(e.value()))
    }

    fn aggregate_of_part(&self, id: PartId) -> Option<Shared> {
        let template_id = *self.part_index.get(&id)?.value();
        self.aggregate(template_id)
    }

    fn aggregate_of_assignment(&self, id: AssignmentId) -> Option<Shared> {
        let template_id = *self.assignment_index.get(&id)?.value();
        self.aggregate(template_id)
    }

    fn retain_step(&self, id: MasterStepId) {
        *self.step_refs.entry(id).or_insert(0) += 1;
    }

    fn release_step(&self, id: MasterStepId) {
        self.step_refs.remove_if_mut(&id, |_, count| {
            *count = count.saturating_sub(1);
            *count == 0
        });
    }

    /// Drop the indexes and reference counts of an assignment already
    /// removed from its aggregate.
    fn forget_assignment(&self, assignment: &StepAssignment) {
        self.assignment_index.remove(&assignment.id);
        self.release_step(assignment.master_step_id);
    }

    fn next_id(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl TemplateRepo for MemoryTemplateRepo {
    async fn get_template(&self, id: TemplateId) -> Result<Option<WorkflowTemplate>, PortsError> {
        Ok(self.aggregate(id).map(|agg| agg.read().template.clone()))
    }

    async fn list_templates(&self) -> Result<Vec<WorkflowTemplate>, PortsError> {
        let aggregates: Vec<Shared> = self.templates.iter().map(|e| Arc::clone(e.value())).collect();
        let mut templates: Vec<WorkflowTemplate> = aggregates
            .iter()
            .map(|agg| agg.read())
            .filter(|agg| !agg.deleted)
            .map(|agg| agg.template.clone())
            .collect();
        templates.sort_by_key(|t| t.id);
        Ok(templates)
    }

    async fn create_template(&self, template: NewTemplate) -> Result<WorkflowTemplate, PortsError> {
        let id = TemplateId::new(Self::next_id(&self.next_template));
        let record = template.into_template(id, Utc::now());
        self.templates
            .insert(id, Arc::new(RwLock::new(Aggregate::new(record.clone()))));
        tracing::debug!(template_id = %id, "stored template");
        Ok(record)
    }

    async fn update_template(&self, template: &WorkflowTemplate) -> Result<(), PortsError> {
        let agg = self
            .aggregate(template.id)
            .ok_or_else(|| PortsError::not_found(TEMPLATE, template.id))?;
        let mut agg = agg.write();
        if agg.deleted {
            return Err(PortsError::not_found(TEMPLATE, template.id));
        }
        let created_date = agg.template.created_date;
        agg.template = template.clone();
        agg.template.created_date = created_date;
        Ok(())
    }

    async fn delete_template(&self, id: TemplateId) -> Result<bool, PortsError> {
        let Some(agg) = self.aggregate(id) else {
            return Ok(false);
        };
        let mut agg = agg.write();
        if agg.deleted {
            return Ok(false);
        }
        agg.deleted = true;
        self.templates.remove(&id);

        let assignments = std::mem::take(&mut agg.assignments);
        for assignment in assignments.values() {
            self.forget_assignment(assignment);
        }
        let parts = std::mem::take(&mut agg.parts);
        for part_id in parts.keys() {
            self.part_index.remove(part_id);
        }
        tracing::debug!(
            template_id = %id,
            parts = parts.len(),
            assignments = assignments.len(),
            "deleted template with cascade"
        );
        Ok(true)
    }

    async fn get_part(&self, id: PartId) -> Result<Option<WorkflowPart>, PortsError> {
        Ok(self
            .aggregate_of_part(id)
            .and_then(|agg| agg.read().parts.get(&id).cloned()))
    }

    async fn parts_of(&self, template_id: TemplateId) -> Result<Vec<WorkflowPart>, PortsError> {
        let agg = self
            .aggregate(template_id)
            .ok_or_else(|| PortsError::not_found(TEMPLATE, template_id))?;
        let parts = agg.read().sorted_parts();
        Ok(parts)
    }

    async fn create_part(&self, part: NewPart) -> Result<WorkflowPart, PortsError> {
        let template_id = part.workflow_template_id;
        let agg = self
            .aggregate(template_id)
            .ok_or_else(|| PortsError::not_found(TEMPLATE, template_id))?;
        let mut agg = agg.write();
        if agg.deleted {
            return Err(PortsError::not_found(TEMPLATE, template_id));
        }
        if agg.parts.values().any(|p| p.part_number == part.part_number) {
            return Err(PortsError::UniqueViolation(UniqueConstraint::PartNumber {
                template_id,
                part_number: part.part_number,
            }));
        }

        let id = PartId::new(Self::next_id(&self.next_part));
        let record = part.into_part(id);
        agg.parts.insert(id, record.clone());
        self.part_index.insert(id, template_id);
        Ok(record)
    }

    async fn update_part(&self, part: &WorkflowPart) -> Result<(), PortsError> {
        let agg = self
            .aggregate_of_part(part.id)
            .ok_or_else(|| PortsError::not_found(PART, part.id))?;
        let mut agg = agg.write();
        let Some(stored) = agg.parts.get(&part.id) else {
            return Err(PortsError::not_found(PART, part.id));
        };
        let template_id = stored.workflow_template_id;
        if agg
            .parts
            .values()
            .any(|p| p.id != part.id && p.part_number == part.part_number)
        {
            return Err(PortsError::UniqueViolation(UniqueConstraint::PartNumber {
                template_id,
                part_number: part.part_number,
            }));
        }
        let mut next = part.clone();
        next.workflow_template_id = template_id;
        agg.parts.insert(part.id, next);
        Ok(())
    }

    async fn delete_part(&self, id: PartId) -> Result<bool, PortsError> {
        let Some(agg) = self.aggregate_of_part(id) else {
            return Ok(false);
        };
        let mut agg = agg.write();
        if agg.parts.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<AssignmentId> = agg
            .assignments
            .values()
            .filter(|a| a.workflow_part_id == id)
            .map(|a| a.id)
            .collect();
        for assignment_id in &owned {
            if let Some(assignment) = agg.assignments.remove(assignment_id) {
                self.forget_assignment(&assignment);
            }
        }
        self.part_index.remove(&id);
        tracing::debug!(part_id = %id, assignments = owned.len(), "deleted part with cascade");
        Ok(true)
    }

    async fn get_assignment(&self, id: AssignmentId) -> Result<Option<StepAssignment>, PortsError> {
        Ok(self
            .aggregate_of_assignment(id)
            .and_then(|agg| agg.read().assignments.get(&id).cloned()))
    }

    async fn assignments_of(&self, part_id: PartId) -> Result<Vec<StepAssignment>, PortsError> {
        let agg = self
            .aggregate_of_part(part_id)
            .ok_or_else(|| PortsError::not_found(PART, part_id))?;
        let agg = agg.read();
        if !agg.parts.contains_key(&part_id) {
            return Err(PortsError::not_found(PART, part_id));
        }
        Ok(agg.sorted_assignments(part_id))
    }

    async fn create_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<StepAssignment, PortsError> {
        let part_id = assignment.workflow_part_id;
        let agg = self
            .aggregate_of_part(part_id)
            .ok_or_else(|| PortsError::not_found(PART, part_id))?;
        let mut agg = agg.write();
        let Some(owner) = agg.parts.get(&part_id) else {
            return Err(PortsError::not_found(PART, part_id));
        };
        let template_id = owner.workflow_template_id;
        if agg.order_taken(part_id, assignment.order, None) {
            return Err(PortsError::UniqueViolation(
                UniqueConstraint::AssignmentOrder {
                    part_id,
                    order: assignment.order,
                },
            ));
        }

        let id = AssignmentId::new(Self::next_id(&self.next_assignment));
        let record = assignment.into_assignment(id);
        agg.assignments.insert(id, record.clone());
        self.assignment_index.insert(id, template_id);
        self.retain_step(record.master_step_id);
        Ok(record)
    }

    async fn update_assignment(&self, assignment: &StepAssignment) -> Result<(), PortsError> {
        let agg = self
            .aggregate_of_assignment(assignment.id)
            .ok_or_else(|| PortsError::not_found(ASSIGNMENT, assignment.id))?;
        let mut agg = agg.write();
        let Some(stored) = agg.assignments.get(&assignment.id) else {
            return Err(PortsError::not_found(ASSIGNMENT, assignment.id));
        };
        let part_id = stored.workflow_part_id;
        let master_step_id = stored.master_step_id;
        if agg.order_taken(part_id, assignment.order, Some(assignment.id)) {
            return Err(PortsError::UniqueViolation(
                UniqueConstraint::AssignmentOrder {
                    part_id,
                    order: assignment.order,
                },
            ));
        }
        let mut next = assignment.clone();
        next.workflow_part_id = part_id;
        next.master_step_id = master_step_id;
        agg.assignments.insert(assignment.id, next);
        Ok(())
    }

    async fn delete_assignment(&self, id: AssignmentId) -> Result<bool, PortsError> {
        let Some(agg) = self.aggregate_of_assignment(id) else {
            return Ok(false);
        };
        let mut agg = agg.write();
        match agg.assignments.remove(&id) {
            Some(assignment) => {
                self.forget_assignment(&assignment);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_assignments_referencing(
        &self,
        master_step_id: MasterStepId,
    ) -> Result<usize, PortsError> {
        Ok(self
            .step_refs
            .get(&master_step_id)
            .map_or(0, |count| *count.value()))
    }

    async fn count_parts(&self, template_id: TemplateId) -> Result<usize, PortsError> {
        let agg = self
            .aggregate(template_id)
            .ok_or_else(|| PortsError::not_found(TEMPLATE, template_id))?;
        let count = agg.read().parts.len();
        Ok(count)
    }

    async fn load_hierarchy(
        &self,
        template_id: TemplateId,
    ) -> Result<Option<TemplateHierarchy>, PortsError> {
        let Some(agg) = self.aggregate(template_id) else {
            return Ok(None);
        };
        let agg = agg.read();
        if agg.deleted {
            return Ok(None);
        }
        Ok(Some(TemplateHierarchy::assemble(
            agg.template.clone(),
            agg.parts.values().cloned().collect(),
            agg.assignments.values().cloned().collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn seeded() -> (MemoryTemplateRepo, WorkflowTemplate) {
        let repo = MemoryTemplateRepo::new();
        let template = repo
            .create_template(NewTemplate::new("Assembly", 2))
            .await
            .unwrap();
        (repo, template)
    }

    #[tokio::test]
    async fn create_template_assigns_sequential_ids() {
        let repo = MemoryTemplateRepo::new();
        let a = repo.create_template(NewTemplate::new("A", 1)).await.unwrap();
        let b = repo.create_template(NewTemplate::new("B", 1)).await.unwrap();
        assert_eq!(a.id, TemplateId::new(1));
        assert_eq!(b.id, TemplateId::new(2));
        assert_eq!(repo.list_templates().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_template_keeps_created_date() {
        let (repo, template) = seeded().await;
        let mut changed = template.clone();
        changed.name = "Renamed".into();
        changed.created_date = Utc::now() + chrono::Duration::days(1);
        repo.update_template(&changed).await.unwrap();

        let stored = repo.get_template(template.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.created_date, template.created_date);
    }

    #[tokio::test]
    async fn duplicate_part_number_is_a_constraint_violation() {
        let (repo, template) = seeded().await;
        repo.create_part(NewPart::new(template.id, 1, "Chassis"))
            .await
            .unwrap();
        let err = repo
            .create_part(NewPart::new(template.id, 1, "Again"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PortsError::UniqueViolation(UniqueConstraint::PartNumber { part_number: 1, .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_order_is_a_constraint_violation() {
        let (repo, template) = seeded().await;
        let part = repo
            .create_part(NewPart::new(template.id, 1, "Chassis"))
            .await
            .unwrap();
        repo.create_assignment(NewAssignment::new(part.id, MasterStepId::new(1), 1))
            .await
            .unwrap();
        let err = repo
            .create_assignment(NewAssignment::new(part.id, MasterStepId::new(2), 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PortsError::UniqueViolation(UniqueConstraint::AssignmentOrder { order: 1, .. })
        ));
    }

    #[tokio::test]
    async fn create_part_under_missing_template_fails() {
        let repo = MemoryTemplateRepo::new();
        let err = repo
            .create_part(NewPart::new(TemplateId::new(42), 1, "Orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_part_cascades_assignments_and_refs() {
        let (repo, template) = seeded().await;
        let part = repo
            .create_part(NewPart::new(template.id, 1, "Chassis"))
            .await
            .unwrap();
        let step = MasterStepId::new(7);
        let a = repo
            .create_assignment(NewAssignment::new(part.id, step, 1))
            .await
            .unwrap();
        repo.create_assignment(NewAssignment::new(part.id, step, 2))
            .await
            .unwrap();
        assert_eq!(repo.count_assignments_referencing(step).await.unwrap(), 2);

        assert!(repo.delete_part(part.id).await.unwrap());
        assert!(repo.get_part(part.id).await.unwrap().is_none());
        assert!(repo.get_assignment(a.id).await.unwrap().is_none());
        assert_eq!(repo.count_assignments_referencing(step).await.unwrap(), 0);
        assert!(!repo.delete_part(part.id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_template_cascades_everything() {
        let (repo, template) = seeded().await;
        let p1 = repo
            .create_part(NewPart::new(template.id, 1, "Chassis"))
            .await
            .unwrap();
        let p2 = repo
            .create_part(NewPart::new(template.id, 2, "Finish"))
            .await
            .unwrap();
        let a = repo
            .create_assignment(NewAssignment::new(p2.id, MasterStepId::new(3), 1))
            .await
            .unwrap();

        assert!(repo.delete_template(template.id).await.unwrap());
        assert!(repo.get_template(template.id).await.unwrap().is_none());
        assert!(repo.get_part(p1.id).await.unwrap().is_none());
        assert!(repo.get_part(p2.id).await.unwrap().is_none());
        assert!(repo.get_assignment(a.id).await.unwrap().is_none());
        assert_eq!(
            repo.count_assignments_referencing(MasterStepId::new(3))
                .await
                .unwrap(),
            0
        );
        assert!(repo.load_hierarchy(template.id).await.unwrap().is_none());
        assert!(!repo.delete_template(template.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_assignment_cannot_move_between_parts() {
        let (repo, template) = seeded().await;
        let p1 = repo
            .create_part(NewPart::new(template.id, 1, "Chassis"))
            .await
            .unwrap();
        let p2 = repo
            .create_part(NewPart::new(template.id, 2, "Finish"))
            .await
            .unwrap();
        let a = repo
            .create_assignment(NewAssignment::new(p1.id, MasterStepId::new(1), 1))
            .await
            .unwrap();

        let mut moved = a.clone();
        moved.workflow_part_id = p2.id;
        moved.order = 4;
        repo.update_assignment(&moved).await.unwrap();

        let stored = repo.get_assignment(a.id).await.unwrap().unwrap();
        assert_eq!(stored.workflow_part_id, p1.id);
        assert_eq!(stored.order, 4);
    }

    #[tokio::test]
    async fn load_hierarchy_returns_ordered_snapshot() {
        let (repo, template) = seeded().await;
        let p2 = repo
            .create_part(NewPart::new(template.id, 2, "Finish"))
            .await
            .unwrap();
        let p1 = repo
            .create_part(NewPart::new(template.id, 1, "Chassis"))
            .await
            .unwrap();
        repo.create_assignment(NewAssignment::new(p1.id, MasterStepId::new(1), 2))
            .await
            .unwrap();
        repo.create_assignment(NewAssignment::new(p1.id, MasterStepId::new(2), 1))
            .await
            .unwrap();

        let h = repo.load_hierarchy(template.id).await.unwrap().unwrap();
        assert_eq!(h.parts[0].part.id, p1.id);
        assert_eq!(h.parts[1].part.id, p2.id);
        let orders: Vec<u32> = h.parts[0].assignments.iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(repo.count_parts(template.id).await.unwrap(), 2);
        let violations = buildline_workflow::validate_hierarchy(&h, |_| true);
        assert!(violations.is_empty(), "{violations:?}");
    }
}
