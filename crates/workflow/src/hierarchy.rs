//! A fully loaded template with its parts and assignments in display order.

use crate::assignment::StepAssignment;
use crate::part::WorkflowPart;
use crate::template::WorkflowTemplate;

/// A part together with its assignments, ordered by `order` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartHierarchy {
    /// The part record.
    pub part: WorkflowPart,
    /// Owned assignments, ordered by position.
    pub assignments: Vec<StepAssignment>,
}

/// A template with its parts ordered by `part_number` ascending, each part
/// carrying its assignments ordered by `order` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateHierarchy {
    /// The template record.
    pub template: WorkflowTemplate,
    /// Owned parts, ordered by part number.
    pub parts: Vec<PartHierarchy>,
}

impl TemplateHierarchy {
    /// Assemble a hierarchy from flat records.
    ///
    /// Parts not owned by `template` and assignments not owned by one of those
    /// parts are dropped.
    #[must_use]
    pub fn assemble(
        template: WorkflowTemplate,
        mut parts: Vec<WorkflowPart>,
        assignments: Vec<StepAssignment>,
    ) -> Self {
        parts.retain(|p| p.workflow_template_id == template.id);
        parts.sort_by_key(|p| (p.part_number, p.id));

        let mut nested: Vec<PartHierarchy> = parts
            .into_iter()
            .map(|part| PartHierarchy {
                part,
                assignments: Vec::new(),
            })
            .collect();

        for assignment in assignments {
            if let Some(owner) = nested
                .iter_mut()
                .find(|p| p.part.id == assignment.workflow_part_id)
            {
                owner.assignments.push(assignment);
            }
        }
        for part in &mut nested {
            part.assignments.sort_by_key(|a| (a.order, a.id));
        }

        Self {
            template,
            parts: nested,
        }
    }

    /// Number of parts the template currently owns.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Iterate over every assignment in display order.
    pub fn assignments(&self) -> impl Iterator<Item = &StepAssignment> {
        self.parts.iter().flat_map(|p| p.assignments.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildline_core::{AssignmentId, MasterStepId, PartId, TemplateId};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use crate::template::NewTemplate;

    fn part(id: u64, template: u64, number: u32) -> WorkflowPart {
        WorkflowPart {
            id: PartId::new(id),
            workflow_template_id: TemplateId::new(template),
            part_number: number,
            name: format!("part {number}"),
            description: None,
        }
    }

    fn assignment(id: u64, part: u64, order: u32) -> StepAssignment {
        StepAssignment {
            id: AssignmentId::new(id),
            workflow_part_id: PartId::new(part),
            master_step_id: MasterStepId::new(1),
            order,
            is_required: true,
        }
    }

    #[test]
    fn assemble_orders_parts_and_assignments() {
        let template = NewTemplate::new("Assembly", 3).into_template(TemplateId::new(1), Utc::now());
        let h = TemplateHierarchy::assemble(
            template,
            vec![part(10, 1, 3), part(11, 1, 1), part(12, 1, 2)],
            vec![
                assignment(1, 11, 2),
                assignment(2, 11, 1),
                assignment(3, 10, 5),
            ],
        );

        let numbers: Vec<u32> = h.parts.iter().map(|p| p.part.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let orders: Vec<u32> = h.parts[0].assignments.iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert!(h.parts[1].assignments.is_empty());
        assert_eq!(h.parts[2].assignments.len(), 1);
        assert_eq!(h.assignments().count(), 3);
    }

    #[test]
    fn assemble_drops_foreign_records() {
        let template = NewTemplate::new("Assembly", 2).into_template(TemplateId::new(1), Utc::now());
        let h = TemplateHierarchy::assemble(
            template,
            vec![part(10, 1, 1), part(20, 2, 1)],
            vec![assignment(1, 10, 1), assignment(2, 20, 1)],
        );
        assert_eq!(h.part_count(), 1);
        assert!(h.parts.iter().all(|p| p.part.id == PartId::new(10)));
        assert_eq!(h.assignments().count(), 1);
    }
}
