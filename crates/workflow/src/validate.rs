//! Hierarchy validation.
//!
//! Every check is a pure function over already-loaded state plus a proposed
//! change. Callers hold whatever lock makes that state current, run the
//! relevant check, and only then commit.

use std::collections::HashSet;

use buildline_core::MasterStepId;

use crate::assignment::{AssignmentPatch, NewAssignment, StepAssignment};
use crate::catalog::{MasterStep, require_name};
use crate::error::WorkflowError;
use crate::hierarchy::TemplateHierarchy;
use crate::part::{NewPart, PartPatch, WorkflowPart};
use crate::state::TemplateState;
use crate::template::{NewTemplate, TemplatePatch, WorkflowTemplate};

/// Check a part number against the template's current parts.
///
/// Fails with `DuplicatePartNumber` if a part already uses the number and with
/// `CapacityExceeded` if the template already owns its declared count.
pub fn validate_part_number(
    template: &WorkflowTemplate,
    parts: &[WorkflowPart],
    candidate: u32,
) -> Result<(), WorkflowError> {
    require_position("partNumber", candidate)?;
    if parts.iter().any(|p| p.part_number == candidate) {
        return Err(WorkflowError::DuplicatePartNumber {
            template_id: template.id,
            part_number: candidate,
        });
    }
    if parts.len() >= template.number_of_parts as usize {
        return Err(WorkflowError::CapacityExceeded {
            template_id: template.id,
            number_of_parts: template.number_of_parts,
        });
    }
    Ok(())
}

/// Check an assignment position against the part's current assignments.
pub fn validate_assignment_order(
    part: &WorkflowPart,
    assignments: &[StepAssignment],
    candidate: u32,
) -> Result<(), WorkflowError> {
    require_position("order", candidate)?;
    if assignments.iter().any(|a| a.order == candidate) {
        return Err(WorkflowError::DuplicateOrder {
            part_id: part.id,
            order: candidate,
        });
    }
    Ok(())
}

/// Check that a master step id resolved in the catalog.
pub fn validate_master_step_reference(
    id: MasterStepId,
    resolved: Option<&MasterStep>,
) -> Result<(), WorkflowError> {
    match resolved {
        Some(step) if step.id == id => Ok(()),
        _ => Err(WorkflowError::UnknownMasterStep(id)),
    }
}

/// Check that a template owning `part_count` parts may be active.
pub fn validate_activation(
    template: &WorkflowTemplate,
    part_count: usize,
) -> Result<(), WorkflowError> {
    if template.is_complete(part_count) {
        Ok(())
    } else {
        Err(WorkflowError::IncompleteHierarchy {
            expected: template.number_of_parts,
            actual: part_count,
        })
    }
}

/// Check that no live assignment still points at the master step.
pub fn validate_deletion(
    master_step_id: MasterStepId,
    live_references: usize,
) -> Result<(), WorkflowError> {
    if live_references == 0 {
        Ok(())
    } else {
        Err(WorkflowError::ReferencedByAssignment {
            master_step_id,
            assignments: live_references,
        })
    }
}

/// Check a create-template request.
pub fn validate_new_template(req: &NewTemplate, max_parts: u32) -> Result<(), WorkflowError> {
    require_name("template name", &req.name)?;
    require_part_count(req.number_of_parts, max_parts)?;
    if req.version < 1 {
        return Err(WorkflowError::invalid("version must be at least 1"));
    }
    if req.is_active {
        // A new template owns no parts yet.
        return Err(WorkflowError::IncompleteHierarchy {
            expected: req.number_of_parts,
            actual: 0,
        });
    }
    Ok(())
}

/// Apply a field patch to a template and return the record to commit.
///
/// The version is bumped by exactly one when the patch changes at least one
/// structural field (name, description, number of parts). Toggling
/// activation alone leaves the version unchanged.
pub fn validate_template_update(
    current: &WorkflowTemplate,
    part_count: usize,
    patch: &TemplatePatch,
    max_parts: u32,
) -> Result<WorkflowTemplate, WorkflowError> {
    let mut next = current.clone();

    if let Some(name) = &patch.name {
        require_name("template name", name)?;
        next.name.clone_from(name);
    }
    if let Some(description) = &patch.description {
        next.description.clone_from(description);
    }
    if let Some(number_of_parts) = patch.number_of_parts {
        require_part_count(number_of_parts, max_parts)?;
        if (number_of_parts as usize) < part_count {
            return Err(WorkflowError::invalid(format!(
                "numberOfParts {number_of_parts} is below the {part_count} parts already present"
            )));
        }
        next.number_of_parts = number_of_parts;
    }
    if let Some(is_active) = patch.is_active {
        next.is_active = is_active;
    }

    if next.is_active {
        validate_activation(&next, part_count)?;
    }

    let structural = next.name != current.name
        || next.description != current.description
        || next.number_of_parts != current.number_of_parts;
    if structural {
        next.version = current
            .version
            .checked_add(1)
            .ok_or_else(|| WorkflowError::invalid("version overflow"))?;
    }

    Ok(next)
}

/// Check that a template may move to `Deleted` and return the state it
/// leaves.
pub fn validate_template_deletion(
    template: &WorkflowTemplate,
) -> Result<TemplateState, WorkflowError> {
    let from = template.state();
    if from.is_terminal() || !from.can_transition_to(TemplateState::Deleted) {
        return Err(WorkflowError::invalid(format!(
            "template {} cannot move from {from} to {}",
            template.id,
            TemplateState::Deleted
        )));
    }
    Ok(from)
}

/// Check an add-part request against the owning template.
pub fn validate_new_part(
    template: &WorkflowTemplate,
    parts: &[WorkflowPart],
    req: &NewPart,
) -> Result<(), WorkflowError> {
    if req.workflow_template_id != template.id {
        return Err(WorkflowError::invalid(
            "part request targets a different template",
        ));
    }
    require_name("part name", &req.name)?;
    validate_part_number(template, parts, req.part_number)
}

/// Apply a part patch and return the record to commit.
///
/// Renumbering is checked against the other parts of the same template only;
/// capacity is not re-checked because the part already counts toward it.
pub fn validate_part_update(
    part: &WorkflowPart,
    siblings: &[WorkflowPart],
    patch: &PartPatch,
) -> Result<WorkflowPart, WorkflowError> {
    let mut next = part.clone();
    if let Some(name) = &patch.name {
        require_name("part name", name)?;
        next.name.clone_from(name);
    }
    if let Some(description) = &patch.description {
        next.description.clone_from(description);
    }
    if let Some(part_number) = patch.part_number {
        require_position("partNumber", part_number)?;
        if siblings
            .iter()
            .any(|p| p.id != part.id && p.part_number == part_number)
        {
            return Err(WorkflowError::DuplicatePartNumber {
                template_id: part.workflow_template_id,
                part_number,
            });
        }
        next.part_number = part_number;
    }
    Ok(next)
}

/// Check that a part may be removed from its template.
///
/// An active template must keep its full part count, so it has to be
/// deactivated first.
pub fn validate_part_removal(
    template: &WorkflowTemplate,
    part_count: usize,
) -> Result<(), WorkflowError> {
    if template.is_active {
        return Err(WorkflowError::IncompleteHierarchy {
            expected: template.number_of_parts,
            actual: part_count.saturating_sub(1),
        });
    }
    Ok(())
}

/// Check an add-assignment request against the owning part and the catalog.
pub fn validate_new_assignment(
    part: &WorkflowPart,
    assignments: &[StepAssignment],
    req: &NewAssignment,
    resolved: Option<&MasterStep>,
) -> Result<(), WorkflowError> {
    if req.workflow_part_id != part.id {
        return Err(WorkflowError::invalid(
            "assignment request targets a different part",
        ));
    }
    validate_assignment_order(part, assignments, req.order)?;
    validate_master_step_reference(req.master_step_id, resolved)
}

/// Apply a reorder / requiredness patch and return the record to commit.
pub fn validate_assignment_update(
    assignment: &StepAssignment,
    siblings: &[StepAssignment],
    patch: &AssignmentPatch,
) -> Result<StepAssignment, WorkflowError> {
    let mut next = assignment.clone();
    if let Some(order) = patch.order {
        require_position("order", order)?;
        if siblings
            .iter()
            .any(|a| a.id != assignment.id && a.order == order)
        {
            return Err(WorkflowError::DuplicateOrder {
                part_id: assignment.workflow_part_id,
                order,
            });
        }
        next.order = order;
    }
    if let Some(is_required) = patch.is_required {
        next.is_required = is_required;
    }
    Ok(next)
}

/// Validate a whole hierarchy, collecting every violation instead of stopping
/// at the first.
///
/// `master_step_exists` answers whether an id resolves in the catalog.
#[must_use]
pub fn validate_hierarchy(
    hierarchy: &TemplateHierarchy,
    master_step_exists: impl Fn(MasterStepId) -> bool,
) -> Vec<WorkflowError> {
    let template = &hierarchy.template;
    let mut errors = Vec::new();

    // 1. Template fields
    if template.name.trim().is_empty() {
        errors.push(WorkflowError::invalid("template name must not be empty"));
    }
    if template.number_of_parts < 1 {
        errors.push(WorkflowError::invalid("numberOfParts must be at least 1"));
    }
    if template.version < 1 {
        errors.push(WorkflowError::invalid("version must be at least 1"));
    }

    // 2. Capacity and activation
    if hierarchy.part_count() > template.number_of_parts as usize {
        errors.push(WorkflowError::CapacityExceeded {
            template_id: template.id,
            number_of_parts: template.number_of_parts,
        });
    }
    if template.is_active
        && let Err(e) = validate_activation(template, hierarchy.part_count())
    {
        errors.push(e);
    }

    // 3. Part numbers
    let mut seen_numbers = HashSet::new();
    for part in &hierarchy.parts {
        if !seen_numbers.insert(part.part.part_number) {
            errors.push(WorkflowError::DuplicatePartNumber {
                template_id: template.id,
                part_number: part.part.part_number,
            });
        }

        // 4. Assignment orders and references within the part
        let mut seen_orders = HashSet::new();
        for assignment in &part.assignments {
            if !seen_orders.insert(assignment.order) {
                errors.push(WorkflowError::DuplicateOrder {
                    part_id: part.part.id,
                    order: assignment.order,
                });
            }
            if !master_step_exists(assignment.master_step_id) {
                errors.push(WorkflowError::UnknownMasterStep(assignment.master_step_id));
            }
        }
    }

    errors
}

fn require_position(field: &str, value: u32) -> Result<(), WorkflowError> {
    if value < 1 {
        return Err(WorkflowError::invalid(format!("{field} must be at least 1")));
    }
    Ok(())
}

fn require_part_count(number_of_parts: u32, max_parts: u32) -> Result<(), WorkflowError> {
    if number_of_parts < 1 {
        return Err(WorkflowError::invalid("numberOfParts must be at least 1"));
    }
    if number_of_parts > max_parts {
        return Err(WorkflowError::invalid(format!(
            "numberOfParts {number_of_parts} exceeds the limit of {max_parts}"
        )));
    }
    Ok(())
}
