#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Buildline Workflow
//!
//! The workflow-template hierarchy: **Template → Part → Step Assignment**, plus
//! the catalog records (Category, Master Step) that assignments point at.
//!
//! This crate is pure: no I/O, no locking. It provides:
//!
//! - [`WorkflowTemplate`], [`WorkflowPart`], [`StepAssignment`] and their
//!   create/patch request types
//! - [`Category`] and [`MasterStep`] catalog records
//! - [`TemplateHierarchy`] for an ordered, fully loaded template
//! - [`TemplateState`] for the Draft / Active / Deleted lifecycle
//! - the hierarchy validator in [`validate`], one check per invariant
//! - [`WorkflowError`], the typed rejection reasons

pub mod assignment;
pub mod catalog;
pub mod error;
pub mod hierarchy;
pub mod part;
pub mod state;
pub mod template;
pub mod validate;

pub use assignment::{AssignmentPatch, NewAssignment, StepAssignment};
pub use catalog::{Category, CategoryPatch, MasterStep, MasterStepPatch, NewCategory, NewMasterStep};
pub use error::WorkflowError;
pub use hierarchy::{PartHierarchy, TemplateHierarchy};
pub use part::{NewPart, PartPatch, WorkflowPart};
pub use state::TemplateState;
pub use template::{NewTemplate, TemplatePatch, WorkflowTemplate};
pub use validate::validate_hierarchy;

/// Serde helper for patch fields where `null` and "absent" mean different things.
///
/// Absent deserializes to `None` (leave unchanged) through `#[serde(default)]`;
/// an explicit `null` deserializes to `Some(None)` (clear the field).
pub(crate) mod serde_patch_opt {
    use serde::{Deserialize, Deserializer};

    /// Wrap whatever was present, including `null`, in `Some`.
    pub fn deserialize<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(d).map(Some)
    }
}
