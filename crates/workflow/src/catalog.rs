//! Catalog records: categories and master steps.
//!
//! The hierarchy only ever references these by id. They are created and
//! edited independently of any template.

use buildline_core::{CategoryId, MasterStepId};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// A classification tag attached to master steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Repository-assigned identifier.
    pub id: CategoryId,
    /// Unique, non-empty display name.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Display hint, opaque to the core (e.g. `"#1976d2"`).
    pub color: String,
}

/// Input for creating a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// Display name; must be non-empty.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Display hint.
    #[serde(default)]
    pub color: String,
}

impl NewCategory {
    /// Start a category request with the given name and color.
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: color.into(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check field-level constraints.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        require_name("category name", &self.name)
    }
}

/// Field-level patch for a [`Category`]. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    #[serde(default, deserialize_with = "crate::serde_patch_opt::deserialize")]
    pub description: Option<Option<String>>,
    /// New color.
    #[serde(default)]
    pub color: Option<String>,
}

impl CategoryPatch {
    /// Apply the patch to `category`, checking the resulting field values.
    pub fn apply_to(&self, category: &Category) -> Result<Category, WorkflowError> {
        let mut next = category.clone();
        if let Some(name) = &self.name {
            require_name("category name", name)?;
            next.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            next.description.clone_from(description);
        }
        if let Some(color) = &self.color {
            next.color.clone_from(color);
        }
        Ok(next)
    }
}

/// A reusable, catalog-level definition of a manufacturing action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterStep {
    /// Repository-assigned identifier.
    pub id: MasterStepId,
    /// Display name.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Expected duration; always greater than zero.
    pub estimated_time_minutes: u32,
    /// Owning category.
    pub category_id: CategoryId,
    /// Default requiredness; assignments may override it.
    pub is_required: bool,
}

/// Input for creating a [`MasterStep`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMasterStep {
    /// Display name; must be non-empty.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Expected duration in minutes; must be greater than zero.
    pub estimated_time_minutes: u32,
    /// Category the step belongs to; must exist.
    pub category_id: CategoryId,
    /// Default requiredness.
    #[serde(default = "default_required")]
    pub is_required: bool,
}

fn default_required() -> bool {
    true
}

impl NewMasterStep {
    /// Start a master step request.
    #[must_use]
    pub fn new(name: impl Into<String>, estimated_time_minutes: u32, category_id: CategoryId) -> Self {
        Self {
            name: name.into(),
            description: None,
            estimated_time_minutes,
            category_id,
            is_required: default_required(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the default requiredness.
    #[must_use]
    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    /// Check field-level constraints. Category existence is checked by the caller.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        require_name("master step name", &self.name)?;
        require_positive_minutes(self.estimated_time_minutes)
    }
}

/// Field-level patch for a [`MasterStep`]. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterStepPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    #[serde(default, deserialize_with = "crate::serde_patch_opt::deserialize")]
    pub description: Option<Option<String>>,
    /// New duration.
    #[serde(default)]
    pub estimated_time_minutes: Option<u32>,
    /// New category; must exist.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// New default requiredness.
    #[serde(default)]
    pub is_required: Option<bool>,
}

impl MasterStepPatch {
    /// Apply the patch to `step`, checking the resulting field values.
    pub fn apply_to(&self, step: &MasterStep) -> Result<MasterStep, WorkflowError> {
        let mut next = step.clone();
        if let Some(name) = &self.name {
            require_name("master step name", name)?;
            next.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            next.description.clone_from(description);
        }
        if let Some(minutes) = self.estimated_time_minutes {
            require_positive_minutes(minutes)?;
            next.estimated_time_minutes = minutes;
        }
        if let Some(category_id) = self.category_id {
            next.category_id = category_id;
        }
        if let Some(is_required) = self.is_required {
            next.is_required = is_required;
        }
        Ok(next)
    }
}

pub(crate) fn require_name(field: &str, value: &str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        return Err(WorkflowError::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_positive_minutes(minutes: u32) -> Result<(), WorkflowError> {
    if minutes == 0 {
        return Err(WorkflowError::invalid(
            "estimatedTimeMinutes must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn step() -> MasterStep {
        MasterStep {
            id: MasterStepId::new(1),
            name: "Mount CPU".into(),
            description: None,
            estimated_time_minutes: 5,
            category_id: CategoryId::new(1),
            is_required: true,
        }
    }

    #[test]
    fn new_category_requires_name() {
        assert!(NewCategory::new("Assembly", "#fff").validate().is_ok());
        let err = NewCategory::new("   ", "#fff").validate().unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidArgument(_)));
    }

    #[test]
    fn new_master_step_rejects_zero_minutes() {
        let err = NewMasterStep::new("Mount CPU", 0, CategoryId::new(1))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::invalid("estimatedTimeMinutes must be greater than zero")
        );
    }

    #[test]
    fn new_master_step_defaults_to_required() {
        let req = NewMasterStep::new("Mount CPU", 5, CategoryId::new(1));
        assert!(req.is_required);
        assert!(!req.required(false).is_required);
    }

    #[test]
    fn master_step_patch_applies_present_fields_only() {
        let patch = MasterStepPatch {
            estimated_time_minutes: Some(12),
            description: Some(Some("Seat and latch".into())),
            ..MasterStepPatch::default()
        };
        let next = patch.apply_to(&step()).unwrap();
        assert_eq!(next.name, "Mount CPU");
        assert_eq!(next.estimated_time_minutes, 12);
        assert_eq!(next.description.as_deref(), Some("Seat and latch"));
    }

    #[test]
    fn master_step_patch_rejects_empty_name() {
        let patch = MasterStepPatch {
            name: Some(String::new()),
            ..MasterStepPatch::default()
        };
        assert!(patch.apply_to(&step()).is_err());
    }

    #[test]
    fn category_patch_distinguishes_null_from_absent() {
        let cleared: CategoryPatch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
        let untouched: CategoryPatch = serde_json::from_str(r#"{"color": "red"}"#).unwrap();
        assert_eq!(untouched.description, None);
        assert_eq!(untouched.color.as_deref(), Some("red"));
    }

    #[test]
    fn master_step_serializes_camel_case() {
        let json = serde_json::to_value(step()).unwrap();
        assert_eq!(json["estimatedTimeMinutes"], 5);
        assert_eq!(json["categoryId"], 1);
        assert_eq!(json["isRequired"], true);
    }
}
