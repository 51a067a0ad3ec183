//! Template-level records.

use buildline_core::TemplateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::TemplateState;

/// A top-level named workflow definition with a declared number of parts.
///
/// `number_of_parts` is a declared target rather than a live count: the parts
/// actually owned may be fewer while the template is being assembled, but the
/// template can only be active once they match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    /// Repository-assigned identifier.
    pub id: TemplateId,
    /// Human-readable name; never empty.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Declared part count, at least 1.
    pub number_of_parts: u32,
    /// Whether the template is released for use.
    pub is_active: bool,
    /// Structural revision, starting at 1 and only ever increasing.
    pub version: u32,
    /// Set once at creation.
    pub created_date: DateTime<Utc>,
}

impl WorkflowTemplate {
    /// Lifecycle state derived from `is_active`.
    #[must_use]
    pub fn state(&self) -> TemplateState {
        if self.is_active {
            TemplateState::Active
        } else {
            TemplateState::Draft
        }
    }

    /// Returns `true` once `part_count` parts fill the declared count.
    #[must_use]
    pub fn is_complete(&self, part_count: usize) -> bool {
        part_count == self.number_of_parts as usize
    }
}

/// Input for creating a [`WorkflowTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    /// Human-readable name.
    pub name: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Declared part count.
    pub number_of_parts: u32,
    /// Initial structural revision.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Requested initial activation. A new template owns no parts, so `true`
    /// is always rejected.
    #[serde(default)]
    pub is_active: bool,
}

fn default_version() -> u32 {
    1
}

impl NewTemplate {
    /// Start a template request with the given name and declared part count.
    #[must_use]
    pub fn new(name: impl Into<String>, number_of_parts: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            number_of_parts,
            version: default_version(),
            is_active: false,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the starting version.
    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Request initial activation.
    #[must_use]
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Materialize the stored record once the repository has assigned an id.
    #[must_use]
    pub fn into_template(self, id: TemplateId, created_date: DateTime<Utc>) -> WorkflowTemplate {
        WorkflowTemplate {
            id,
            name: self.name,
            description: self.description,
            number_of_parts: self.number_of_parts,
            is_active: self.is_active,
            version: self.version,
            created_date,
        }
    }
}

/// Field-level patch for a [`WorkflowTemplate`]. Absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    #[serde(default, deserialize_with = "crate::serde_patch_opt::deserialize")]
    pub description: Option<Option<String>>,
    /// New declared part count.
    #[serde(default)]
    pub number_of_parts: Option<u32>,
    /// Activate (`true`) or deactivate (`false`).
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TemplatePatch {
    /// A patch that only toggles activation.
    #[must_use]
    pub fn activation(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// Set the new name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set or clear the description.
    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Set the declared part count.
    #[must_use]
    pub fn number_of_parts(mut self, number_of_parts: u32) -> Self {
        self.number_of_parts = Some(number_of_parts);
        self
    }

    /// Returns `true` if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.number_of_parts.is_none()
            && self.is_active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_template_defaults() {
        let req = NewTemplate::new("Assembly", 2);
        assert_eq!(req.version, 1);
        assert!(!req.is_active);
        assert!(req.description.is_none());
    }

    #[test]
    fn new_template_deserializes_with_defaults() {
        let req: NewTemplate =
            serde_json::from_str(r#"{"name": "Assembly", "numberOfParts": 2}"#).unwrap();
        assert_eq!(req, NewTemplate::new("Assembly", 2));
    }

    #[test]
    fn state_follows_is_active() {
        let mut template = NewTemplate::new("Assembly", 2).into_template(TemplateId::new(1), Utc::now());
        assert_eq!(template.state(), TemplateState::Draft);
        template.is_active = true;
        assert_eq!(template.state(), TemplateState::Active);
    }

    #[test]
    fn is_complete_compares_against_declared_count() {
        let template = NewTemplate::new("Assembly", 2).into_template(TemplateId::new(1), Utc::now());
        assert!(!template.is_complete(1));
        assert!(template.is_complete(2));
    }

    #[test]
    fn patch_emptiness() {
        assert!(TemplatePatch::default().is_empty());
        assert!(!TemplatePatch::activation(true).is_empty());
        assert!(!TemplatePatch::default().description(None).is_empty());
    }
}
