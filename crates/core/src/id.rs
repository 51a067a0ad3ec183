//! Unique identifiers for Buildline entities.
//!
//! Every entity in the catalog and the template hierarchy is keyed by a
//! repository-assigned integer. Each identifier gets its own newtype so a
//! [`PartId`] can never be passed where a [`TemplateId`] is expected.
//!
//! All ID types are `Copy` (8 bytes) and support:
//! - `new(u64)` / `get()` for raw access
//! - `parse(&str)` and `FromStr` for string parsing
//! - Transparent serde (serializes as a bare number)
//! - `Display`, `Eq`, `Ord`, `Hash`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string does not hold a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {input:?}")]
pub struct IdParseError {
    /// Which identifier type was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw repository key.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw repository key.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Parse from a decimal string.
            pub fn parse(s: &str) -> Result<Self, IdParseError> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| IdParseError {
                        kind: stringify!($name),
                        input: s.to_owned(),
                    })
            }

            /// Name of the identifier type, for error messages.
            #[must_use]
            pub const fn domain(self) -> &'static str {
                stringify!($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a Category in the catalog.
    CategoryId
);
define_id!(
    /// Identifier of a reusable Master Step in the catalog.
    MasterStepId
);
define_id!(
    /// Identifier of a Workflow Template.
    TemplateId
);
define_id!(
    /// Identifier of a Workflow Part, owned by exactly one template.
    PartId
);
define_id!(
    /// Identifier of a Step Assignment, owned by exactly one part.
    AssignmentId
);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn id_new_and_get_roundtrip() {
        let id = TemplateId::new(42);
        assert_eq!(id.get(), 42);
        assert_eq!(u64::from(id), 42);
        assert_eq!(TemplateId::from(42), id);
    }

    #[test]
    fn id_parse_valid_string_succeeds() {
        let id = MasterStepId::parse("999").unwrap();
        assert_eq!(id.get(), 999);
        let trimmed: PartId = " 7 ".parse().unwrap();
        assert_eq!(trimmed, PartId::new(7));
    }

    #[test]
    fn id_parse_invalid_string_returns_error() {
        let err = PartId::parse("not-a-number").unwrap_err();
        assert_eq!(err.kind, "PartId");
        assert_eq!(err.to_string(), "invalid PartId: \"not-a-number\"");
    }

    #[test]
    fn id_display_outputs_bare_number() {
        assert_eq!(format!("{}", AssignmentId::new(3)), "3");
    }

    #[test]
    fn id_serde_is_transparent() {
        let id = CategoryId::new(5);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "5");
        let back: CategoryId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn id_domain_returns_type_name() {
        assert_eq!(TemplateId::new(1).domain(), "TemplateId");
    }

    #[test]
    fn id_ordering_follows_raw_value() {
        assert!(PartId::new(1) < PartId::new(2));
    }
}
