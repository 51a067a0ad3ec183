#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Buildline Core
//!
//! Identifier types shared by every Buildline crate.
//!
//! ## Key Components
//!
//! - **Catalog identifiers**: [`CategoryId`], [`MasterStepId`]
//! - **Hierarchy identifiers**: [`TemplateId`], [`PartId`], [`AssignmentId`]
//!
//! ## Usage
//!
//! ```rust
//! use buildline_core::{TemplateId, PartId};
//!
//! let template = TemplateId::new(7);
//! let part: PartId = "12".parse().unwrap();
//! assert_eq!(template.get(), 7);
//! assert_eq!(part.to_string(), "12");
//! ```

pub mod id;

pub use id::*;
