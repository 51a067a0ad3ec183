#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Buildline Service
//!
//! Orchestrates the hierarchy validator and the repository ports into the
//! public operations on workflow templates.
//!
//! - [`TemplateService`]: create / patch / activate / delete templates, add,
//!   renumber and remove parts, add, reorder and remove step assignments
//! - [`CatalogService`]: category and master-step administration, including
//!   the guard against deleting a master step that is still assigned
//! - [`ReadProjector`]: expanded [`TemplateView`]s with master-step snapshots,
//!   cached per template and invalidated by every committed write
//!
//! Writes to one template are serialized by a per-template lock; nothing is
//! locked globally, so unrelated templates never wait on each other.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use buildline_repo_memory::{MemoryCatalog, MemoryTemplateRepo};
//! use buildline_service::{ServiceConfig, TemplateService};
//! use buildline_workflow::{NewPart, NewTemplate};
//!
//! # async fn example() -> Result<(), buildline_service::ServiceError> {
//! let service = TemplateService::new(
//!     Arc::new(MemoryTemplateRepo::new()),
//!     Arc::new(MemoryCatalog::new()),
//!     ServiceConfig::from_env(),
//! );
//! let template = service.create_template(NewTemplate::new("Assembly", 1)).await?;
//! service.add_part(NewPart::new(template.id, 1, "Chassis")).await?;
//! service.activate(template.id).await?;
//! # Ok(())
//! # }
//! ```

mod catalog;
pub mod config;
mod error;
mod locks;
mod projector;
mod service;
mod view;

pub use catalog::CatalogService;
pub use config::ServiceConfig;
pub use error::{ErrorKind, ServiceError};
pub use projector::{CacheStats, ReadProjector};
pub use service::TemplateService;
pub use view::{
    AssignmentView, CategorySummary, MasterStepSnapshot, PartView, TemplateFilter,
    TemplateSummary, TemplateView,
};
