#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Buildline Memory Drivers
//!
//! In-memory implementations of the [`TemplateRepo`], [`CatalogStore`], and
//! [`CatalogAdmin`] ports.
//!
//! Each template lives in its own aggregate (template + parts + assignments)
//! behind its own lock, so writes to one template never contend with reads or
//! writes on another. Uniqueness of part numbers and assignment orders is
//! enforced inside the aggregate lock, which makes it a storage-boundary
//! constraint independent of any service-level locking.
//!
//! Suitable for tests, desktop, and single-process deployments where
//! durability is not required.
//!
//! # Examples
//!
//! ```rust,no_run
//! use buildline_repo_memory::MemoryTemplateRepo;
//! use buildline_ports::TemplateRepo;
//! use buildline_workflow::NewTemplate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = MemoryTemplateRepo::new();
//! let template = repo.create_template(NewTemplate::new("Assembly", 2)).await?;
//! assert!(repo.parts_of(template.id).await?.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! [`TemplateRepo`]: buildline_ports::TemplateRepo
//! [`CatalogStore`]: buildline_ports::CatalogStore
//! [`CatalogAdmin`]: buildline_ports::CatalogAdmin

mod catalog;
mod template;

pub use catalog::MemoryCatalog;
pub use template::MemoryTemplateRepo;
