#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Buildline Ports
//!
//! Backend interface traits (ports) for the Buildline template hierarchy.
//!
//! Drivers implement these; the service layer only ever sees trait objects:
//!
//! - [`TemplateRepo`] -- persistence for templates, parts, and step assignments
//! - [`CatalogStore`] -- read access to categories and master steps
//! - [`CatalogAdmin`] -- catalog mutations, used by the catalog service only
//!
//! All traits are `async_trait` and object-safe, suitable for use as
//! `Arc<dyn Trait>` behind dependency injection.

pub mod catalog;
pub mod error;
pub mod template;

pub use catalog::{CatalogAdmin, CatalogStore};
pub use error::{PortsError, UniqueConstraint};
pub use template::TemplateRepo;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check that every port is object-safe.
    #[test]
    fn traits_are_object_safe() {
        fn _assert_template_repo(_: &dyn TemplateRepo) {}
        fn _assert_catalog_store(_: &dyn CatalogStore) {}
        fn _assert_catalog_admin(_: &dyn CatalogAdmin) {}
    }

    /// Ports are shared across Tokio tasks as `Arc<dyn Trait>`.
    #[test]
    fn traits_work_as_arc_dyn() {
        use std::sync::Arc;
        fn _takes_template_repo(_: Arc<dyn TemplateRepo>) {}
        fn _takes_catalog_store(_: Arc<dyn CatalogStore>) {}
        fn _takes_catalog_admin(_: Arc<dyn CatalogAdmin>) {}
    }
}
