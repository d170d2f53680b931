//! Load Pipeline
//!
//! Everything between a resource name and a registered component type.
//!
//! # Pipeline Architecture
//!
//! ```text
//! resource ──► load_definition ──► ModuleResolver ──► ElementDefinitionHandle ──► register
//!                                        │
//!                                  TemplateRequest ──► load_template ──► Template
//!                                                                           │
//!                                                  create ──► ContentRoot::mount
//! ```
//!
//! ## Suspension Points
//!
//! Exactly two: the document fetch in [`load_template`] and the module
//! resolve in [`load_definition`]. Both are `LocalBoxFuture`s, so the whole
//! pipeline runs on a single-threaded executor.

pub mod definition;
pub mod loader;
pub mod mount;
pub mod sources;
pub mod template;

// Re-exports
pub use definition::{
    ElementDefinitionHandle, element_name_from_resource, load_definition, template_resource_for,
};
pub use loader::{Loader, LoaderConfig, ModuleRequest, ModuleResolver, TemplateRequest};
pub use mount::ContentRoot;
pub use sources::{DocumentMap, ModuleFactory, ModuleMap};
pub use template::{
    Document, DocumentSource, Template, has_extension, load_template, resolve_url, template_url,
};
