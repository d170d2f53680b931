//! # spark-elements
//!
//! Declarative component definitions for custom elements.
//!
//! A component is described once as data: typed fields, lifecycle hooks, an
//! optional template, an optional parent. Building the description yields a
//! component type whose instances keep each field's string attribute and
//! typed property in sync, mount their own copy of the template, and run the
//! author's hooks at the right lifecycle points.
//!
//! ## Architecture
//!
//! ```text
//! ComponentDefinition ──build──► ComponentType ──instantiate──► Element
//!                                      │                          │
//!                                 registry::define        attributes ⇄ fields ⇄ properties
//! ```
//!
//! Definitions can also be loaded asynchronously by resource name, with the
//! template found by naming convention, and a dynamic loader component does
//! all of that from a `src` attribute.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Value, FieldType, Origin, FieldFlags, LifecycleState)
//! - [`engine`] - Serialization catalog, field descriptors, field sync, registry
//! - [`primitives`] - Definitions, the type builder, elements, lifecycle, dynamic loader
//! - [`pipeline`] - Template and definition loading, mounting, loader collaborators
//! - [`error`] - Error types

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use engine::registry::{
    constructor_for, create_element, define, defined_names, is_defined, reset_registry,
};
pub use engine::{FieldDescriptor, deserialize, serialize, set_field};

pub use error::{BuildError, DefineError, ElementError, RegistryError, TemplateError};

pub use pipeline::{
    ContentRoot, Document, DocumentMap, DocumentSource, ElementDefinitionHandle, Loader,
    LoaderConfig, ModuleMap, ModuleRequest, ModuleResolver, Template, TemplateRequest,
    element_name_from_resource, load_definition, load_template,
};

pub use primitives::{
    ChangeHook, ComponentDefinition, ComponentType, DynamicElement, Element, LifecycleHook,
    LoadStatus, Method, build, install,
};
