//! Component Primitives - definitions, types, instances.
//!
//! This module provides the component model:
//! - `types` - [`ComponentDefinition`] and the hook callback types
//! - `builder` - [`build`] a definition into an instantiable [`ComponentType`]
//! - `element` - [`Element`], one instance with its attribute and property surfaces
//! - `lifecycle` - created / attached / detached / attribute changed
//! - `dynamic` - the dynamic loader component
//!
//! # Architecture
//!
//! Definitions are plain data plus closures. Building freezes them into a
//! shared, immutable type; instances own only their field values, surfaces,
//! content root and extension state.
//!
//! ```ignore
//! let label = FieldDescriptor::new(FieldType::String);
//! let ty = build(&ComponentDefinition::new().field("label", label))?;
//! registry::define("x-label", &ty)?;
//!
//! let el = registry::create_element("x-label", [("label", "hi")])?;
//! assert_eq!(el.property("label"), Some(Value::from("hi")));
//! ```

mod builder;
mod dynamic;
mod element;
mod lifecycle;
mod types;

pub use builder::{ComponentType, build};
pub use dynamic::{
    DynamicElement, ErrorCallback, LoadCallback, LoadStatus, dynamic_element_definition, install,
};
pub use element::Element;
pub use types::*;
