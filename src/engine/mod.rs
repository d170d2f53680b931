//! Field Engine - typed fields, their string form, and the element registry.
//!
//! The engine owns the data rules every component type is built on:
//! - Catalog: string ↔ value conversion per [`FieldType`](crate::FieldType)
//! - FieldDescriptor: shared, immutable configuration of one field
//! - Sync: the single operation that changes a field and propagates it
//! - Registry: element name → component type, per thread
//!
//! # Synchronization
//!
//! ```text
//! attribute mutation ──┐                       ┌──► attribute surface (unless origin)
//!                      ├──► set_field ──► store├──► property surface  (unless origin)
//! property assignment ─┘                       └──► on_change hook
//! ```

mod catalog;
mod field;
mod sync;
pub mod registry;

pub use catalog::{deserialize, serialize};
pub use field::FieldDescriptor;
pub use sync::set_field;
pub(crate) use sync::sync_field;
