//! Element Registry - element name → component type.
//!
//! Append-mostly: once a name is defined its type never changes. Redefining a
//! name with the very same type is accepted; any other type is rejected with
//! [`RegistryError::AlreadyRegistered`]. Looking up an undefined name through
//! [`constructor_for`] yields the shared *unknown* type, the host's generic
//! fallback for elements nobody defined.
//!
//! State is per thread, like every other registry in this crate.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::error::{ElementError, RegistryError};
use crate::primitives::{ComponentType, Element};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Element name → registered type.
    static DEFINITIONS: RefCell<HashMap<String, ComponentType>> = RefCell::new(HashMap::new());

    /// Registration order, for listing.
    static ORDER: RefCell<Vec<String>> = RefCell::new(Vec::new());

    /// Fallback type for names nobody defined.
    static UNKNOWN: ComponentType = ComponentType::unknown();
}

// =============================================================================
// Definition
// =============================================================================

/// Register `ty` under `name`.
///
/// Returns the registered type, which is `ty` itself.
pub fn define(name: &str, ty: &ComponentType) -> Result<ComponentType, RegistryError> {
    if !is_valid_element_name(name) {
        return Err(RegistryError::InvalidName(name.to_string()));
    }

    DEFINITIONS.with(|defs| {
        let mut defs = defs.borrow_mut();
        if let Some(existing) = defs.get(name) {
            if existing == ty {
                return Ok(existing.clone());
            }
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }

        defs.insert(name.to_string(), ty.clone());
        ORDER.with(|order| order.borrow_mut().push(name.to_string()));
        debug!(element = name, "element defined");
        Ok(ty.clone())
    })
}

/// Custom element naming rule: lowercase ASCII letter first, at least one
/// hyphen, then only lowercase letters, digits, `-`, `.` and `_`.
pub fn is_valid_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_lower = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    starts_lower
        && name.contains('-')
        && chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_')
        })
}

// =============================================================================
// Lookup
// =============================================================================

/// Type registered under `name`, if any.
pub fn get(name: &str) -> Option<ComponentType> {
    DEFINITIONS.with(|defs| defs.borrow().get(name).cloned())
}

/// Check if `name` is defined.
pub fn is_defined(name: &str) -> bool {
    DEFINITIONS.with(|defs| defs.borrow().contains_key(name))
}

/// Type an element named `name` would be constructed with.
///
/// Undefined names yield the unknown type ([`ComponentType::is_unknown`]).
pub fn constructor_for(name: &str) -> ComponentType {
    get(name).unwrap_or_else(unknown_type)
}

/// The shared unknown-element type.
pub fn unknown_type() -> ComponentType {
    UNKNOWN.with(|ty| ty.clone())
}

/// Names in registration order.
pub fn defined_names() -> Vec<String> {
    ORDER.with(|order| order.borrow().clone())
}

/// Construct an element the way a host would: instantiate the type registered
/// under `name` (or the unknown type) and run its created callback.
pub fn create_element<I, K, V>(name: &str, attributes: I) -> Result<Element, ElementError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let element = constructor_for(name).instantiate(name, attributes);
    element.create()?;
    Ok(element)
}

/// Reset registry state (for testing).
pub fn reset_registry() {
    DEFINITIONS.with(|defs| defs.borrow_mut().clear());
    ORDER.with(|order| order.borrow_mut().clear());
}
