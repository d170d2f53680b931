//! Field Synchronization - the single path through which a field changes.
//!
//! A field has three places its value shows up:
//! - the instance's private field store (authoritative),
//! - the attribute surface (serialized string),
//! - the property surface (typed accessor).
//!
//! [`set_field`] stores the new value, writes whichever surface did *not*
//! originate the change, then fires the descriptor's change hook. An identical
//! value is a no-op, which is what stops attribute → property → attribute
//! feedback loops.

use tracing::trace;

use super::catalog::serialize;
use super::field::FieldDescriptor;
use crate::error::ElementError;
use crate::primitives::Element;
use crate::types::{Origin, Value};

/// Set a field by name on an instance.
///
/// Fails with [`ElementError::UnknownField`] if the instance's type declares no
/// such field, and with [`ElementError::Hook`] if the change hook fails (the
/// new value is stored by then).
pub fn set_field(
    element: &Element,
    field_name: &str,
    value: Value,
    origin: Origin,
) -> Result<(), ElementError> {
    let field = element
        .component_type()
        .field(field_name)
        .ok_or_else(|| ElementError::UnknownField {
            field: field_name.to_string(),
            tag: element.tag().to_string(),
        })?;
    sync_field(element, &field, value, origin)
}

/// Core of [`set_field`] for callers that already hold the descriptor.
pub(crate) fn sync_field(
    element: &Element,
    field: &FieldDescriptor,
    new_value: Value,
    origin: Origin,
) -> Result<(), ElementError> {
    let name = field.field_name();
    let old_value = element.field(name).unwrap_or_default();

    if old_value.is_identical(&new_value) {
        trace!(element = %element.tag(), field = name, ?origin, "field unchanged");
        return Ok(());
    }

    element.store_field_value(name, new_value.clone());

    if origin != Origin::Attribute && field.has_attribute() {
        element.reflect_attribute(field.attribute_name(), serialize(&new_value));
    }

    if origin != Origin::Property && field.has_property() {
        element.reflect_property(field.property_name(), new_value.clone());
    }

    trace!(
        element = %element.tag(),
        field = name,
        ?origin,
        old = %old_value,
        new = %new_value,
        kind = new_value.type_name(),
        "field changed"
    );

    if let Some(hook) = &field.on_change {
        hook(element, &new_value, &old_value)
            .map_err(|err| ElementError::hook("on_change", element.tag(), err))?;
    }

    Ok(())
}
