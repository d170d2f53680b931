//! Field Descriptor - declared configuration of one typed field.
//!
//! Descriptors are authored once per component definition and shared by every
//! instance of the built type. They hold configuration only; the current value
//! of a field lives in each instance's own field store.

use std::fmt;
use std::rc::Rc;

use crate::primitives::{ChangeHook, Element};
use crate::types::{FieldFlags, FieldType, Value};

/// One declared field of a component definition.
///
/// # Example
///
/// ```ignore
/// use spark_elements::{FieldDescriptor, FieldType};
///
/// let completion = FieldDescriptor::new(FieldType::Float)
///     .value(0.0)
///     .on_change(|el, new, _old| {
///         // react to the new value
///         Ok(())
///     });
/// ```
#[derive(Clone, Default)]
pub struct FieldDescriptor {
    /// Assigned by the definition when the field is added.
    pub(crate) field_name: String,
    pub(crate) ty: FieldType,
    pub(crate) initial: Value,
    pub(crate) attribute_name: Option<String>,
    pub(crate) property_name: Option<String>,
    pub(crate) flags: FieldFlags,
    pub(crate) on_change: Option<ChangeHook>,
}

impl FieldDescriptor {
    pub fn new(ty: FieldType) -> Self {
        Self {
            ty,
            ..Self::default()
        }
    }

    /// Initial value seeded into every new instance.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.initial = value.into();
        self
    }

    /// Attribute name override (defaults to the field name).
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = Some(name.into());
        self
    }

    /// Property name override (defaults to the field name).
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.property_name = Some(name.into());
        self
    }

    pub fn suppress_attribute(mut self) -> Self {
        self.flags |= FieldFlags::SUPPRESS_ATTRIBUTE;
        self
    }

    pub fn suppress_property(mut self) -> Self {
        self.flags |= FieldFlags::SUPPRESS_PROPERTY;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.flags |= FieldFlags::READ_ONLY_PROPERTY;
        self
    }

    pub fn flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Hook invoked as `(element, new, old)` after the value changed.
    pub fn on_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Element, &Value, &Value) -> anyhow::Result<()> + 'static,
    {
        self.on_change = Some(Rc::new(hook));
        self
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    pub fn initial_value(&self) -> &Value {
        &self.initial
    }

    pub fn field_flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn attribute_name(&self) -> &str {
        self.attribute_name.as_deref().unwrap_or(&self.field_name)
    }

    pub fn property_name(&self) -> &str {
        self.property_name.as_deref().unwrap_or(&self.field_name)
    }

    pub fn has_attribute(&self) -> bool {
        !self.flags.contains(FieldFlags::SUPPRESS_ATTRIBUTE)
    }

    pub fn has_property(&self) -> bool {
        !self.flags.contains(FieldFlags::SUPPRESS_PROPERTY)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(FieldFlags::READ_ONLY_PROPERTY)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("field_name", &self.field_name)
            .field("ty", &self.ty)
            .field("initial", &self.initial)
            .field("attribute", &self.attribute_name())
            .field("property", &self.property_name())
            .field("flags", &self.flags)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_default_to_field_name() {
        let mut desc = FieldDescriptor::new(FieldType::String);
        desc.field_name = "label".to_string();

        assert_eq!(desc.attribute_name(), "label");
        assert_eq!(desc.property_name(), "label");
    }

    #[test]
    fn test_name_overrides() {
        let mut desc = FieldDescriptor::new(FieldType::Integer)
            .attribute("data-count")
            .property("count");
        desc.field_name = "counter".to_string();

        assert_eq!(desc.attribute_name(), "data-count");
        assert_eq!(desc.property_name(), "count");
    }

    #[test]
    fn test_flags() {
        let desc = FieldDescriptor::new(FieldType::Boolean)
            .suppress_attribute()
            .read_only();

        assert!(!desc.has_attribute());
        assert!(desc.has_property());
        assert!(desc.is_read_only());
    }
}
