//! Element - one instance of a component type.
//!
//! An element carries two external surfaces and one private store:
//! - attributes: ordered `name="string"` pairs, what markup and hosts see
//! - properties: typed values, reached through generated accessors
//! - field store: the authoritative per-instance field values
//!
//! Every field change goes through [`sync_field`](crate::engine::sync_field);
//! nothing here writes the field store except on its behalf.

use std::any::{Any, TypeId};
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::engine::{self, sync_field};
use crate::error::ElementError;
use crate::pipeline::ContentRoot;
use crate::types::{LifecycleState, Origin, Value};
use super::builder::ComponentType;
use super::lifecycle;

// =============================================================================
// Element
// =============================================================================

/// Handle to a component instance. Clones share the instance.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

struct ElementInner {
    tag: String,
    ty: ComponentType,
    state: Cell<LifecycleState>,
    /// Set exactly once, by the created callback.
    root: OnceCell<Option<Rc<ContentRoot>>>,
    attributes: RefCell<Vec<(String, String)>>,
    properties: RefCell<HashMap<String, Value>>,
    values: RefCell<HashMap<String, Value>>,
    extensions: RefCell<HashMap<TypeId, Box<dyn Any>>>,
}

impl ComponentType {
    /// Construct an instance in the `New` state.
    ///
    /// Field values are seeded from the descriptors' initial values; the
    /// attributes are stored but not yet synchronized, that happens in
    /// [`Element::create`].
    pub fn instantiate<I, K, V>(&self, tag: &str, attributes: I) -> Element
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut attrs: Vec<(String, String)> = Vec::new();
        for (name, value) in attributes {
            let (name, value) = (name.into(), value.into());
            match attrs.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => attrs.push((name, value)),
            }
        }

        let values: HashMap<String, Value> = self
            .fields()
            .iter()
            .map(|f| (f.field_name().to_string(), f.initial_value().clone()))
            .collect();

        let extensions: HashMap<TypeId, Box<dyn Any>> = self
            .extension_factories()
            .iter()
            .map(|factory| {
                let ext = factory();
                ((*ext).type_id(), ext)
            })
            .collect();

        Element {
            inner: Rc::new(ElementInner {
                tag: tag.to_string(),
                ty: self.clone(),
                state: Cell::new(LifecycleState::New),
                root: OnceCell::new(),
                attributes: RefCell::new(attrs),
                properties: RefCell::new(HashMap::new()),
                values: RefCell::new(values),
                extensions: RefCell::new(extensions),
            }),
        }
    }
}

impl Element {
    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    pub fn component_type(&self) -> &ComponentType {
        &self.inner.ty
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state.get()
    }

    /// Mounted template content; `None` before creation or without a template.
    pub fn root(&self) -> Option<Rc<ContentRoot>> {
        self.inner.root.get().cloned().flatten()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Run the created callback. Exactly once per instance.
    pub fn create(&self) -> Result<(), ElementError> {
        lifecycle::created(self)
    }

    pub fn attach(&self) -> Result<(), ElementError> {
        lifecycle::attached(self)
    }

    pub fn detach(&self) -> Result<(), ElementError> {
        lifecycle::detached(self)
    }

    // -------------------------------------------------------------------------
    // Attribute surface
    // -------------------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Attributes in list order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.inner.attributes.borrow().clone()
    }

    /// External attribute mutation.
    ///
    /// Once created, the element is notified and a matching field is updated
    /// with attribute origin. Hook failures propagate.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) -> Result<(), ElementError> {
        let value = value.into();
        let old = self.write_attribute(name, value.clone());
        if self.state().is_created() {
            lifecycle::attribute_changed(self, name, old.as_deref(), Some(value.as_str()))?;
        }
        Ok(())
    }

    /// External attribute removal. Removing an absent attribute is a no-op.
    pub fn remove_attribute(&self, name: &str) -> Result<(), ElementError> {
        let old = {
            let mut attrs = self.inner.attributes.borrow_mut();
            let idx = attrs.iter().position(|(n, _)| n == name);
            idx.map(|idx| attrs.remove(idx).1)
        };
        if let Some(old) = old {
            if self.state().is_created() {
                lifecycle::attribute_changed(self, name, Some(old.as_str()), None)?;
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Property surface
    // -------------------------------------------------------------------------

    /// Read a property. Accessors return the field's stored value; any other
    /// name reads a plain instance property.
    pub fn property(&self, name: &str) -> Option<Value> {
        match self.inner.ty.accessor(name) {
            Some(field) => self.field(field.field_name()),
            None => self.inner.properties.borrow().get(name).cloned(),
        }
    }

    /// Assign a property.
    ///
    /// Through an accessor this updates the field with property origin; a
    /// read-only accessor has no setter and the assignment fails. Names
    /// without an accessor become plain instance properties.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<(), ElementError> {
        let value = value.into();
        match self.inner.ty.accessor(name) {
            Some(field) if field.is_read_only() => Err(ElementError::ReadOnlyProperty {
                property: name.to_string(),
                tag: self.tag().to_string(),
            }),
            Some(field) => sync_field(self, &field, value, Origin::Property),
            None => {
                self.inner
                    .properties
                    .borrow_mut()
                    .insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Fields
    // -------------------------------------------------------------------------

    /// Stored value of a field.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.inner.values.borrow().get(name).cloned()
    }

    /// Programmatic field write from the component itself; both surfaces
    /// are updated.
    pub fn set_field(&self, name: &str, value: impl Into<Value>) -> Result<(), ElementError> {
        engine::set_field(self, name, value.into(), Origin::Initial)
    }

    // -------------------------------------------------------------------------
    // Method bag and extensions
    // -------------------------------------------------------------------------

    /// Call a method from the definition's method bag.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, ElementError> {
        let Some(f) = self.inner.ty.method(method) else {
            return Err(ElementError::UnknownMethod {
                method: method.to_string(),
                tag: self.tag().to_string(),
            });
        };
        f(self, args).map_err(|err| ElementError::Method {
            method: method.to_string(),
            tag: self.tag().to_string(),
            source: err.into(),
        })
    }

    /// Borrow typed per-instance state declared with
    /// [`ComponentDefinition::extension`](super::ComponentDefinition::extension).
    ///
    /// The closure must not re-enter `with_extension` on the same element.
    pub fn with_extension<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut exts = self.inner.extensions.borrow_mut();
        let ext = exts.get_mut(&TypeId::of::<T>())?.downcast_mut::<T>()?;
        Some(f(ext))
    }

    pub fn has_extension<T: Any>(&self) -> bool {
        self.inner.extensions.borrow().contains_key(&TypeId::of::<T>())
    }

    // -------------------------------------------------------------------------
    // Engine internals
    // -------------------------------------------------------------------------

    pub(crate) fn set_state(&self, state: LifecycleState) {
        self.inner.state.set(state);
    }

    /// Bind the root once. Later calls are ignored.
    pub(crate) fn init_root(&self, root: Option<Rc<ContentRoot>>) {
        let _ = self.inner.root.set(root);
    }

    pub(crate) fn store_field_value(&self, name: &str, value: Value) {
        self.inner
            .values
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    /// Engine write to the attribute surface; does not notify the element.
    pub(crate) fn reflect_attribute(&self, name: &str, value: String) {
        self.write_attribute(name, value);
    }

    /// Engine write to the property surface.
    pub(crate) fn reflect_property(&self, name: &str, value: Value) {
        self.inner
            .properties
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    /// Raw property surface entry, bypassing accessors.
    pub(crate) fn reflected_property(&self, name: &str) -> Option<Value> {
        self.inner.properties.borrow().get(name).cloned()
    }

    fn write_attribute(&self, name: &str, value: String) -> Option<String> {
        let mut attrs = self.inner.attributes.borrow_mut();
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, value)),
            None => {
                attrs.push((name.to_string(), value));
                None
            }
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.inner.tag)
            .field("state", &self.inner.state.get())
            .field("attributes", &self.inner.attributes.borrow())
            .field("values", &self.inner.values.borrow())
            .finish()
    }
}
