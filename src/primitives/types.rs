//! Primitive types - component definitions and hook callbacks.
//!
//! A [`ComponentDefinition`] is the author-facing bundle: typed fields,
//! lifecycle hooks, an optional template, an optional parent type, and a bag of
//! extra methods and per-instance state. [`build`](super::build) turns it into
//! an instantiable [`ComponentType`](super::ComponentType).

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::engine::FieldDescriptor;
use crate::pipeline::Template;
use crate::types::Value;
use super::builder::ComponentType;
use super::element::Element;

// =============================================================================
// Callback Types
// =============================================================================

/// Field change hook: `(element, new, old)`.
///
/// Rc so descriptors stay cheap to clone into every built type.
pub type ChangeHook = Rc<dyn Fn(&Element, &Value, &Value) -> anyhow::Result<()>>;

/// Lifecycle hook (`on_create`, `on_attach`, `on_detach`).
pub type LifecycleHook = Rc<dyn Fn(&Element) -> anyhow::Result<()>>;

/// Extra instance method from the definition's method bag.
pub type Method = Rc<dyn Fn(&Element, &[Value]) -> anyhow::Result<Value>>;

/// Produces one piece of typed per-instance state.
pub type ExtensionFactory = Rc<dyn Fn() -> Box<dyn Any>>;

// =============================================================================
// Lifecycle Hooks
// =============================================================================

/// The three author hooks. Missing hooks are no-ops.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub on_create: Option<LifecycleHook>,
    pub on_attach: Option<LifecycleHook>,
    pub on_detach: Option<LifecycleHook>,
}

impl LifecycleHooks {
    /// Child hooks first, parent hooks where the child has none.
    pub(crate) fn layered_over(&self, parent: &LifecycleHooks) -> LifecycleHooks {
        LifecycleHooks {
            on_create: self.on_create.clone().or_else(|| parent.on_create.clone()),
            on_attach: self.on_attach.clone().or_else(|| parent.on_attach.clone()),
            on_detach: self.on_detach.clone().or_else(|| parent.on_detach.clone()),
        }
    }
}

// =============================================================================
// Component Definition
// =============================================================================

/// Author-supplied description of a component.
///
/// # Example
///
/// ```ignore
/// use spark_elements::{ComponentDefinition, FieldDescriptor, FieldType, build};
///
/// let def = ComponentDefinition::new()
///     .field("completion", FieldDescriptor::new(FieldType::Float).on_change(
///         |el, new, _| {
///             if let Some(root) = el.root() {
///                 root.set_style(".progress", "width", format!("{new}%"));
///             }
///             Ok(())
///         },
///     ))
///     .on_attach(|_el| Ok(()));
///
/// let ty = build(&def)?;
/// ```
#[derive(Clone, Default)]
pub struct ComponentDefinition {
    pub(crate) parent: Option<ComponentType>,
    /// Declaration order is preserved; it is the accessor and listing order.
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) template: Option<Template>,
    pub(crate) hooks: LifecycleHooks,
    pub(crate) methods: Vec<(String, Method)>,
    pub(crate) extensions: Vec<ExtensionFactory>,
}

impl ComponentDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend `parent`: its fields, hooks, template and methods apply unless
    /// this definition overrides them.
    pub fn extends(mut self, parent: &ComponentType) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Declare a field. Declaring the same name again replaces the earlier one.
    pub fn field(mut self, name: impl Into<String>, mut descriptor: FieldDescriptor) -> Self {
        descriptor.field_name = name.into();
        match self
            .fields
            .iter_mut()
            .find(|f| f.field_name == descriptor.field_name)
        {
            Some(slot) => *slot = descriptor,
            None => self.fields.push(descriptor),
        }
        self
    }

    pub fn template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn on_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Element) -> anyhow::Result<()> + 'static,
    {
        self.hooks.on_create = Some(Rc::new(hook));
        self
    }

    pub fn on_attach<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Element) -> anyhow::Result<()> + 'static,
    {
        self.hooks.on_attach = Some(Rc::new(hook));
        self
    }

    pub fn on_detach<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Element) -> anyhow::Result<()> + 'static,
    {
        self.hooks.on_detach = Some(Rc::new(hook));
        self
    }

    /// Add an instance method, callable through [`Element::call`].
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Element, &[Value]) -> anyhow::Result<Value> + 'static,
    {
        self.methods.push((name.into(), Rc::new(method)));
        self
    }

    /// Add typed per-instance state, reachable through [`Element::with_extension`].
    pub fn extension<T, F>(mut self, factory: F) -> Self
    where
        T: Any,
        F: Fn() -> T + 'static,
    {
        self.extensions
            .push(Rc::new(move || Box::new(factory()) as Box<dyn Any>));
        self
    }

    pub fn parent(&self) -> Option<&ComponentType> {
        self.parent.as_ref()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn has_template(&self) -> bool {
        self.template.is_some()
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("parent", &self.parent.is_some())
            .field("fields", &self.fields)
            .field("template", &self.template)
            .field("methods", &self.methods.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}
