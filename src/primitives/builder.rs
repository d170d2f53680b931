//! Component Type Builder - definition in, instantiable type out.
//!
//! Building resolves the parent type, merges fields, validates that no two
//! fields share an attribute name, indexes fields by attribute and by
//! property name (the generated accessors), and layers hooks, template and
//! methods child-first over the parent's.
//!
//! A built [`ComponentType`] is immutable and cheap to clone; identity is
//! pointer identity, so two builds of the same definition are different types.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::engine::FieldDescriptor;
use crate::error::BuildError;
use crate::pipeline::Template;
use super::types::{ComponentDefinition, ExtensionFactory, LifecycleHooks, Method};

// =============================================================================
// Component Type
// =============================================================================

/// An instantiable component type.
#[derive(Clone)]
pub struct ComponentType {
    inner: Rc<TypeInner>,
}

#[derive(Default)]
struct TypeInner {
    /// Host fallback for undefined element names.
    unknown: bool,
    fields: Vec<Rc<FieldDescriptor>>,
    by_field: HashMap<String, usize>,
    by_attribute: HashMap<String, usize>,
    /// Property name → field index. Present only for non-suppressed properties.
    accessors: HashMap<String, usize>,
    template: Option<Template>,
    hooks: LifecycleHooks,
    methods: HashMap<String, Method>,
    extensions: Vec<ExtensionFactory>,
    parent: Option<ComponentType>,
}

impl ComponentType {
    /// The generic unknown-element type.
    pub(crate) fn unknown() -> Self {
        Self {
            inner: Rc::new(TypeInner {
                unknown: true,
                ..TypeInner::default()
            }),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.inner.unknown
    }

    /// Field descriptor by field name.
    pub fn field(&self, name: &str) -> Option<Rc<FieldDescriptor>> {
        let idx = *self.inner.by_field.get(name)?;
        Some(self.inner.fields[idx].clone())
    }

    /// Fields in declaration order, parent fields first.
    pub fn fields(&self) -> &[Rc<FieldDescriptor>] {
        &self.inner.fields
    }

    /// Field that owns an attribute, if its attribute surface exists.
    pub fn field_for_attribute(&self, attribute: &str) -> Option<Rc<FieldDescriptor>> {
        let idx = *self.inner.by_attribute.get(attribute)?;
        let field = &self.inner.fields[idx];
        field.has_attribute().then(|| field.clone())
    }

    /// Field behind a generated accessor property.
    pub fn accessor(&self, property: &str) -> Option<Rc<FieldDescriptor>> {
        let idx = *self.inner.accessors.get(property)?;
        Some(self.inner.fields[idx].clone())
    }

    /// Names of the generated accessor properties.
    pub fn accessor_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.accessors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn template(&self) -> Option<&Template> {
        self.inner.template.as_ref()
    }

    pub fn parent(&self) -> Option<&ComponentType> {
        self.inner.parent.as_ref()
    }

    /// True if `ancestor` is this type or any of its parents.
    pub fn extends(&self, ancestor: &ComponentType) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty == ancestor {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.inner.methods.contains_key(name)
    }

    pub(crate) fn hooks(&self) -> &LifecycleHooks {
        &self.inner.hooks
    }

    pub(crate) fn method(&self, name: &str) -> Option<Method> {
        self.inner.methods.get(name).cloned()
    }

    pub(crate) fn extension_factories(&self) -> &[ExtensionFactory] {
        &self.inner.extensions
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("ptr", &Rc::as_ptr(&self.inner))
            .field("unknown", &self.inner.unknown)
            .field(
                "fields",
                &self.inner.fields.iter().map(|d| d.field_name()).collect::<Vec<_>>(),
            )
            .field("template", &self.inner.template.is_some())
            .finish()
    }
}

// =============================================================================
// Build
// =============================================================================

/// Build an instantiable type from a definition.
///
/// Fails with [`BuildError::DuplicateAttribute`] when two fields resolve to the
/// same attribute name; no instance of such a type can ever exist.
pub fn build(def: &ComponentDefinition) -> Result<ComponentType, BuildError> {
    let parent = def.parent.as_ref();

    // Parent fields first; a child field of the same name takes its slot
    let mut fields: Vec<Rc<FieldDescriptor>> =
        parent.map(|p| p.fields().to_vec()).unwrap_or_default();
    for field in &def.fields {
        let field = Rc::new(field.clone());
        match fields.iter().position(|f| f.field_name() == field.field_name()) {
            Some(idx) => fields[idx] = field,
            None => fields.push(field),
        }
    }

    let mut by_field = HashMap::with_capacity(fields.len());
    let mut by_attribute: HashMap<String, usize> = HashMap::with_capacity(fields.len());
    let mut accessors = HashMap::new();

    for (idx, field) in fields.iter().enumerate() {
        let attribute = field.attribute_name();
        if let Some(&first) = by_attribute.get(attribute) {
            return Err(BuildError::DuplicateAttribute {
                attribute: attribute.to_string(),
                first: fields[first].field_name().to_string(),
                second: field.field_name().to_string(),
            });
        }
        by_attribute.insert(attribute.to_string(), idx);
        by_field.insert(field.field_name().to_string(), idx);

        if field.has_property() {
            accessors.insert(field.property_name().to_string(), idx);
        }
    }

    let hooks = match parent {
        Some(p) => def.hooks.layered_over(p.hooks()),
        None => def.hooks.clone(),
    };

    let template = def
        .template
        .clone()
        .or_else(|| parent.and_then(|p| p.template().cloned()));

    let mut methods = parent
        .map(|p| p.inner.methods.clone())
        .unwrap_or_default();
    for (name, method) in &def.methods {
        methods.insert(name.clone(), method.clone());
    }

    let mut extensions = parent
        .map(|p| p.extension_factories().to_vec())
        .unwrap_or_default();
    extensions.extend(def.extensions.iter().cloned());

    debug!(
        fields = fields.len(),
        accessors = accessors.len(),
        methods = methods.len(),
        template = template.is_some(),
        extends = parent.is_some(),
        "component type built"
    );

    Ok(ComponentType {
        inner: Rc::new(TypeInner {
            unknown: false,
            fields,
            by_field,
            by_attribute,
            accessors,
            template,
            hooks,
            methods,
            extensions,
            parent: parent.cloned(),
        }),
    })
}
