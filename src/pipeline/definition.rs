//! Definition Loading - resource name → registrable element definition.
//!
//! ```text
//! "widgets/SonyaProgressBar.js?v=2"
//!     ├── element name:      sonya-progress-bar
//!     ├── template resource: widgets/SonyaProgressBar?v=2
//!     └── module resolve ──► ComponentDefinition ──► ElementDefinitionHandle
//! ```
//!
//! Resolution errors come back exactly as the [`ModuleResolver`] produced them.
//!
//! [`ModuleResolver`]: super::ModuleResolver

use tracing::debug;

use crate::engine::registry;
use crate::error::DefineError;
use crate::primitives::{ComponentDefinition, ComponentType, build};
use super::loader::{Loader, ModuleRequest};
use super::template::split_suffix;

// =============================================================================
// Naming Convention
// =============================================================================

/// Conventional element name for a definition resource.
///
/// Drops the query/fragment, the directory and everything from the first `.`
/// of the file name, then turns `CamelCase` into `camel-case`.
pub fn element_name_from_resource(resource: &str) -> String {
    let (path, _) = split_suffix(resource);
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);

    let mut name = String::with_capacity(stem.len() + 4);
    for (i, ch) in stem.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                name.push('-');
            }
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

/// Template resource that belongs to a definition resource: the same name
/// with a trailing `.js` removed.
pub fn template_resource_for(resource: &str) -> String {
    let (path, suffix) = split_suffix(resource);
    let path = path.strip_suffix(".js").unwrap_or(path);
    format!("{path}{suffix}")
}

// =============================================================================
// Definition Handle
// =============================================================================

/// A loaded definition plus the element name it registers under.
#[derive(Debug, Clone)]
pub struct ElementDefinitionHandle {
    name: String,
    definition: ComponentDefinition,
}

impl ElementDefinitionHandle {
    pub fn new(name: impl Into<String>, definition: ComponentDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }

    /// Build the type and register it under `name`, or the derived name.
    ///
    /// Every call builds a fresh type, so registering the same handle twice
    /// under one name fails with [`RegistryError::AlreadyRegistered`].
    ///
    /// [`RegistryError::AlreadyRegistered`]: crate::error::RegistryError::AlreadyRegistered
    pub fn register(&self, name: Option<&str>) -> Result<ComponentType, DefineError> {
        let name = name.unwrap_or(&self.name);
        let ty = build(&self.definition)?;
        Ok(registry::define(name, &ty)?)
    }
}

// =============================================================================
// Load
// =============================================================================

/// Resolve `resource` into an [`ElementDefinitionHandle`].
pub async fn load_definition(
    loader: &Loader,
    resource: &str,
) -> anyhow::Result<ElementDefinitionHandle> {
    let name = element_name_from_resource(resource);
    let template = loader.template_request(&template_resource_for(resource), resource);
    debug!(resource, element = %name, "loading definition");

    let request = ModuleRequest {
        name: resource.to_string(),
        template,
    };
    let definition = loader.modules().resolve(request).await?;

    debug!(resource, element = %name, "definition loaded");
    Ok(ElementDefinitionHandle::new(name, definition))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::{LocalPool, block_on};

    use super::*;
    use crate::engine::FieldDescriptor;
    use crate::engine::registry::reset_registry;
    use crate::error::RegistryError;
    use crate::pipeline::{DocumentMap, LoaderConfig, ModuleMap};
    use crate::types::FieldType;

    fn setup() -> (Rc<DocumentMap>, Rc<ModuleMap>, Loader) {
        let docs = Rc::new(DocumentMap::new());
        let modules = Rc::new(ModuleMap::new());
        let pool = LocalPool::new();
        let loader = Loader::new(
            LoaderConfig::default(),
            docs.clone(),
            modules.clone(),
            Rc::new(pool.spawner()),
        );
        (docs, modules, loader)
    }

    #[test]
    fn test_element_name_from_resource() {
        assert_eq!(element_name_from_resource("widgets/MyCoolThing.js?x=1"), "my-cool-thing");
        assert_eq!(element_name_from_resource("SonyaProgressBar"), "sonya-progress-bar");
        assert_eq!(element_name_from_resource("a/b/ABC.min.js"), "a-b-c");
        assert_eq!(element_name_from_resource("x-thing#frag"), "x-thing");
        assert_eq!(element_name_from_resource("/"), "");
    }

    #[test]
    fn test_template_resource_for() {
        assert_eq!(template_resource_for("w/Bar.js"), "w/Bar");
        assert_eq!(template_resource_for("w/Bar.js?v=1"), "w/Bar?v=1");
        assert_eq!(template_resource_for("w/Bar.jsx"), "w/Bar.jsx");
        assert_eq!(template_resource_for("w/Bar"), "w/Bar");
    }

    #[test]
    fn test_load_definition_derives_name() {
        reset_registry();
        let (_, modules, loader) = setup();
        modules.define(
            "widgets/SonyaProgressBar.js",
            ComponentDefinition::new().field("completion", FieldDescriptor::new(FieldType::Float)),
        );

        let handle = block_on(load_definition(&loader, "widgets/SonyaProgressBar.js")).unwrap();

        assert_eq!(handle.name(), "sonya-progress-bar");
        assert_eq!(handle.definition().fields().len(), 1);
    }

    #[test]
    fn test_load_definition_passes_resolver_error_through() {
        let (_, _, loader) = setup();

        let err = block_on(load_definition(&loader, "Missing/Module")).unwrap_err();

        assert_eq!(err.to_string(), "module \"Missing/Module\" not found");
    }

    #[test]
    fn test_template_requested_by_convention() {
        let (docs, modules, loader) = setup();
        docs.insert("w/Bar.html", "<template><i></i></template>");
        modules.define_templated("w/Bar.js", ComponentDefinition::new());

        let handle = block_on(load_definition(&loader, "w/Bar.js")).unwrap();

        assert!(handle.definition().has_template());
        assert_eq!(docs.fetched(), vec!["w/Bar.html"]);
    }

    #[test]
    fn test_template_failure_rejects_definition() {
        let (_, modules, loader) = setup();
        modules.define_templated("w/Bar.js", ComponentDefinition::new());

        let err = block_on(load_definition(&loader, "w/Bar.js")).unwrap_err();

        assert!(err.to_string().contains("\"w/Bar.html\""));
        assert!(err.to_string().contains("\"w/Bar.js\""));
    }

    #[test]
    fn test_register_uses_override_name() {
        reset_registry();
        let handle = ElementDefinitionHandle::new("x-derived", ComponentDefinition::new());

        let ty = handle.register(Some("x-override")).unwrap();

        assert_eq!(registry::get("x-override"), Some(ty));
        assert!(!registry::is_defined("x-derived"));
    }

    #[test]
    fn test_register_twice_conflicts() {
        reset_registry();
        let handle = ElementDefinitionHandle::new("x-twice", ComponentDefinition::new());

        handle.register(None).unwrap();
        let err = handle.register(None).unwrap_err();

        assert!(matches!(
            err,
            DefineError::Registry(RegistryError::AlreadyRegistered(ref name)) if name == "x-twice"
        ));
    }

    #[test]
    fn test_register_surfaces_build_error() {
        reset_registry();
        let def = ComponentDefinition::new()
            .field("a", FieldDescriptor::new(FieldType::String).attribute("z"))
            .field("b", FieldDescriptor::new(FieldType::String).attribute("z"));

        let err = ElementDefinitionHandle::new("x-bad", def).register(None).unwrap_err();

        assert!(matches!(err, DefineError::Build(_)));
        assert!(!registry::is_defined("x-bad"));
    }
}
