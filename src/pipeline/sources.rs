//! In-memory collaborators: a document map and a module map.
//!
//! Both resolve asynchronously (their futures are ready on first poll) so
//! pipelines driven by them interleave on an executor exactly like real
//! fetches would.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use crate::primitives::ComponentDefinition;
use super::loader::{ModuleRequest, ModuleResolver};
use super::template::{Document, DocumentSource, split_suffix};

// =============================================================================
// Documents
// =============================================================================

/// URL → markup.
#[derive(Debug, Default)]
pub struct DocumentMap {
    documents: RefCell<HashMap<String, String>>,
    fetched: RefCell<Vec<String>>,
}

impl DocumentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, markup: impl Into<String>) {
        self.documents.borrow_mut().insert(url.into(), markup.into());
    }

    /// URLs fetched so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }
}

impl DocumentSource for DocumentMap {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, anyhow::Result<Document>> {
        self.fetched.borrow_mut().push(url.to_string());
        let result = match self.documents.borrow().get(url) {
            Some(markup) => Ok(Document::new(url, markup.clone())),
            None => Err(anyhow::anyhow!("document {url:?} not found")),
        };
        async move { result }.boxed_local()
    }
}

// =============================================================================
// Modules
// =============================================================================

/// Produces a module's definition for one request.
pub type ModuleFactory =
    Rc<dyn Fn(ModuleRequest) -> LocalBoxFuture<'static, anyhow::Result<ComponentDefinition>>>;

/// Module name → definition factory.
///
/// Lookups try the exact name first, then the name without its `?query` /
/// `#fragment`.
#[derive(Default)]
pub struct ModuleMap {
    modules: RefCell<HashMap<String, ModuleFactory>>,
    resolved: RefCell<Vec<String>>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A module that evaluates to `definition` as-is.
    pub fn define(&self, name: impl Into<String>, definition: ComponentDefinition) {
        self.define_with(name, move |_| {
            let definition = definition.clone();
            async move { Ok::<_, anyhow::Error>(definition) }.boxed_local()
        });
    }

    /// A module whose definition uses the template found by naming convention.
    pub fn define_templated(&self, name: impl Into<String>, definition: ComponentDefinition) {
        self.define_with(name, move |request| {
            let definition = definition.clone();
            async move {
                let template = request.template.load().await?;
                Ok::<_, anyhow::Error>(definition.template(template))
            }
            .boxed_local()
        });
    }

    pub fn define_with<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(ModuleRequest) -> LocalBoxFuture<'static, anyhow::Result<ComponentDefinition>>
            + 'static,
    {
        self.modules.borrow_mut().insert(name.into(), Rc::new(factory));
    }

    /// Names resolved so far, in order, including failed ones.
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.borrow().clone()
    }

    fn factory(&self, name: &str) -> Option<ModuleFactory> {
        let modules = self.modules.borrow();
        modules
            .get(name)
            .or_else(|| modules.get(split_suffix(name).0))
            .cloned()
    }
}

impl ModuleResolver for ModuleMap {
    fn resolve(
        &self,
        request: ModuleRequest,
    ) -> LocalBoxFuture<'static, anyhow::Result<ComponentDefinition>> {
        self.resolved.borrow_mut().push(request.name.clone());
        match self.factory(&request.name) {
            Some(factory) => factory(request),
            None => {
                let err = anyhow::anyhow!("module {:?} not found", request.name);
                async move { Err::<ComponentDefinition, _>(err) }.boxed_local()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::pipeline::{Loader, LoaderConfig};

    fn loader(docs: Rc<DocumentMap>, modules: Rc<ModuleMap>) -> Loader {
        let pool = futures::executor::LocalPool::new();
        Loader::new(LoaderConfig::default(), docs, modules, Rc::new(pool.spawner()))
    }

    #[test]
    fn test_document_map_fetch() {
        let docs = DocumentMap::new();
        docs.insert("a.html", "<template>a</template>");

        assert_eq!(block_on(docs.fetch("a.html")).unwrap().markup(), "<template>a</template>");
        assert!(block_on(docs.fetch("b.html")).is_err());
        assert_eq!(docs.fetched(), vec!["a.html", "b.html"]);
    }

    #[test]
    fn test_module_map_missing_module() {
        let docs = Rc::new(DocumentMap::new());
        let modules = Rc::new(ModuleMap::new());
        let loader = loader(docs, modules.clone());

        let request = ModuleRequest {
            name: "Nope.js".into(),
            template: loader.template_request("Nope", "Nope.js"),
        };
        let err = block_on(modules.resolve(request)).unwrap_err();

        assert!(err.to_string().contains("Nope.js"));
        assert_eq!(modules.resolved(), vec!["Nope.js"]);
    }

    #[test]
    fn test_module_map_ignores_query_on_lookup() {
        let docs = Rc::new(DocumentMap::new());
        let modules = Rc::new(ModuleMap::new());
        modules.define("A.js", ComponentDefinition::new());
        let loader = loader(docs, modules.clone());

        let request = ModuleRequest {
            name: "A.js?v=1".into(),
            template: loader.template_request("A", "A.js?v=1"),
        };
        assert!(block_on(modules.resolve(request)).is_ok());
    }

    #[test]
    fn test_templated_module_loads_convention_template() {
        let docs = Rc::new(DocumentMap::new());
        docs.insert("Bar.html", "<template><b></b></template>");
        let modules = Rc::new(ModuleMap::new());
        modules.define_templated("Bar.js", ComponentDefinition::new());
        let loader = loader(docs.clone(), modules.clone());

        let request = ModuleRequest {
            name: "Bar.js".into(),
            template: loader.template_request("Bar", "Bar.js"),
        };
        let def = block_on(modules.resolve(request)).unwrap();

        assert!(def.has_template());
        assert_eq!(docs.fetched(), vec!["Bar.html"]);
    }
}
