//! Loader - configuration and the collaborators the load pipelines run on.
//!
//! A [`Loader`] bundles everything an asynchronous load needs:
//! - [`LoaderConfig`]: base URL, template extension, loader element tag
//! - a [`DocumentSource`] that fetches template documents
//! - a [`ModuleResolver`] that turns a resource name into a definition
//! - a [`LocalSpawn`] the dynamic loader component spawns its loads on
//!
//! The convention-derived template of a module travels *with* the resolve
//! call as a [`TemplateRequest`]; there is no shared mutable loader state.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use futures::executor::LocalPool;
//! use spark_elements::pipeline::{DocumentMap, Loader, LoaderConfig, ModuleMap};
//!
//! let mut pool = LocalPool::new();
//! let loader = Loader::new(
//!     LoaderConfig::default().with_base_url("/components"),
//!     Rc::new(DocumentMap::new()),
//!     Rc::new(ModuleMap::new()),
//!     Rc::new(pool.spawner()),
//! );
//! ```

use std::fmt;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::LocalSpawn;

use crate::error::TemplateError;
use crate::primitives::ComponentDefinition;
use super::template::{DocumentSource, Template, load_template};

// =============================================================================
// Configuration
// =============================================================================

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Prefix joined onto relative resource names. Empty means none.
    pub base_url: String,
    /// Appended to template resources that have no extension.
    pub template_extension: String,
    /// Element name the dynamic loader component is installed under.
    pub loader_tag: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            template_extension: "html".to_string(),
            loader_tag: "spark-element".to_string(),
        }
    }
}

impl LoaderConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_template_extension(mut self, extension: impl Into<String>) -> Self {
        self.template_extension = extension.into();
        self
    }

    pub fn with_loader_tag(mut self, tag: impl Into<String>) -> Self {
        self.loader_tag = tag.into();
        self
    }
}

// =============================================================================
// Module Resolution
// =============================================================================

/// Deferred template load for a module, by naming convention.
///
/// Resolvers that want the module's template call [`load`](Self::load); the
/// ones that don't simply ignore it.
#[derive(Clone)]
pub struct TemplateRequest {
    documents: Rc<dyn DocumentSource>,
    config: Rc<LoaderConfig>,
    resource: String,
    requester: String,
}

impl TemplateRequest {
    /// Template resource name (no extension needed).
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Module that asked for the template.
    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn load(&self) -> LocalBoxFuture<'static, Result<Template, TemplateError>> {
        let this = self.clone();
        async move {
            load_template(&*this.documents, &this.config, &this.resource, &this.requester).await
        }
        .boxed_local()
    }
}

impl fmt::Debug for TemplateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRequest")
            .field("resource", &self.resource)
            .field("requester", &self.requester)
            .finish()
    }
}

/// One module resolution request.
#[derive(Debug, Clone)]
pub struct ModuleRequest {
    /// Resource name exactly as given to the definition pipeline.
    pub name: String,
    pub template: TemplateRequest,
}

/// Resolves a module name to a component definition.
///
/// Errors are passed through the definition pipeline unchanged.
pub trait ModuleResolver {
    fn resolve(
        &self,
        request: ModuleRequest,
    ) -> LocalBoxFuture<'static, anyhow::Result<ComponentDefinition>>;
}

// =============================================================================
// Loader
// =============================================================================

/// Load context shared by the definition pipeline and the dynamic loader.
pub struct Loader {
    config: Rc<LoaderConfig>,
    documents: Rc<dyn DocumentSource>,
    modules: Rc<dyn ModuleResolver>,
    spawner: Rc<dyn LocalSpawn>,
}

impl Loader {
    pub fn new(
        config: LoaderConfig,
        documents: Rc<dyn DocumentSource>,
        modules: Rc<dyn ModuleResolver>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        Self {
            config: Rc::new(config),
            documents,
            modules,
            spawner,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn modules(&self) -> &Rc<dyn ModuleResolver> {
        &self.modules
    }

    pub fn spawner(&self) -> &Rc<dyn LocalSpawn> {
        &self.spawner
    }

    /// Template request for `resource` on behalf of module `requester`.
    pub fn template_request(&self, resource: &str, requester: &str) -> TemplateRequest {
        TemplateRequest {
            documents: self.documents.clone(),
            config: self.config.clone(),
            resource: resource.to_string(),
            requester: requester.to_string(),
        }
    }

    /// Load a template directly, outside any module resolution.
    pub fn load_template(
        &self,
        resource: &str,
    ) -> LocalBoxFuture<'static, Result<Template, TemplateError>> {
        self.template_request(resource, resource).load()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader").field("config", &self.config).finish()
    }
}
