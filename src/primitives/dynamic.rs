//! Dynamic Loader Component - an element that loads and registers another
//! element definition named by its `src` field.
//!
//! ```text
//!            src change ─────────────┐
//!                                    ▼
//! attach ──(src set, not loaded)──► begin loading ──► load_definition ──► register
//!                                                                           │
//!                         AlreadyRegistered ──► existing type (unless unknown)
//!                                                                           │
//!                                               Loaded ──► onload / Failed ──► onerror
//! ```
//!
//! Per-instance state lives in a typed extension on the element. Each load
//! captures a generation; a completion whose generation is no longer current
//! is discarded and fires neither callback.
//!
//! `onload` / `onerror` failures are logged and swallowed. Engine hooks on the
//! same element still propagate theirs.
//!
//! # Example
//!
//! ```ignore
//! use spark_elements::primitives::{DynamicElement, install};
//!
//! install(loader.clone())?;
//! let el = registry::create_element("spark-element", [("src", "widgets/ProgressBar.js")])?;
//! let dynamic = DynamicElement::new(el.clone()).unwrap();
//! dynamic.set_on_load(|el| { /* use the resolved type */ Ok(()) });
//! el.attach()?;
//! pool.run_until_stalled();
//! ```

use std::rc::Rc;

use futures::task::LocalSpawnExt;
use spark_signals::{Signal, signal};
use tracing::{debug, warn};

use crate::engine::{FieldDescriptor, registry};
use crate::error::{DefineError, ElementError, RegistryError};
use crate::pipeline::{Loader, load_definition};
use crate::types::{FieldType, Value};
use super::builder::{ComponentType, build};
use super::element::Element;
use super::types::ComponentDefinition;

// =============================================================================
// Types
// =============================================================================

/// Where an instance's load stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Called once a load resolved a type.
pub type LoadCallback = Rc<dyn Fn(&Element) -> anyhow::Result<()>>;

/// Called with the failure of a load.
pub type ErrorCallback = Rc<dyn Fn(&Element, &anyhow::Error) -> anyhow::Result<()>>;

struct LoaderState {
    attached: bool,
    /// Latch: a load was started for the current `src`.
    src_has_loaded: bool,
    generation: u64,
    on_load: Option<LoadCallback>,
    on_error: Option<ErrorCallback>,
    resolved: Option<ComponentType>,
    status: Signal<LoadStatus>,
}

impl LoaderState {
    fn new() -> Self {
        Self {
            attached: false,
            src_has_loaded: false,
            generation: 0,
            on_load: None,
            on_error: None,
            resolved: None,
            status: signal(LoadStatus::Idle),
        }
    }
}

// =============================================================================
// Definition
// =============================================================================

/// Definition of the dynamic loader component, loading through `loader`.
pub fn dynamic_element_definition(loader: Rc<Loader>) -> ComponentDefinition {
    let on_src = loader.clone();
    let on_attach = loader;

    ComponentDefinition::new()
        .field(
            "src",
            FieldDescriptor::new(FieldType::String).on_change(move |el, _new, _old| {
                let reset = el.with_extension(|s: &mut LoaderState| {
                    s.resolved = None;
                    s.src_has_loaded = false;
                    s.generation += 1;
                    (s.attached, s.status.clone())
                });
                if let Some((attached, status)) = reset {
                    status.set(LoadStatus::Idle);
                    if attached {
                        begin_loading(&on_src, el);
                    }
                }
                Ok(())
            }),
        )
        .extension(LoaderState::new)
        .on_attach(move |el| {
            let pending = el
                .with_extension(|s: &mut LoaderState| {
                    s.attached = true;
                    !s.src_has_loaded
                })
                .unwrap_or(false);
            if pending {
                begin_loading(&on_attach, el);
            }
            Ok(())
        })
        .on_detach(|el| {
            el.with_extension(|s: &mut LoaderState| s.attached = false);
            Ok(())
        })
}

/// Build the dynamic loader component and register it under the configured
/// loader tag.
///
/// Each call builds a new type, so a second install on the same thread fails
/// with [`RegistryError::AlreadyRegistered`].
pub fn install(loader: Rc<Loader>) -> Result<ComponentType, DefineError> {
    let tag = loader.config().loader_tag.clone();
    let ty = build(&dynamic_element_definition(loader))?;
    let ty = registry::define(&tag, &ty)?;
    debug!(element = %tag, "dynamic loader installed");
    Ok(ty)
}

// =============================================================================
// Loading
// =============================================================================

fn current_src(el: &Element) -> String {
    el.field("src")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn begin_loading(loader: &Rc<Loader>, el: &Element) {
    let src = current_src(el);
    if src.is_empty() {
        return;
    }

    let Some((generation, status)) = el.with_extension(|s: &mut LoaderState| {
        s.src_has_loaded = true;
        s.generation += 1;
        (s.generation, s.status.clone())
    }) else {
        return;
    };
    status.set(LoadStatus::Loading);
    debug!(element = %el.tag(), src = %src, generation, "load started");

    let task_loader = loader.clone();
    let task_element = el.clone();
    let task_src = src.clone();
    let task = async move {
        let outcome = resolve_type(&task_loader, &task_src).await;
        complete(&task_element, generation, outcome);
    };

    if let Err(err) = loader.spawner().spawn_local(task) {
        complete(
            el,
            generation,
            Err(anyhow::anyhow!("failed to start loading {src:?}: {err}")),
        );
    }
}

/// Load, register, and fall back to an already registered type of the same
/// name.
async fn resolve_type(loader: &Loader, src: &str) -> anyhow::Result<ComponentType> {
    let handle = load_definition(loader, src).await?;
    match handle.register(None) {
        Ok(ty) => Ok(ty),
        Err(DefineError::Registry(RegistryError::AlreadyRegistered(name))) => {
            let existing = registry::constructor_for(&name);
            if existing.is_unknown() {
                anyhow::bail!("element {name:?} resolves to the unknown element type");
            }
            debug!(element = %name, "reusing registered type");
            Ok(existing)
        }
        Err(err) => Err(err.into()),
    }
}

fn complete(el: &Element, generation: u64, outcome: anyhow::Result<ComponentType>) {
    let current = el.with_extension(|s: &mut LoaderState| {
        if s.generation != generation {
            return None;
        }
        if let Ok(ty) = &outcome {
            s.resolved = Some(ty.clone());
        }
        Some((s.on_load.clone(), s.on_error.clone(), s.status.clone()))
    });
    let Some((on_load, on_error, status)) = current.flatten() else {
        warn!(element = %el.tag(), generation, "stale load discarded");
        return;
    };

    match outcome {
        Ok(_) => {
            status.set(LoadStatus::Loaded);
            debug!(element = %el.tag(), generation, "load finished");
            if let Some(callback) = on_load {
                call_safely(el, "onload", callback(el));
            }
        }
        Err(err) => {
            status.set(LoadStatus::Failed);
            debug!(element = %el.tag(), generation, error = %err, "load failed");
            if let Some(callback) = on_error {
                call_safely(el, "onerror", callback(el, &err));
            }
        }
    }
}

fn call_safely(el: &Element, callback: &str, result: anyhow::Result<()>) {
    if let Err(err) = result {
        warn!(element = %el.tag(), callback, error = %err, "loader callback failed");
    }
}

// =============================================================================
// Typed Handle
// =============================================================================

/// Typed view over a dynamic loader instance.
#[derive(Debug, Clone)]
pub struct DynamicElement {
    element: Element,
}

impl DynamicElement {
    /// `None` if `element` is not a dynamic loader instance.
    pub fn new(element: Element) -> Option<Self> {
        element
            .has_extension::<LoaderState>()
            .then_some(Self { element })
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn src(&self) -> String {
        current_src(&self.element)
    }

    /// Assign `src` through the property surface.
    pub fn set_src(&self, src: impl Into<String>) -> Result<(), ElementError> {
        self.element.set_property("src", Value::Str(src.into()))
    }

    pub fn set_on_load<F>(&self, callback: F)
    where
        F: Fn(&Element) -> anyhow::Result<()> + 'static,
    {
        let callback: LoadCallback = Rc::new(callback);
        self.state(|s| s.on_load = Some(callback));
    }

    pub fn set_on_error<F>(&self, callback: F)
    where
        F: Fn(&Element, &anyhow::Error) -> anyhow::Result<()> + 'static,
    {
        let callback: ErrorCallback = Rc::new(callback);
        self.state(|s| s.on_error = Some(callback));
    }

    /// Type the last current load resolved, cleared by every `src` change.
    pub fn resolved_type(&self) -> Option<ComponentType> {
        self.state(|s| s.resolved.clone()).flatten()
    }

    pub fn status(&self) -> LoadStatus {
        self.status_signal().get()
    }

    pub fn status_signal(&self) -> Signal<LoadStatus> {
        self.state(|s| s.status.clone())
            .unwrap_or_else(|| signal(LoadStatus::Idle))
    }

    pub fn is_attached(&self) -> bool {
        self.state(|s| s.attached).unwrap_or(false)
    }

    fn state<R>(&self, f: impl FnOnce(&mut LoaderState) -> R) -> Option<R> {
        self.element.with_extension(f)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use futures::executor::LocalPool;

    use super::*;
    use crate::engine::registry::reset_registry;
    use crate::pipeline::{DocumentMap, LoaderConfig, ModuleMap};

    struct Harness {
        pool: LocalPool,
        modules: Rc<ModuleMap>,
        loads: Rc<Cell<u32>>,
        errors: Rc<RefCell<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            reset_registry();
            let pool = LocalPool::new();
            let modules = Rc::new(ModuleMap::new());
            let loader = Rc::new(Loader::new(
                LoaderConfig::default(),
                Rc::new(DocumentMap::new()),
                modules.clone(),
                Rc::new(pool.spawner()),
            ));
            install(loader).unwrap();
            Self {
                pool,
                modules,
                loads: Rc::new(Cell::new(0)),
                errors: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn element(&self, src: Option<&str>) -> DynamicElement {
            let attrs: Vec<(&str, &str)> = src.map(|s| ("src", s)).into_iter().collect();
            let el = registry::create_element("spark-element", attrs).unwrap();
            let dynamic = DynamicElement::new(el).unwrap();

            let loads = self.loads.clone();
            dynamic.set_on_load(move |_| {
                loads.set(loads.get() + 1);
                Ok(())
            });
            let errors = self.errors.clone();
            dynamic.set_on_error(move |_, err| {
                errors.borrow_mut().push(err.to_string());
                Ok(())
            });
            dynamic
        }
    }

    #[test]
    fn test_src_before_attach_defers_load() {
        let mut h = Harness::new();
        h.modules.define("w/FancyBox.js", ComponentDefinition::new());
        let dynamic = h.element(Some("w/FancyBox.js"));

        h.pool.run_until_stalled();
        assert!(h.modules.resolved().is_empty());
        assert_eq!(dynamic.status(), LoadStatus::Idle);

        dynamic.element().attach().unwrap();
        assert_eq!(dynamic.status(), LoadStatus::Loading);
        h.pool.run_until_stalled();

        assert_eq!(h.loads.get(), 1);
        assert_eq!(dynamic.status(), LoadStatus::Loaded);
        assert_eq!(dynamic.resolved_type(), registry::get("fancy-box"));
    }

    #[test]
    fn test_missing_module_fires_onerror_once() {
        let mut h = Harness::new();
        let dynamic = h.element(None);
        dynamic.element().attach().unwrap();

        dynamic.set_src("Missing/Module").unwrap();
        h.pool.run_until_stalled();

        assert_eq!(h.loads.get(), 0);
        assert_eq!(h.errors.borrow().len(), 1);
        assert_eq!(dynamic.status(), LoadStatus::Failed);
        assert!(dynamic.resolved_type().is_none());
    }

    #[test]
    fn test_latch_survives_detach() {
        let mut h = Harness::new();
        h.modules.define("AlphaBox.js", ComponentDefinition::new());
        let dynamic = h.element(Some("AlphaBox.js"));
        let el = dynamic.element().clone();

        el.attach().unwrap();
        h.pool.run_until_stalled();
        el.detach().unwrap();
        el.attach().unwrap();
        h.pool.run_until_stalled();

        assert_eq!(h.modules.resolved(), vec!["AlphaBox.js"]);
        assert_eq!(h.loads.get(), 1);
    }

    #[test]
    fn test_detach_does_not_cancel_in_flight_load() {
        let mut h = Harness::new();
        h.modules.define("AlphaBox.js", ComponentDefinition::new());
        let dynamic = h.element(Some("AlphaBox.js"));

        dynamic.element().attach().unwrap();
        dynamic.element().detach().unwrap();
        h.pool.run_until_stalled();

        assert_eq!(h.loads.get(), 1);
        assert!(!dynamic.is_attached());
    }

    #[test]
    fn test_src_change_while_detached_loads_on_next_attach() {
        let mut h = Harness::new();
        h.modules.define("AlphaBox.js", ComponentDefinition::new());
        h.modules.define("BetaBox.js", ComponentDefinition::new());
        let dynamic = h.element(Some("AlphaBox.js"));
        let el = dynamic.element().clone();

        el.attach().unwrap();
        h.pool.run_until_stalled();
        el.detach().unwrap();
        dynamic.set_src("BetaBox.js").unwrap();
        assert!(dynamic.resolved_type().is_none());

        el.attach().unwrap();
        h.pool.run_until_stalled();

        assert_eq!(h.modules.resolved(), vec!["AlphaBox.js", "BetaBox.js"]);
        assert_eq!(dynamic.resolved_type(), registry::get("beta-box"));
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut h = Harness::new();
        h.modules.define("w/FirstOne.js", ComponentDefinition::new());
        h.modules.define("w/SecondOne.js", ComponentDefinition::new());
        let dynamic = h.element(None);
        dynamic.element().attach().unwrap();

        dynamic.set_src("w/FirstOne.js").unwrap();
        dynamic.set_src("w/SecondOne.js").unwrap();
        h.pool.run_until_stalled();

        assert_eq!(h.loads.get(), 1);
        assert_eq!(dynamic.resolved_type(), registry::get("second-one"));
        // The stale load still ran to completion and registered its type
        assert!(registry::is_defined("first-one"));
    }

    #[test]
    fn test_empty_src_never_loads() {
        let mut h = Harness::new();
        let dynamic = h.element(Some(""));

        dynamic.element().attach().unwrap();
        h.pool.run_until_stalled();

        assert!(h.modules.resolved().is_empty());
        assert_eq!(dynamic.status(), LoadStatus::Idle);
    }

    #[test]
    fn test_callback_failure_is_swallowed() {
        let mut h = Harness::new();
        h.modules.define("AlphaBox.js", ComponentDefinition::new());
        let dynamic = h.element(Some("AlphaBox.js"));
        dynamic.set_on_load(|_| anyhow::bail!("callback blew up"));

        dynamic.element().attach().unwrap();
        h.pool.run_until_stalled();

        assert_eq!(dynamic.status(), LoadStatus::Loaded);
        assert!(h.errors.borrow().is_empty());
    }

    #[test]
    fn test_error_callback_failure_is_swallowed() {
        let mut h = Harness::new();
        let dynamic = h.element(None);
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        dynamic.set_on_error(move |_, _| {
            c.set(c.get() + 1);
            anyhow::bail!("error callback blew up")
        });

        assert!(dynamic.element().attach().is_ok());
        assert!(dynamic.set_src("Missing/Module").is_ok());
        h.pool.run_until_stalled();

        assert_eq!(calls.get(), 1);
        assert_eq!(h.loads.get(), 0);
        assert_eq!(dynamic.status(), LoadStatus::Failed);
        assert!(dynamic.resolved_type().is_none());
    }

    #[test]
    fn test_registration_falls_back_to_existing_type() {
        let mut h = Harness::new();
        let existing = build(&ComponentDefinition::new()).unwrap();
        registry::define("taken-name", &existing).unwrap();
        h.modules.define("other/TakenName.js", ComponentDefinition::new());
        let dynamic = h.element(Some("other/TakenName.js"));

        dynamic.element().attach().unwrap();
        h.pool.run_until_stalled();

        assert_eq!(h.loads.get(), 1);
        assert_eq!(dynamic.resolved_type(), Some(existing));
    }

    #[test]
    fn test_invalid_derived_name_is_a_failure() {
        let mut h = Harness::new();
        h.modules.define("Widget.js", ComponentDefinition::new());
        let dynamic = h.element(Some("Widget.js"));

        dynamic.element().attach().unwrap();
        h.pool.run_until_stalled();

        assert_eq!(h.loads.get(), 0);
        assert_eq!(h.errors.borrow().len(), 1);
        assert!(h.errors.borrow()[0].contains("\"widget\""));
    }

    #[test]
    fn test_wrapper_rejects_other_elements() {
        let _h = Harness::new();
        let plain = build(&ComponentDefinition::new())
            .unwrap()
            .instantiate("x-plain", Vec::<(String, String)>::new());

        assert!(DynamicElement::new(plain).is_none());
    }
}
