//! Lifecycle Dispatcher - the four callbacks every component type gets.
//!
//! ```text
//! New ──create──► Created ──attach──► Attached ──detach──► Detached
//!                                        ▲                    │
//!                                        └──────attach────────┘
//! ```
//!
//! - created: mount the template, seed fields from the attributes present at
//!   construction (list order), then `on_create`
//! - attached / detached: the author hook only, no implicit field sync
//! - attribute changed: deserialize and sync a matching field, any state
//!
//! Author hook failures propagate to whoever drove the transition. The state
//! change itself has already happened by then.

use std::rc::Rc;

use tracing::debug;

use crate::engine::{deserialize, sync_field};
use crate::error::ElementError;
use crate::pipeline::ContentRoot;
use crate::types::{LifecycleState, Origin};
use super::element::Element;
use super::types::LifecycleHook;

// =============================================================================
// Callbacks
// =============================================================================

pub(crate) fn created(element: &Element) -> Result<(), ElementError> {
    expect_state(element, "create", |s| s == LifecycleState::New)?;

    let ty = element.component_type().clone();
    let root = ty.template().map(|tpl| Rc::new(ContentRoot::mount(tpl)));
    element.init_root(root);
    element.set_state(LifecycleState::Created);
    debug!(element = %element.tag(), root = element.root().is_some(), "created");

    for (name, value) in element.attributes() {
        if let Some(field) = ty.field_for_attribute(&name) {
            let value = deserialize(Some(&value), field.field_type());
            sync_field(element, &field, value, Origin::Attribute)?;
        }
    }

    run_hook(element, "on_create", ty.hooks().on_create.as_ref())
}

pub(crate) fn attached(element: &Element) -> Result<(), ElementError> {
    expect_state(element, "attach", |s| {
        matches!(s, LifecycleState::Created | LifecycleState::Detached)
    })?;

    element.set_state(LifecycleState::Attached);
    debug!(element = %element.tag(), "attached");
    let hook = element.component_type().hooks().on_attach.clone();
    run_hook(element, "on_attach", hook.as_ref())
}

pub(crate) fn detached(element: &Element) -> Result<(), ElementError> {
    expect_state(element, "detach", |s| s == LifecycleState::Attached)?;

    element.set_state(LifecycleState::Detached);
    debug!(element = %element.tag(), "detached");
    let hook = element.component_type().hooks().on_detach.clone();
    run_hook(element, "on_detach", hook.as_ref())
}

pub(crate) fn attribute_changed(
    element: &Element,
    name: &str,
    old: Option<&str>,
    new: Option<&str>,
) -> Result<(), ElementError> {
    let Some(field) = element.component_type().field_for_attribute(name) else {
        return Ok(());
    };
    debug!(element = %element.tag(), attribute = name, ?old, ?new, "attribute changed");
    let value = deserialize(new, field.field_type());
    sync_field(element, &field, value, Origin::Attribute)
}

// =============================================================================
// Helpers
// =============================================================================

fn expect_state(
    element: &Element,
    event: &'static str,
    allowed: impl Fn(LifecycleState) -> bool,
) -> Result<(), ElementError> {
    let state = element.state();
    if allowed(state) {
        Ok(())
    } else {
        Err(ElementError::InvalidTransition {
            tag: element.tag().to_string(),
            event,
            state,
        })
    }
}

fn run_hook(
    element: &Element,
    name: &'static str,
    hook: Option<&LifecycleHook>,
) -> Result<(), ElementError> {
    match hook {
        Some(hook) => hook(element).map_err(|err| ElementError::hook(name, element.tag(), err)),
        None => Ok(()),
    }
}
