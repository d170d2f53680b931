//! Mounting - template content → isolated per-instance content root.
//!
//! Every created instance of a templated type gets its own [`ContentRoot`]:
//! a detached copy of the template markup plus a private style table that the
//! instance's hooks write to. Nothing in one root is visible from another.
//!
//! # Example
//!
//! ```ignore
//! use spark_elements::pipeline::{ContentRoot, Template};
//!
//! let tpl = Template::new("mem://bar.html", "<div class=\"progress\"></div>");
//! let root = ContentRoot::mount(&tpl);
//! root.set_style(".progress", "width", "42%");
//! assert_eq!(root.style(".progress", "width").as_deref(), Some("42%"));
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;

use tracing::trace;

use super::template::Template;

// =============================================================================
// Content Root
// =============================================================================

/// Isolated content root hosting one instance's copy of its template.
#[derive(Debug)]
pub struct ContentRoot {
    source_url: String,
    content: String,
    /// (selector, property) → value
    styles: RefCell<BTreeMap<(String, String), String>>,
}

impl ContentRoot {
    /// Clone `template` into a fresh root.
    pub fn mount(template: &Template) -> Self {
        trace!(url = template.source_url(), "template mounted");
        Self {
            source_url: template.source_url().to_string(),
            content: template.content().to_string(),
            styles: RefCell::new(BTreeMap::new()),
        }
    }

    /// The mounted markup.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// URL of the document the template came from.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Set a style property on the part matching `selector`.
    pub fn set_style(&self, selector: &str, property: &str, value: impl Into<String>) {
        self.styles
            .borrow_mut()
            .insert((selector.to_string(), property.to_string()), value.into());
    }

    pub fn style(&self, selector: &str, property: &str) -> Option<String> {
        self.styles
            .borrow()
            .get(&(selector.to_string(), property.to_string()))
            .cloned()
    }

    pub fn remove_style(&self, selector: &str, property: &str) -> Option<String> {
        self.styles
            .borrow_mut()
            .remove(&(selector.to_string(), property.to_string()))
    }

    /// All styles set on `selector`, ordered by property name.
    pub fn styles_for(&self, selector: &str) -> Vec<(String, String)> {
        self.styles
            .borrow()
            .iter()
            .filter(|((sel, _), _)| sel == selector)
            .map(|((_, prop), value)| (prop.clone(), value.clone()))
            .collect()
    }
}
