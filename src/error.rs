//! Error taxonomy.
//!
//! - Construction errors ([`BuildError`]) are authoring defects, raised while a
//!   component type is built and never recovered.
//! - Registration errors ([`RegistryError`]) are recoverable; the dynamic
//!   loader falls back to the existing type on a name conflict.
//! - Template errors ([`TemplateError`]) reject the asynchronous load.
//! - Instance errors ([`ElementError`]) carry user hook failures back to
//!   whatever triggered the hook.

use thiserror::Error;

use crate::types::LifecycleState;

/// Boxed user error carried by [`ElementError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("more than one field uses the attribute name {attribute:?} (fields `{first}` and `{second}`)")]
    DuplicateAttribute {
        attribute: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("element name {0:?} is already registered")]
    AlreadyRegistered(String),
    #[error("{0:?} is not a valid element name")]
    InvalidName(String),
}

/// Failure of [`ElementDefinitionHandle::register`](crate::pipeline::ElementDefinitionHandle::register).
#[derive(Debug, Error)]
pub enum DefineError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to find template file {url:?} while trying to load module {module:?}: {reason}")]
    DocumentLoad {
        url: String,
        module: String,
        reason: anyhow::Error,
    },
    #[error("failed to find a <template> element in document {url:?} while trying to load module {module:?}")]
    FragmentMissing { url: String, module: String },
    #[error("failed to import <template> element from document {url:?} while trying to load module {module:?}")]
    Import { url: String, module: String },
}

#[derive(Debug, Error)]
pub enum ElementError {
    #[error("`{hook}` hook failed on <{tag}>")]
    Hook {
        hook: &'static str,
        tag: String,
        #[source]
        source: BoxError,
    },
    #[error("method `{method}` failed on <{tag}>")]
    Method {
        method: String,
        tag: String,
        #[source]
        source: BoxError,
    },
    #[error("<{tag}> has no method `{method}`")]
    UnknownMethod { method: String, tag: String },
    #[error("property `{property}` of <{tag}> is read-only")]
    ReadOnlyProperty { property: String, tag: String },
    #[error("<{tag}> has no field `{field}`")]
    UnknownField { field: String, tag: String },
    #[error("<{tag}> cannot {event} while {state}")]
    InvalidTransition {
        tag: String,
        event: &'static str,
        state: LifecycleState,
    },
}

impl ElementError {
    pub(crate) fn hook(hook: &'static str, tag: &str, error: anyhow::Error) -> Self {
        ElementError::Hook {
            hook,
            tag: tag.to_string(),
            source: error.into(),
        }
    }
}
