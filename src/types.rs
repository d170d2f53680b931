//! Core types for spark-elements.
//!
//! These types define the foundation every other module builds on: the typed
//! value a field holds, the catalog type that decides how a field is read from
//! its attribute, and the small enums that drive synchronization and lifecycle.

use std::fmt;

// =============================================================================
// Value
// =============================================================================

/// The typed value a field holds.
///
/// Attributes are always strings; this is the other side of the pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Strict identity, used as the anti-feedback guard.
    ///
    /// Same variant and equal payload. `Float(NaN)` is never identical to
    /// anything, including itself, and `Int(1)` is not identical to `Float(1.0)`.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Catalog-independent name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::engine::serialize(self))
    }
}

// =============================================================================
// Field Type
// =============================================================================

/// Entry in the serialization catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    Integer,
    Float,
    Boolean,
    String,
    /// Not in the catalog: the raw attribute string passes through.
    #[default]
    Untyped,
}

// =============================================================================
// Origin
// =============================================================================

/// Which representation started a field change.
///
/// The engine writes every representation except the originating one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// An attribute mutation (or an attribute present at creation).
    Attribute,
    /// An assignment through the generated accessor.
    Property,
    /// A programmatic write from the component itself; both surfaces are updated.
    Initial,
}

// =============================================================================
// Field Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Flags altering which representations of a field exist.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u8 {
        const NONE = 0;
        /// No attribute surface: attribute mutations are ignored, never written.
        const SUPPRESS_ATTRIBUTE = 1 << 0;
        /// No accessor is generated.
        const SUPPRESS_PROPERTY = 1 << 1;
        /// Accessor has a getter but no setter.
        const READ_ONLY_PROPERTY = 1 << 2;
    }
}

// =============================================================================
// Lifecycle State
// =============================================================================

/// Per-instance lifecycle.
///
/// ```text
/// New → Created → Attached ⇄ Detached
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    New,
    Created,
    Attached,
    Detached,
}

impl LifecycleState {
    /// True once the created callback has run.
    pub fn is_created(self) -> bool {
        !matches!(self, LifecycleState::New)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::New => "new",
            LifecycleState::Created => "created",
            LifecycleState::Attached => "attached",
            LifecycleState::Detached => "detached",
        };
        f.write_str(name)
    }
}
