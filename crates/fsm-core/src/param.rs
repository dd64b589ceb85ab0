use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::definition::DefinitionId;
use crate::guard::{Comparison, Guard, Operand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ParamKind {
    Bool,
    Float,
    Trigger,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamKind::Bool => "bool",
            ParamKind::Float => "float",
            ParamKind::Trigger => "trigger",
        })
    }
}

/// Current value of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Float(f32),
    /// Set by `set_trigger`, cleared when a transition guarded by it is taken.
    Trigger(bool),
}

impl Value {
    pub fn kind(self) -> ParamKind {
        match self {
            Value::Bool(_) => ParamKind::Bool,
            Value::Float(_) => ParamKind::Float,
            Value::Trigger(_) => ParamKind::Trigger,
        }
    }

    /// Default value of a parameter of `kind`: `false` / `0.0`.
    pub fn default_for(kind: ParamKind) -> Self {
        match kind {
            ParamKind::Bool => Value::Bool(false),
            ParamKind::Float => Value::Float(0.0),
            ParamKind::Trigger => Value::Trigger(false),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) | Value::Trigger(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Untyped parameter handle: definition identity plus slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamId {
    pub(crate) definition: DefinitionId,
    pub(crate) index: u32,
}

impl ParamId {
    pub fn definition(self) -> DefinitionId {
        self.definition
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Marker type for trigger parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {}

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for f32 {}
    impl Sealed for super::Trigger {}
}

/// Rust type standing for a parameter kind: `bool`, `f32` or [`Trigger`].
pub trait ParamType: sealed::Sealed + 'static {
    const KIND: ParamKind;
}

impl ParamType for bool {
    const KIND: ParamKind = ParamKind::Bool;
}

impl ParamType for f32 {
    const KIND: ParamKind = ParamKind::Float;
}

impl ParamType for Trigger {
    const KIND: ParamKind = ParamKind::Trigger;
}

/// Typed parameter handle. Obtained from the definition builder or by name from a built
/// definition; the type is checked once, when the handle is made.
pub struct Param<T: ParamType> {
    id: ParamId,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: ParamType> Param<T> {
    pub(crate) fn from_id(id: ParamId) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    pub fn id(self) -> ParamId {
        self.id
    }
}

impl<T: ParamType> Copy for Param<T> {}

impl<T: ParamType> Clone for Param<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ParamType> PartialEq for Param<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: ParamType> Eq for Param<T> {}

impl<T: ParamType> Hash for Param<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: ParamType> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("kind", &T::KIND)
            .field("definition", &self.id.definition)
            .field("index", &self.id.index)
            .finish()
    }
}

impl<T: ParamType> From<Param<T>> for ParamId {
    fn from(param: Param<T>) -> Self {
        param.id
    }
}

impl Param<bool> {
    /// Guard: the parameter equals `value`.
    pub fn is(self, value: bool) -> Guard {
        Guard::Bool {
            param: self.id,
            equals: value,
        }
    }
}

impl Param<Trigger> {
    /// Guard: the trigger is set. Taking the transition clears it.
    pub fn is_set(self) -> Guard {
        Guard::Trigger { param: self.id }
    }
}

impl Param<f32> {
    pub fn compare(self, cmp: Comparison, rhs: impl Into<Operand>) -> Guard {
        Guard::Float {
            param: self.id,
            cmp,
            rhs: rhs.into(),
        }
    }

    pub fn lt(self, rhs: impl Into<Operand>) -> Guard {
        self.compare(Comparison::Lt, rhs)
    }

    pub fn le(self, rhs: impl Into<Operand>) -> Guard {
        self.compare(Comparison::Le, rhs)
    }

    pub fn gt(self, rhs: impl Into<Operand>) -> Guard {
        self.compare(Comparison::Gt, rhs)
    }

    pub fn ge(self, rhs: impl Into<Operand>) -> Guard {
        self.compare(Comparison::Ge, rhs)
    }

    pub fn eq_to(self, rhs: impl Into<Operand>) -> Guard {
        self.compare(Comparison::Eq, rhs)
    }

    pub fn ne_to(self, rhs: impl Into<Operand>) -> Guard {
        self.compare(Comparison::Ne, rhs)
    }
}

/// Authored declaration of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub(crate) name: String,
    pub(crate) initial: Value,
}

impl ParamDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.initial.kind()
    }

    pub fn initial(&self) -> Value {
        self.initial
    }
}
