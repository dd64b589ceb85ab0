use thiserror::Error;

use crate::param::ParamKind;

/// Authoring errors, reported when a definition is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("definition `{0}` has no states")]
    NoStates(String),

    #[error("definition `{0}` has no initial state")]
    MissingInitialState(String),

    #[error("definition `{definition}` declares state `{name}` more than once")]
    DuplicateState { definition: String, name: String },

    #[error("definition `{definition}` declares parameter `{name}` more than once")]
    DuplicateParameter { definition: String, name: String },

    #[error("unknown state `{0}`")]
    UnknownState(String),

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("parameter `{param}` is a {actual} but is used as a {expected}")]
    GuardTypeMismatch {
        param: String,
        expected: ParamKind,
        actual: ParamKind,
    },

    #[error("{what} belongs to a different definition than `{definition}`")]
    ForeignHandle {
        definition: String,
        what: &'static str,
    },

    #[error("parameter `{param}` is compared against a non-finite threshold")]
    NonFiniteThreshold { param: String },
}

/// Rejected parameter reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("parameter belongs to a different definition than `{definition}`")]
    Foreign { definition: String },

    #[error("parameter `{param}` of `{definition}` is a {actual}, not a {expected}")]
    TypeMismatch {
        definition: String,
        param: String,
        expected: ParamKind,
        actual: ParamKind,
    },

    #[error("definition `{definition}` has no parameter named `{name}`")]
    Unknown { definition: String, name: String },
}
