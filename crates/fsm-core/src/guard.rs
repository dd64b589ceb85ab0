use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::param::{Param, ParamId, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Comparison {
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    Lt,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    Gt,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    #[cfg_attr(feature = "serde", serde(rename = "=="))]
    Eq,
    #[cfg_attr(feature = "serde", serde(rename = "!="))]
    Ne,
}

impl Comparison {
    /// Strict IEEE comparison; any comparison involving NaN is false except `!=`.
    pub fn holds(self, lhs: f32, rhs: f32) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
            Comparison::Eq => lhs == rhs,
            Comparison::Ne => lhs != rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a float comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Const(f32),
    Param(ParamId),
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Operand::Const(value)
    }
}

impl From<Param<f32>> for Operand {
    fn from(param: Param<f32>) -> Self {
        Operand::Param(param.id())
    }
}

/// One condition of a transition. A transition is taken only when all of its guards hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Guard {
    Bool {
        param: ParamId,
        equals: bool,
    },
    Float {
        param: ParamId,
        cmp: Comparison,
        rhs: Operand,
    },
    Trigger {
        param: ParamId,
    },
}

impl Guard {
    /// The parameter tested on the left-hand side.
    pub fn param(&self) -> ParamId {
        match *self {
            Guard::Bool { param, .. } | Guard::Float { param, .. } | Guard::Trigger { param } => {
                param
            }
        }
    }

    pub(crate) fn holds(&self, values: &[Value]) -> bool {
        let value = |id: ParamId| values.get(id.index()).copied();
        match *self {
            Guard::Bool { param, equals } => matches!(value(param), Some(Value::Bool(v)) if v == equals),
            Guard::Trigger { param } => matches!(value(param), Some(Value::Trigger(true))),
            Guard::Float { param, cmp, rhs } => {
                let Some(Value::Float(lhs)) = value(param) else {
                    return false;
                };
                let rhs = match rhs {
                    Operand::Const(c) => c,
                    Operand::Param(other) => match value(other) {
                        Some(Value::Float(v)) => v,
                        _ => return false,
                    },
                };
                cmp.holds(lhs, rhs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_only_satisfies_not_equal() {
        for cmp in [
            Comparison::Lt,
            Comparison::Le,
            Comparison::Gt,
            Comparison::Ge,
            Comparison::Eq,
        ] {
            assert!(!cmp.holds(f32::NAN, 0.0), "{cmp}");
        }
        assert!(Comparison::Ne.holds(f32::NAN, 0.0));
    }

    #[test]
    fn comparisons_are_strict_where_named() {
        assert!(!Comparison::Lt.holds(0.3, 0.3));
        assert!(Comparison::Le.holds(0.3, 0.3));
        assert!(!Comparison::Gt.holds(0.3, 0.3));
        assert!(Comparison::Ge.holds(0.3, 0.3));
    }
}
