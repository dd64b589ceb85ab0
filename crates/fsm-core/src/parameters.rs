use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::definition::Definition;
use crate::error::ParamError;
use crate::param::{Param, ParamId, ParamKind, Trigger, Value};

struct Store {
    definition: Rc<Definition>,
    values: RefCell<Vec<Value>>,
}

/// Parameter values of one instance.
///
/// Cloning yields another handle to the same values, so callbacks (and bridges) can write an
/// instance's parameters while that instance is inside `update()`. Writes are plain value
/// stores; the latest write before a transition check wins.
///
/// Rejected reads and writes are returned as [`ParamError`] and also logged at `error` level.
#[derive(Clone)]
pub struct Parameters {
    store: Rc<Store>,
}

impl Parameters {
    pub(crate) fn new(definition: Rc<Definition>) -> Self {
        let values = definition.initial_values();
        Self {
            store: Rc::new(Store {
                definition,
                values: RefCell::new(values),
            }),
        }
    }

    pub fn definition(&self) -> &Rc<Definition> {
        &self.store.definition
    }

    /// Whether two handles refer to the same instance's values.
    pub fn ptr_eq(&self, other: &Parameters) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }

    pub fn set_bool(&self, param: Param<bool>, value: bool) -> Result<(), ParamError> {
        self.write(param.id(), Value::Bool(value))
    }

    pub fn set_float(&self, param: Param<f32>, value: f32) -> Result<(), ParamError> {
        self.write(param.id(), Value::Float(value))
    }

    /// Set a trigger. It stays set until a transition guarded by it is taken.
    pub fn set_trigger(&self, param: Param<Trigger>) -> Result<(), ParamError> {
        self.write(param.id(), Value::Trigger(true))
    }

    pub fn reset_trigger(&self, param: Param<Trigger>) -> Result<(), ParamError> {
        self.write(param.id(), Value::Trigger(false))
    }

    pub fn get_bool(&self, param: Param<bool>) -> Result<bool, ParamError> {
        match self.read(param.id(), ParamKind::Bool)? {
            Value::Bool(v) => Ok(v),
            other => unreachable!("bool slot holds {other:?}"),
        }
    }

    pub fn get_float(&self, param: Param<f32>) -> Result<f32, ParamError> {
        match self.read(param.id(), ParamKind::Float)? {
            Value::Float(v) => Ok(v),
            other => unreachable!("float slot holds {other:?}"),
        }
    }

    pub fn get_trigger(&self, param: Param<Trigger>) -> Result<bool, ParamError> {
        match self.read(param.id(), ParamKind::Trigger)? {
            Value::Trigger(v) => Ok(v),
            other => unreachable!("trigger slot holds {other:?}"),
        }
    }

    /// Untyped write; the value's kind must match the parameter's declared kind.
    pub fn set(&self, param: ParamId, value: Value) -> Result<(), ParamError> {
        self.write(param, value)
    }

    pub fn get(&self, param: ParamId) -> Result<Value, ParamError> {
        let kind = self
            .store
            .definition
            .param_decl(param)
            .map(|d| d.kind())
            .ok_or_else(|| self.reject(self.foreign()))?;
        self.read(param, kind)
    }

    /// Copy of every value, in declaration order.
    pub fn values(&self) -> Vec<Value> {
        self.store.values.borrow().clone()
    }

    pub(crate) fn with_values<R>(&self, f: impl FnOnce(&mut [Value]) -> R) -> R {
        f(&mut self.store.values.borrow_mut())
    }

    fn write(&self, param: ParamId, value: Value) -> Result<(), ParamError> {
        let index = self.check(param, value.kind())?;
        self.store.values.borrow_mut()[index] = value;
        Ok(())
    }

    fn read(&self, param: ParamId, kind: ParamKind) -> Result<Value, ParamError> {
        let index = self.check(param, kind)?;
        Ok(self.store.values.borrow()[index])
    }

    fn check(&self, param: ParamId, kind: ParamKind) -> Result<usize, ParamError> {
        self.store
            .definition
            .check_param(param, kind)
            .map_err(|err| self.reject(err))
    }

    fn foreign(&self) -> ParamError {
        ParamError::Foreign {
            definition: self.store.definition.name().to_string(),
        }
    }

    fn reject(&self, err: ParamError) -> ParamError {
        tracing::error!(definition = %self.store.definition.name(), error = %err, "parameter access rejected");
        err
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.store.values.borrow();
        let mut map = f.debug_map();
        for (decl, value) in self.store.definition.params().iter().zip(values.iter()) {
            map.entry(&decl.name(), value);
        }
        map.finish()
    }
}
