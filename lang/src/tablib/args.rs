use std::rc::Rc;

use super::collection::{Capabilities, Collection, check_collection};
use crate::error::RuntimeError;
use crate::vm::Value;

/// Positional view over the arguments of a library call.
///
/// Positions are 1-based so they line up with the numbers reported in
/// "bad argument #n" messages.
pub(super) struct Args<'a> {
    function: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(function: &'static str, values: &'a [Value]) -> Self {
        Self { function, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, position: usize) -> Option<&'a Value> {
        position.checked_sub(1).and_then(|i| self.values.get(i))
    }

    /// The argument, or `nil` when it was not supplied
    pub fn value(&self, position: usize) -> Value {
        self.get(position).cloned().unwrap_or(Value::Nil)
    }

    pub fn is_none_or_nil(&self, position: usize) -> bool {
        self.get(position).is_none_or(Value::is_nil)
    }

    pub fn collection(
        &self,
        position: usize,
        required: Capabilities,
    ) -> Result<Collection, RuntimeError> {
        check_collection(self.get(position), position, self.function, required)
    }

    pub fn check_integer(&self, position: usize) -> Result<i64, RuntimeError> {
        let value = self.get(position);
        match value.and_then(Value::to_integer) {
            Some(n) => Ok(n),
            None => Err(self.integer_error(position, value)),
        }
    }

    pub fn opt_integer(&self, position: usize) -> Result<Option<i64>, RuntimeError> {
        if self.is_none_or_nil(position) {
            Ok(None)
        } else {
            self.check_integer(position).map(Some)
        }
    }

    /// Strings as-is, numbers converted; `None` when absent or nil
    pub fn opt_string(&self, position: usize) -> Result<Option<Rc<str>>, RuntimeError> {
        match self.get(position) {
            None | Some(Value::Nil) => Ok(None),
            Some(value) => value.to_str_coerced().map(Some).ok_or_else(|| {
                RuntimeError::type_mismatch(position, self.function, "string", Some(value))
            }),
        }
    }

    /// A function argument; `None` when absent or nil
    pub fn opt_function(&self, position: usize) -> Result<Option<Value>, RuntimeError> {
        match self.get(position) {
            None | Some(Value::Nil) => Ok(None),
            Some(value @ Value::Function(_)) => Ok(Some(value.clone())),
            Some(other) => Err(RuntimeError::type_mismatch(
                position,
                self.function,
                "function",
                Some(other),
            )),
        }
    }

    fn integer_error(&self, position: usize, value: Option<&Value>) -> RuntimeError {
        let numeric = match value {
            Some(Value::Number(_)) => true,
            Some(Value::String(s)) => s.trim().parse::<f64>().is_ok(),
            _ => false,
        };
        if numeric {
            RuntimeError::bad_argument(position, self.function, "number has no integer representation")
        } else {
            RuntimeError::type_mismatch(position, self.function, "number", value)
        }
    }
}
