use super::table::TableRef;
use super::value::Value;
use crate::error::RuntimeError;

/// Resource limits of a VM instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting of native calls (including hook invocations)
    pub max_call_depth: usize,
    /// Maximum number of values a single call may return
    pub max_stack: usize,
    /// Maximum length of an `__index` / `__newindex` table chain
    pub max_meta_chain: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 200,
            max_stack: 1_000_000,
            max_meta_chain: 2000,
        }
    }
}

/// Host runtime: the value-level interface native libraries are written
/// against. Every element access made through it honours metatable hooks,
/// so a library never needs to know whether it is looking at a native table
/// or at an object that only mimics one.
pub struct VM {
    globals: TableRef,
    limits: Limits,
    depth: usize,
}

impl VM {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            globals: TableRef::new(),
            limits,
            depth: 0,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn globals(&self) -> &TableRef {
        &self.globals
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().set_str(name, value);
    }

    pub fn get_global(&self, name: &str) -> Value {
        self.globals.borrow().get_str(name)
    }

    /// Attach (or detach) a metatable; only tables and userdata carry one
    pub fn set_metatable(
        &mut self,
        value: &Value,
        metatable: Option<TableRef>,
    ) -> Result<(), RuntimeError> {
        match value {
            Value::Table(t) => {
                t.borrow_mut().set_metatable(metatable);
                Ok(())
            }
            Value::Userdata(u) => {
                u.set_metatable(metatable);
                Ok(())
            }
            other => Err(RuntimeError::type_error(format!(
                "cannot set a metatable on a {} value",
                other.type_name()
            ))),
        }
    }

    /// Raw lookup of `event` in the metatable of `value`
    pub fn metamethod(&self, value: &Value, event: &str) -> Value {
        value
            .metatable()
            .map(|mt| mt.borrow().get_str(event))
            .unwrap_or(Value::Nil)
    }

    // Indexed access

    /// `object[key]`, falling back to the `__index` hook
    pub fn index(&mut self, object: &Value, key: &Value) -> Result<Value, RuntimeError> {
        let mut current = object.clone();

        for _ in 0..self.limits.max_meta_chain {
            let handler = match &current {
                Value::Table(t) => {
                    let raw = t.borrow().get(key);
                    if !raw.is_nil() {
                        return Ok(raw);
                    }
                    let handler = self.metamethod(&current, "__index");
                    if handler.is_nil() {
                        return Ok(Value::Nil);
                    }
                    handler
                }
                other => {
                    let handler = self.metamethod(other, "__index");
                    if handler.is_nil() {
                        return Err(index_error(other));
                    }
                    handler
                }
            };

            if let Value::Function(_) = handler {
                return self.pcall(&handler, &[current, key.clone()]);
            }
            current = handler;
        }

        Err(RuntimeError::runtime("'__index' chain too long; possible loop"))
    }

    /// `object[key] = value`, falling back to the `__newindex` hook when the
    /// key is absent from a table (or always, for non-tables)
    pub fn set_index(
        &mut self,
        object: &Value,
        key: Value,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let mut current = object.clone();

        for _ in 0..self.limits.max_meta_chain {
            let handler = match &current {
                Value::Table(t) => {
                    let present = !t.borrow().get(&key).is_nil();
                    let handler = if present {
                        Value::Nil
                    } else {
                        self.metamethod(&current, "__newindex")
                    };
                    if handler.is_nil() {
                        return t.borrow_mut().set(key, value);
                    }
                    handler
                }
                other => {
                    let handler = self.metamethod(other, "__newindex");
                    if handler.is_nil() {
                        return Err(index_error(other));
                    }
                    handler
                }
            };

            if let Value::Function(_) = handler {
                self.call(&handler, &[current, key, value])?;
                return Ok(());
            }
            current = handler;
        }

        Err(RuntimeError::runtime(
            "'__newindex' chain too long; possible loop",
        ))
    }

    pub fn get_int(&mut self, object: &Value, key: i64) -> Result<Value, RuntimeError> {
        self.index(object, &Value::Integer(key))
    }

    pub fn set_int(&mut self, object: &Value, key: i64, value: Value) -> Result<(), RuntimeError> {
        self.set_index(object, Value::Integer(key), value)
    }

    // Length

    /// Native size oracle; `None` for values without a native length
    pub fn raw_len(&self, value: &Value) -> Option<i64> {
        match value {
            Value::Table(t) => Some(t.borrow().border()),
            Value::String(s) => Some(s.len() as i64),
            _ => None,
        }
    }

    /// The length operator: `__len` hook first, then the native oracle
    pub fn length(&mut self, value: &Value) -> Result<Value, RuntimeError> {
        let handler = self.metamethod(value, "__len");
        if !handler.is_nil() {
            return self.pcall(&handler, std::slice::from_ref(value));
        }
        self.raw_len(value).map(Value::Integer).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "attempt to get length of a {} value",
                value.type_name()
            ))
        })
    }

    // Calls

    /// Invoke a callable with `args`, returning all of its results
    pub fn call(&mut self, callee: &Value, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        if self.depth >= self.limits.max_call_depth {
            return Err(RuntimeError::runtime("stack overflow"));
        }

        self.depth += 1;
        let result = self.dispatch(callee, args);
        self.depth -= 1;
        result
    }

    /// Protected call: the callee's first result (or `nil`), or the error it
    /// raised. The VM is left usable either way.
    pub fn pcall(&mut self, callee: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        let results = self.call(callee, args)?;
        Ok(results.into_iter().next().unwrap_or(Value::Nil))
    }

    fn dispatch(&mut self, callee: &Value, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        match callee {
            Value::Function(func) => func.invoke(self, args),
            other => {
                let handler = self.metamethod(other, "__call");
                if handler.is_nil() {
                    return Err(RuntimeError::type_error(format!(
                        "attempt to call a {} value",
                        other.type_name()
                    )));
                }
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(other.clone());
                full.extend_from_slice(args);
                self.call(&handler, &full)
            }
        }
    }

    // Comparison

    /// Native `a < b`, consulting `__lt` for anything but numbers and strings
    pub fn less_than(&mut self, a: &Value, b: &Value) -> Result<bool, RuntimeError> {
        match (a, b) {
            (Value::Integer(x), Value::Integer(y)) => Ok(x < y),
            (Value::Number(x), Value::Number(y)) => Ok(x.0 < y.0),
            (Value::Integer(i), Value::Number(f)) => Ok(int_lt_float(*i, f.0)),
            (Value::Number(f), Value::Integer(i)) => Ok(float_lt_int(f.0, *i)),
            (Value::String(x), Value::String(y)) => Ok(x.as_bytes() < y.as_bytes()),
            _ => {
                let mut handler = self.metamethod(a, "__lt");
                if handler.is_nil() {
                    handler = self.metamethod(b, "__lt");
                }
                if handler.is_nil() {
                    return Err(compare_error(a, b));
                }
                Ok(self.pcall(&handler, &[a.clone(), b.clone()])?.is_truthy())
            }
        }
    }

    /// Whether `n` more values fit in the result area
    pub fn check_stack(&self, n: usize) -> bool {
        n <= self.limits.max_stack
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

fn index_error(value: &Value) -> RuntimeError {
    RuntimeError::type_error(format!("attempt to index a {} value", value.type_name()))
}

fn compare_error(a: &Value, b: &Value) -> RuntimeError {
    let (ta, tb) = (a.type_name(), b.type_name());
    if ta == tb {
        RuntimeError::type_error(format!("attempt to compare two {ta} values"))
    } else {
        RuntimeError::type_error(format!("attempt to compare {ta} with {tb}"))
    }
}

// i < f  <=>  i < ceil(f); the i128 casts saturate for infinities
fn int_lt_float(i: i64, f: f64) -> bool {
    !f.is_nan() && (i as i128) < (f.ceil() as i128)
}

// f < i  <=>  floor(f) < i
fn float_lt_int(f: f64, i: i64) -> bool {
    !f.is_nan() && (f.floor() as i128) < (i as i128)
}
