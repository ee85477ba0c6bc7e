use ordered_float::OrderedFloat;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::runtime::VM;
use super::table::TableRef;
use crate::error::RuntimeError;

/// Signature shared by every native function the runtime can call
pub type NativeFn = dyn Fn(&mut VM, &[Value]) -> Result<Vec<Value>, RuntimeError>;

/// Runtime value type
#[derive(Clone, Debug)]
pub enum Value {
    /// Absence of a value
    Nil,

    Boolean(bool),

    /// 64-bit signed integer subtype of number
    Integer(i64),

    /// 64-bit floating point subtype of number
    Number(OrderedFloat<f64>),

    /// Immutable byte string (UTF-8 in practice)
    String(Rc<str>),

    /// Native indexed collection, shared by reference
    Table(TableRef),

    /// Host-provided callable
    Function(Rc<NativeFunction>),

    /// Opaque object that can only behave like a collection through the
    /// hooks of its metatable
    Userdata(Rc<Userdata>),
}

/// A named native function
pub struct NativeFunction {
    pub name: String,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut VM, &[Value]) -> Result<Vec<Value>, RuntimeError> + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn invoke(&self, vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        (self.func)(vm, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function:{}>", self.name)
    }
}

/// Opaque host object
#[derive(Debug, Default)]
pub struct Userdata {
    metatable: RefCell<Option<TableRef>>,
}

impl Userdata {
    pub fn new(metatable: Option<TableRef>) -> Self {
        Self {
            metatable: RefCell::new(metatable),
        }
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.metatable.borrow().clone()
    }

    pub fn set_metatable(&self, metatable: Option<TableRef>) {
        *self.metatable.borrow_mut() = metatable;
    }
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn number(n: f64) -> Self {
        Value::Number(OrderedFloat(n))
    }

    pub fn function<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut VM, &[Value]) -> Result<Vec<Value>, RuntimeError> + 'static,
    {
        Value::Function(Rc::new(NativeFunction::new(name, func)))
    }

    pub fn userdata(metatable: Option<TableRef>) -> Self {
        Value::Userdata(Rc::new(Userdata::new(metatable)))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Only `nil` and `false` are falsy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) | Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) => "function",
            Value::Userdata(_) => "userdata",
        }
    }

    /// Integer view of a number, accepting floats with an exact integer value
    /// and numeric strings
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Number(n) => float_to_integer(n.0),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_integer))
            }
            _ => None,
        }
    }

    /// String view used by `concat`: strings as-is, numbers formatted the way
    /// the runtime prints them, everything else is not representable
    pub fn to_str_coerced(&self) -> Option<Rc<str>> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Integer(n) => Some(Rc::from(n.to_string())),
            Value::Number(n) => Some(Rc::from(format_float(n.0))),
            _ => None,
        }
    }

    /// Metatable attached to this value, if the value kind supports one
    pub fn metatable(&self) -> Option<TableRef> {
        match self {
            Value::Table(t) => t.borrow().metatable(),
            Value::Userdata(u) => u.metatable(),
            _ => None,
        }
    }

    /// Canonical key form: floats with an exact integer value become integers
    pub(crate) fn normalize_key(self) -> Value {
        match self {
            Value::Number(n) => match float_to_integer(n.0) {
                Some(i) => Value::Integer(i),
                None => Value::Number(n),
            },
            other => other,
        }
    }
}

/// Exact conversion of a float to an integer
pub fn float_to_integer(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or beyond it overflows
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Format a float like C's `%.14g`, appending `.0` when the result would
/// otherwise read as an integer
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return if f.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    const PRECISION: i32 = 14;
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, f);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .map(|(m, e)| (m, e.parse::<i32>().unwrap_or(0)))
        .unwrap_or((scientific.as_str(), 0));

    let mut out = if (-4..PRECISION).contains(&exponent) {
        let decimals = (PRECISION - 1 - exponent) as usize;
        strip_trailing_zeros(format!("{f:.decimals$}"))
    } else {
        let mantissa = strip_trailing_zeros(mantissa.to_string());
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    };

    if out.bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
        out.push_str(".0");
    }
    out
}

fn strip_trailing_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Raw equality: no hooks are consulted. Reference types compare by identity,
/// numbers by mathematical value.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.0 == b.0,
            (Value::Integer(i), Value::Number(f)) | (Value::Number(f), Value::Integer(i)) => {
                float_to_integer(f.0) == Some(*i)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Userdata(a), Value::Userdata(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Nil => 0u8.hash(state),
            Value::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            // Integers and integral floats must collide since they are equal
            Value::Integer(n) => {
                2u8.hash(state);
                n.hash(state);
            }
            Value::Number(n) => match float_to_integer(n.0) {
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None => {
                    3u8.hash(state);
                    n.hash(state);
                }
            },
            Value::String(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            Value::Table(t) => {
                5u8.hash(state);
                t.hash(state);
            }
            Value::Function(f) => {
                6u8.hash(state);
                std::ptr::hash(Rc::as_ptr(f), state);
            }
            Value::Userdata(u) => {
                7u8.hash(state);
                std::ptr::hash(Rc::as_ptr(u), state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Number(n) => write!(f, "{}", format_float(n.0)),
            Value::String(s) => write!(f, "{s}"),
            Value::Table(t) => write!(f, "table: {:p}", t.as_ptr()),
            Value::Function(func) => write!(f, "function: {}", func.name),
            Value::Userdata(u) => write!(f, "userdata: {:p}", Rc::as_ptr(u)),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<TableRef> for Value {
    fn from(t: TableRef) -> Self {
        Value::Table(t)
    }
}
