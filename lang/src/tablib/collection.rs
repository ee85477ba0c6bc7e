//! Capability checking and border resolution.
//!
//! A library argument qualifies as a collection when it is a native table,
//! or when its metatable carries the hooks for every operation the call
//! needs. Reading also requires a length hook. Hooks are probed with raw
//! lookups on the metatable itself, so a metatable that only inherits a hook
//! through its own metatable does not qualify.

use std::ops::BitOr;

use crate::error::RuntimeError;
use crate::vm::value::float_to_integer;
use crate::vm::{TableRef, VM, Value};

/// Operations an argument must support to take part in a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const READ: Self = Self(1);
    pub const WRITE: Self = Self(1 << 1);
    pub const LENGTH: Self = Self(1 << 2);
    pub const READ_WRITE: Self = Self(Self::READ.0 | Self::WRITE.0);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Hook that stands in for each capability on a non-table argument
const HOOKS: [(Capabilities, &str); 3] = [
    (Capabilities::READ, "__index"),
    (Capabilities::WRITE, "__newindex"),
    (Capabilities::LENGTH, "__len"),
];

/// A capability-checked collection argument
#[derive(Debug, Clone)]
pub enum Collection {
    /// Direct indexed storage with a native size oracle
    Native(TableRef),
    /// Any other value whose metatable supplies the needed hooks
    Protocol { object: Value, metatable: TableRef },
}

/// Verify that `value` (argument `position` of `function`) is a table, or
/// mimics one well enough to support `required`
pub fn check_collection(
    value: Option<&Value>,
    position: usize,
    function: &str,
    required: Capabilities,
) -> Result<Collection, RuntimeError> {
    let required = if required.contains(Capabilities::READ) {
        required | Capabilities::LENGTH
    } else {
        required
    };

    match value {
        Some(Value::Table(t)) => Ok(Collection::Native(t.clone())),
        Some(other) => match other.metatable() {
            Some(metatable) if has_hooks(&metatable, required) => Ok(Collection::Protocol {
                object: other.clone(),
                metatable,
            }),
            _ => Err(RuntimeError::type_mismatch(
                position,
                function,
                "table",
                Some(other),
            )),
        },
        None => Err(RuntimeError::type_mismatch(position, function, "table", None)),
    }
}

fn has_hooks(metatable: &TableRef, required: Capabilities) -> bool {
    let metatable = metatable.borrow();
    HOOKS
        .iter()
        .filter(|(capability, _)| required.contains(*capability))
        .all(|(_, hook)| !metatable.get_str(hook).is_nil())
}

impl Collection {
    pub fn as_value(&self) -> Value {
        match self {
            Collection::Native(t) => Value::Table(t.clone()),
            Collection::Protocol { object, .. } => object.clone(),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Collection::Native(_))
    }

    /// Identity comparison; contents are never inspected
    pub fn same_as(&self, other: &Collection) -> bool {
        match (self, other) {
            (Collection::Native(a), Collection::Native(b)) => a.ptr_eq(b),
            (Collection::Protocol { object: a, .. }, Collection::Protocol { object: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }

    /// `list[index]` through the host, hooks included
    pub fn get(&self, vm: &mut VM, index: i64) -> Result<Value, RuntimeError> {
        vm.get_int(&self.as_value(), index)
    }

    /// `list[index] = value` through the host, hooks included
    pub fn set(&self, vm: &mut VM, index: i64, value: Value) -> Result<(), RuntimeError> {
        vm.set_int(&self.as_value(), index, value)
    }

    /// The border for the current call: the native size oracle for tables,
    /// the `__len` hook otherwise
    pub fn border(&self, vm: &mut VM) -> Result<i64, RuntimeError> {
        match self {
            Collection::Native(t) => Ok(t.borrow().border()),
            Collection::Protocol { object, .. } => match vm.length(object)? {
                Value::Integer(n) => Ok(n),
                Value::Number(f) => float_to_integer(f.0).ok_or_else(not_an_integer),
                _ => Err(not_an_integer()),
            },
        }
    }
}

fn not_an_integer() -> RuntimeError {
    RuntimeError::type_error("object length is not an integer")
}

/// Check argument `position` for `required | LENGTH` and compute its border
pub(super) fn resolve_border(
    vm: &mut VM,
    value: Option<&Value>,
    position: usize,
    function: &str,
    required: Capabilities,
) -> Result<(Collection, i64), RuntimeError> {
    let collection = check_collection(value, position, function, required | Capabilities::LENGTH)?;
    let border = collection.border(vm)?;
    Ok((collection, border))
}
