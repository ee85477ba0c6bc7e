use im_rc::{HashMap, Vector};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::value::Value;
use crate::error::RuntimeError;

/// Native indexed collection.
///
/// Keys `1..=array.len()` live in the array part, every other key in the
/// hash part. Two invariants keep the array length a valid border:
/// the array part never ends with `nil`, and the hash part never holds the
/// key `array.len() + 1`.
#[derive(Debug, Clone, Default)]
pub struct Table {
    array: Vector<Value>,
    hash: HashMap<Value, Value>,
    metatable: Option<TableRef>,
}

/// Shared handle to a table; equality and hashing are by identity
#[derive(Clone, Default)]
pub struct TableRef(Rc<RefCell<Table>>);

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose array part holds `values` at keys `1..=values.len()`
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let mut array: Vector<Value> = values.into_iter().collect();
        while array.back().is_some_and(Value::is_nil) {
            array.pop_back();
        }
        Self {
            array,
            ..Self::default()
        }
    }

    pub fn into_ref(self) -> TableRef {
        TableRef(Rc::new(RefCell::new(self)))
    }

    /// Raw read, bypassing any metatable
    pub fn get(&self, key: &Value) -> Value {
        match key {
            Value::Integer(i) => self.get_int(*i),
            Value::Number(_) => match key.clone().normalize_key() {
                Value::Integer(i) => self.get_int(i),
                other => self.hash.get(&other).cloned().unwrap_or(Value::Nil),
            },
            _ => self.hash.get(key).cloned().unwrap_or(Value::Nil),
        }
    }

    pub fn get_int(&self, key: i64) -> Value {
        match self.array_slot(key) {
            Some(slot) => self.array[slot].clone(),
            None => self
                .hash
                .get(&Value::Integer(key))
                .cloned()
                .unwrap_or(Value::Nil),
        }
    }

    pub fn get_str(&self, key: &str) -> Value {
        self.get(&Value::string(key))
    }

    /// Raw write, bypassing any metatable. Assigning `nil` removes the key.
    pub fn set(&mut self, key: Value, value: Value) -> Result<(), RuntimeError> {
        match key.normalize_key() {
            Value::Nil => Err(RuntimeError::runtime("index is nil")),
            Value::Number(n) if n.0.is_nan() => Err(RuntimeError::runtime("index is NaN")),
            Value::Integer(i) => {
                self.set_int(i, value);
                Ok(())
            }
            key => {
                if value.is_nil() {
                    self.hash.remove(&key);
                } else {
                    self.hash.insert(key, value);
                }
                Ok(())
            }
        }
    }

    pub fn set_int(&mut self, key: i64, value: Value) {
        let len = self.array.len() as i64;
        if let Some(slot) = self.array_slot(key) {
            if value.is_nil() && key == len {
                self.array.pop_back();
                while self.array.back().is_some_and(Value::is_nil) {
                    self.array.pop_back();
                }
            } else {
                self.array.set(slot, value);
            }
        } else if key == len + 1 && !value.is_nil() {
            self.array.push_back(value);
            self.migrate_from_hash();
        } else if value.is_nil() {
            self.hash.remove(&Value::Integer(key));
        } else {
            self.hash.insert(Value::Integer(key), value);
        }
    }

    pub fn set_str(&mut self, key: &str, value: Value) {
        let key = Value::string(key);
        if value.is_nil() {
            self.hash.remove(&key);
        } else {
            self.hash.insert(key, value);
        }
    }

    /// Native size oracle: a border of the table
    pub fn border(&self) -> i64 {
        self.array.len() as i64
    }

    /// Number of entries stored outside the array part
    pub fn hash_len(&self) -> usize {
        self.hash.len()
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.metatable.clone()
    }

    pub fn set_metatable(&mut self, metatable: Option<TableRef>) {
        self.metatable = metatable;
    }

    fn array_slot(&self, key: i64) -> Option<usize> {
        if key >= 1 && key <= self.array.len() as i64 {
            Some((key - 1) as usize)
        } else {
            None
        }
    }

    /// Pull keys `len + 1, len + 2, ...` out of the hash part after an append
    fn migrate_from_hash(&mut self) {
        while let Some(value) = self
            .hash
            .remove(&Value::Integer(self.array.len() as i64 + 1))
        {
            self.array.push_back(value);
        }
    }
}

impl TableRef {
    pub fn new() -> Self {
        Table::new().into_ref()
    }

    pub fn borrow(&self) -> Ref<'_, Table> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Table> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &TableRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_ptr(&self) -> *const RefCell<Table> {
        Rc::as_ptr(&self.0)
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // tables may contain themselves; never recurse into the contents
        write!(f, "table: {:p}", self.as_ptr())
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TableRef {}

impl Hash for TableRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.as_ptr(), state);
    }
}
