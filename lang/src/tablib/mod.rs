//! The `table` library: generic operations on indexed collections.
//!
//! Whenever an operation needs the length of a collection it computes a
//! border for the duration of that call only. All functions ignore
//! non-numeric keys and keys outside the range they operate on.
//!
//! Each operation exists twice: as a typed Rust function taking an options
//! structure (`concat`, `insert`, ...) and as a dynamically-typed native
//! function registered in the namespace built by [`open`].

mod args;
pub mod collection;
mod mutate;
mod sort;
mod transfer;

pub use collection::{Capabilities, Collection, check_collection};
pub use mutate::{MoveRange, insert, move_range, remove};
pub use sort::sort;
pub use transfer::{ConcatOptions, MAX_RESULTS, UnpackRange, concat, pack, unpack};

use crate::error::RuntimeError;
use crate::vm::{Table, TableRef, VM, Value};

static LOG: &str = "tablib";

/// Functions exported by the `table` namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFunction {
    Concat,
    Insert,
    Move,
    Pack,
    Remove,
    Sort,
    Unpack,
}

impl TableFunction {
    pub const ALL: [TableFunction; 7] = [
        TableFunction::Concat,
        TableFunction::Insert,
        TableFunction::Move,
        TableFunction::Pack,
        TableFunction::Remove,
        TableFunction::Sort,
        TableFunction::Unpack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableFunction::Concat => "concat",
            TableFunction::Insert => "insert",
            TableFunction::Move => "move",
            TableFunction::Pack => "pack",
            TableFunction::Remove => "remove",
            TableFunction::Sort => "sort",
            TableFunction::Unpack => "unpack",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Run the function with positional arguments, returning its results
    pub fn call(self, vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        match self {
            TableFunction::Concat => transfer::table_concat(vm, args),
            TableFunction::Insert => mutate::table_insert(vm, args),
            TableFunction::Move => mutate::table_move(vm, args),
            TableFunction::Pack => transfer::table_pack(vm, args),
            TableFunction::Remove => mutate::table_remove(vm, args),
            TableFunction::Sort => sort::table_sort(vm, args),
            TableFunction::Unpack => transfer::table_unpack(vm, args),
        }
    }
}

/// Build the `table` namespace, bind it to the global `table` and return it
pub fn open(vm: &mut VM) -> TableRef {
    let mut namespace = Table::new();
    for function in TableFunction::ALL {
        let native = Value::function(format!("table.{}", function.name()), move |vm, args| {
            function.call(vm, args)
        });
        namespace.set_str(function.name(), native);
    }

    let namespace = namespace.into_ref();
    vm.set_global("table", Value::Table(namespace.clone()));
    namespace
}
