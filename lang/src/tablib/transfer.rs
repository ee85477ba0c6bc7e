//! Bulk transfer between collection ranges and flat value lists:
//! `concat`, `pack` and `unpack`.

use log::trace;

use super::LOG;
use super::args::Args;
use super::collection::{Capabilities, Collection, check_collection, resolve_border};
use crate::error::RuntimeError;
use crate::vm::{Table, TableRef, VM, Value};

/// Upper bound on the number of values a single `unpack` may produce
pub const MAX_RESULTS: usize = 1_000_000;

/// Options of `concat`; unset bounds default to `1` and the border
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatOptions {
    pub separator: String,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl ConcatOptions {
    pub fn separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }

    pub fn range(mut self, from: i64, to: i64) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}

/// table.concat(list [, sep [, i [, j]]])
pub(super) fn table_concat(vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
    let args = Args::new("concat", args);
    let (list, border) = resolve_border(vm, args.get(1), 1, "concat", Capabilities::READ)?;
    let options = ConcatOptions {
        separator: args
            .opt_string(2)?
            .map(|s| s.to_string())
            .unwrap_or_default(),
        from: args.opt_integer(3)?,
        to: args.opt_integer(4)?,
    };

    let joined = concat_range(vm, &list, border, &options)?;
    Ok(vec![Value::string(joined)])
}

/// Join `list[from..=to]` with the separator. Every element must be a string
/// or a number.
pub fn concat(vm: &mut VM, list: &Value, options: &ConcatOptions) -> Result<String, RuntimeError> {
    let (list, border) = resolve_border(vm, Some(list), 1, "concat", Capabilities::READ)?;
    concat_range(vm, &list, border, options)
}

fn concat_range(
    vm: &mut VM,
    list: &Collection,
    border: i64,
    options: &ConcatOptions,
) -> Result<String, RuntimeError> {
    let from = options.from.unwrap_or(1);
    let to = options.to.unwrap_or(border);
    trace!(target: LOG, "concat [{from}, {to}] (border {border})");

    let mut joined = String::new();
    for k in from..=to {
        let value = list.get(vm, k)?;
        let Some(text) = value.to_str_coerced() else {
            return Err(RuntimeError::type_error(format!(
                "invalid value ({}) at index {k} in table for 'concat'",
                value.type_name()
            )));
        };
        if k != from {
            joined.push_str(&options.separator);
        }
        joined.push_str(&text);
    }

    Ok(joined)
}

/// table.pack(...)
pub(super) fn table_pack(_vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
    Ok(vec![Value::Table(pack(args))])
}

/// Fresh table holding `values` at keys `1..=n`, plus the field `n`
pub fn pack(values: &[Value]) -> TableRef {
    let mut table = Table::from_values(values.iter().cloned());
    table.set_str("n", Value::Integer(values.len() as i64));
    table.into_ref()
}

/// Bounds of `unpack`; unset bounds default to `1` and the border
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpackRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl UnpackRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }
}

/// table.unpack(list [, i [, j]])
pub(super) fn table_unpack(vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
    let args = Args::new("unpack", args);
    let range = UnpackRange {
        from: args.opt_integer(2)?,
        to: args.opt_integer(3)?,
    };
    unpack(vm, &args.value(1), range)
}

/// `list[from], list[from + 1], ..., list[to]`
///
/// The border is only computed when `to` has to be defaulted.
pub fn unpack(vm: &mut VM, list: &Value, range: UnpackRange) -> Result<Vec<Value>, RuntimeError> {
    let (list, to) = match range.to {
        Some(to) => {
            let list = check_collection(Some(list), 1, "unpack", Capabilities::READ)?;
            (list, to)
        }
        None => resolve_border(vm, Some(list), 1, "unpack", Capabilities::READ)?,
    };
    let from = range.from.unwrap_or(1);

    let count = to as i128 - from as i128 + 1;
    if count <= 0 || count > MAX_RESULTS as i128 || !vm.check_stack(count as usize) {
        return Err(too_many_results());
    }

    let mut results = Vec::new();
    results
        .try_reserve_exact(count as usize)
        .map_err(|_| too_many_results())?;

    trace!(target: LOG, "unpack [{from}, {to}]");
    for k in from..=to {
        results.push(list.get(vm, k)?);
    }
    Ok(results)
}

fn too_many_results() -> RuntimeError {
    RuntimeError::runtime("too many results to unpack")
}
