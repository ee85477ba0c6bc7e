//! Structural mutators: `insert`, `remove` and `move`.
//!
//! Every shift picks its iteration order so that no element is overwritten
//! before it has been read.

use log::{debug, trace};

use super::LOG;
use super::args::Args;
use super::collection::{Capabilities, Collection, check_collection, resolve_border};
use crate::error::{ErrorKind, RuntimeError};
use crate::vm::{VM, Value};

/// table.insert(list, [pos,] value)
pub(super) fn table_insert(vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
    let args = Args::new("insert", args);
    let (list, border) = resolve_border(vm, args.get(1), 1, "insert", Capabilities::READ_WRITE)?;

    match args.len() {
        2 => insert_at(vm, &list, border, None, args.value(2))?,
        3 => {
            let position = args.check_integer(2)?;
            insert_at(vm, &list, border, Some(position), args.value(3))?
        }
        _ => {
            return Err(RuntimeError::new(
                ErrorKind::Argument,
                "wrong number of arguments to 'insert'",
            ));
        }
    }

    Ok(Vec::new())
}

/// Insert `value` at `position` (default: append), shifting later elements up
pub fn insert(
    vm: &mut VM,
    list: &Value,
    position: Option<i64>,
    value: Value,
) -> Result<(), RuntimeError> {
    let (list, border) = resolve_border(vm, Some(list), 1, "insert", Capabilities::READ_WRITE)?;
    insert_at(vm, &list, border, position, value)
}

fn insert_at(
    vm: &mut VM,
    list: &Collection,
    border: i64,
    position: Option<i64>,
    value: Value,
) -> Result<(), RuntimeError> {
    // first empty slot
    let end = border.wrapping_add(1);

    let position = match position {
        None => end,
        Some(pos) => {
            if pos < 1 || pos > end {
                return Err(RuntimeError::bad_argument(2, "insert", "position out of bounds"));
            }
            // high to low: t[i] = t[i - 1]
            for i in (pos + 1..=end).rev() {
                let moved = list.get(vm, i - 1)?;
                list.set(vm, i, moved)?;
            }
            pos
        }
    };

    trace!(target: LOG, "insert at {position} (border {border})");
    list.set(vm, position, value)
}

/// table.remove(list [, pos])
pub(super) fn table_remove(vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
    let args = Args::new("remove", args);
    let (list, border) = resolve_border(vm, args.get(1), 1, "remove", Capabilities::READ_WRITE)?;
    let position = args.opt_integer(2)?;

    Ok(remove_at(vm, &list, border, position)?.into_iter().collect())
}

/// Remove and return the element at `position` (default: the last one).
///
/// Valid positions are the border itself and `1..=border + 1`; anything else
/// leaves the list untouched and returns `None` rather than failing, so that
/// removing from an already empty list is harmless.
pub fn remove(
    vm: &mut VM,
    list: &Value,
    position: Option<i64>,
) -> Result<Option<Value>, RuntimeError> {
    let (list, border) = resolve_border(vm, Some(list), 1, "remove", Capabilities::READ_WRITE)?;
    remove_at(vm, &list, border, position)
}

fn remove_at(
    vm: &mut VM,
    list: &Collection,
    border: i64,
    position: Option<i64>,
) -> Result<Option<Value>, RuntimeError> {
    let mut pos = position.unwrap_or(border);

    if pos != border && (pos < 1 || pos > border.wrapping_add(1)) {
        debug!(target: LOG, "remove: position {pos} outside 1..={} ignored", border.wrapping_add(1));
        return Ok(None);
    }

    let removed = list.get(vm, pos)?;
    // low to high: t[pos] = t[pos + 1]
    while pos < border {
        let next = list.get(vm, pos + 1)?;
        list.set(vm, pos, next)?;
        pos += 1;
    }
    list.set(vm, pos, Value::Nil)?;

    Ok(Some(removed))
}

/// Source range `[first, last]` and destination start of a `move`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRange {
    pub first: i64,
    pub last: i64,
    pub dest: i64,
}

/// table.move(a1, f, e, t [, a2])
pub(super) fn table_move(vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
    let args = Args::new("move", args);
    let range = MoveRange {
        first: args.check_integer(2)?,
        last: args.check_integer(3)?,
        dest: args.check_integer(4)?,
    };
    let target_position = if args.is_none_or_nil(5) { 1 } else { 5 };

    let source = args.collection(1, Capabilities::READ)?;
    let target = args.collection(target_position, Capabilities::WRITE)?;
    move_between(vm, &source, range, &target)?;

    Ok(vec![target.as_value()])
}

/// Copy `source[first..=last]` into `target` (default: `source`) starting at
/// `dest`, returning the destination collection
pub fn move_range(
    vm: &mut VM,
    source: &Value,
    range: MoveRange,
    target: Option<&Value>,
) -> Result<Value, RuntimeError> {
    let source_collection = check_collection(Some(source), 1, "move", Capabilities::READ)?;
    let target_collection = match target {
        Some(target) => check_collection(Some(target), 5, "move", Capabilities::WRITE)?,
        None => check_collection(Some(source), 1, "move", Capabilities::WRITE)?,
    };
    move_between(vm, &source_collection, range, &target_collection)?;
    Ok(target_collection.as_value())
}

fn move_between(
    vm: &mut VM,
    source: &Collection,
    range: MoveRange,
    target: &Collection,
) -> Result<(), RuntimeError> {
    let MoveRange { first: f, last: e, dest: t } = range;

    if e < f {
        trace!(target: LOG, "move: empty range [{f}, {e}]");
        return Ok(());
    }
    if !(f > 0 || e < i64::MAX + f) {
        return Err(RuntimeError::bad_argument(3, "move", "too many elements to move"));
    }
    let n = e - f + 1;
    if t > i64::MAX - n + 1 {
        return Err(RuntimeError::bad_argument(4, "move", "destination wrap around"));
    }

    if t > e || t <= f || !source.same_as(target) {
        trace!(target: LOG, "move: {n} elements from {f} to {t}, forward");
        for i in 0..n {
            let value = source.get(vm, f + i)?;
            target.set(vm, t + i, value)?;
        }
    } else {
        // destination starts inside the source range: copy from the end
        debug!(target: LOG, "move: {n} elements from {f} to {t}, backward");
        for i in (0..n).rev() {
            let value = source.get(vm, f + i)?;
            target.set(vm, t + i, value)?;
        }
    }

    Ok(())
}
