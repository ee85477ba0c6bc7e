//! Comparator-driven in-place sort.
//!
//! Elements are only ever touched through indexed get/set on the host, so
//! the list may be a native table or a protocol-backed object, and a
//! comparator is free to mutate it mid-sort. The algorithm is an introsort:
//! median-of-three quicksort whose scans never leave the current range,
//! insertion sort for short ranges and heapsort once recursion gets too deep.
//! An inconsistent comparator therefore produces some permutation of the
//! input and never a runaway loop. The sort is not stable.

use log::{debug, trace};

use super::LOG;
use super::args::Args;
use super::collection::{Capabilities, Collection, resolve_border};
use crate::error::{ErrorKind, RuntimeError};
use crate::vm::{VM, Value};

/// Ranges shorter than this are finished with insertion sort
const INSERTION_THRESHOLD: i64 = 12;

/// table.sort(list [, comp])
pub(super) fn table_sort(vm: &mut VM, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
    let args = Args::new("sort", args);
    let (list, border) = resolve_border(vm, args.get(1), 1, "sort", Capabilities::READ_WRITE)?;
    let comparator = args.opt_function(2)?;

    sort_list(vm, &list, border, comparator)?;
    Ok(Vec::new())
}

/// Sort `list[1..=#list]` in place, by `comparator` when given (a function
/// returning true when its first argument must come first) or by the
/// runtime's native less-than
pub fn sort(vm: &mut VM, list: &Value, comparator: Option<&Value>) -> Result<(), RuntimeError> {
    let (list, border) = resolve_border(vm, Some(list), 1, "sort", Capabilities::READ_WRITE)?;
    let comparator = match comparator {
        None | Some(Value::Nil) => None,
        Some(f @ Value::Function(_)) => Some(f.clone()),
        Some(other) => {
            return Err(RuntimeError::type_mismatch(2, "sort", "function", Some(other)));
        }
    };
    sort_list(vm, &list, border, comparator)
}

fn sort_list(
    vm: &mut VM,
    list: &Collection,
    border: i64,
    comparator: Option<Value>,
) -> Result<(), RuntimeError> {
    if border <= 1 {
        return Ok(());
    }
    if border >= i64::from(i32::MAX) {
        return Err(RuntimeError::bad_argument(1, "sort", "array too big"));
    }

    trace!(
        target: LOG,
        "sort {border} elements ({})",
        if comparator.is_some() { "comparator" } else { "native order" }
    );

    let mut sorter = Sorter {
        vm,
        list,
        comparator,
    };
    sorter.sort_range(1, border, depth_limit(border))
}

/// Quicksort recursion budget before falling back to heapsort: 2 * log2(n)
fn depth_limit(n: i64) -> u32 {
    2 * (u64::BITS - (n as u64).leading_zeros())
}

struct Sorter<'a> {
    vm: &'a mut VM,
    list: &'a Collection,
    comparator: Option<Value>,
}

impl Sorter<'_> {
    fn get(&mut self, index: i64) -> Result<Value, RuntimeError> {
        self.list.get(self.vm, index)
    }

    fn less(&mut self, a: &Value, b: &Value) -> Result<bool, RuntimeError> {
        let Some(comparator) = &self.comparator else {
            return self.vm.less_than(a, b);
        };

        match self.vm.pcall(comparator, &[a.clone(), b.clone()]) {
            Ok(result) => Ok(result.is_truthy()),
            Err(err) => {
                debug!(target: LOG, "sort comparator failed: {}", err.message);
                let message = format!("error in sort comparator: {}", err.message);
                Err(err.wrap(ErrorKind::Runtime, message))
            }
        }
    }

    fn less_at(&mut self, i: i64, j: i64) -> Result<bool, RuntimeError> {
        let a = self.get(i)?;
        let b = self.get(j)?;
        self.less(&a, &b)
    }

    /// Both values are read before either is written
    fn swap(&mut self, i: i64, j: i64) -> Result<(), RuntimeError> {
        let a = self.get(i)?;
        let b = self.get(j)?;
        self.list.set(self.vm, i, b)?;
        self.list.set(self.vm, j, a)
    }

    fn sort_range(&mut self, mut lo: i64, mut hi: i64, mut depth: u32) -> Result<(), RuntimeError> {
        while hi - lo >= INSERTION_THRESHOLD {
            if depth == 0 {
                debug!(target: LOG, "sort: depth limit hit on [{lo}, {hi}], using heapsort");
                return self.heap_sort(lo, hi);
            }
            depth -= 1;

            let p = self.partition(lo, hi)?;
            // recurse into the smaller half, loop on the larger one
            if p - lo < hi - p {
                self.sort_range(lo, p - 1, depth)?;
                lo = p + 1;
            } else {
                self.sort_range(p + 1, hi, depth)?;
                hi = p - 1;
            }
        }

        self.insertion_sort(lo, hi)
    }

    /// Partition `[lo, hi]` (at least three elements) around the median of
    /// its first, middle and last elements. Returns the pivot's final index,
    /// always strictly inside `(lo, hi)`.
    fn partition(&mut self, lo: i64, hi: i64) -> Result<i64, RuntimeError> {
        let mid = lo + (hi - lo) / 2;

        if self.less_at(mid, lo)? {
            self.swap(mid, lo)?;
        }
        if self.less_at(hi, mid)? {
            self.swap(hi, mid)?;
            if self.less_at(mid, lo)? {
                self.swap(mid, lo)?;
            }
        }

        // a[lo] <= P <= a[hi]; park the pivot next to the upper sentinel
        let pivot = self.get(mid)?;
        self.swap(mid, hi - 1)?;

        let mut i = lo;
        let mut j = hi - 1;
        loop {
            i += 1;
            while i < hi - 1 {
                let value = self.get(i)?;
                if !self.less(&value, &pivot)? {
                    break;
                }
                i += 1;
            }

            j -= 1;
            while j > lo {
                let value = self.get(j)?;
                if !self.less(&pivot, &value)? {
                    break;
                }
                j -= 1;
            }

            if j < i {
                break;
            }
            self.swap(i, j)?;
        }

        self.swap(hi - 1, i)?;
        Ok(i)
    }

    fn insertion_sort(&mut self, lo: i64, hi: i64) -> Result<(), RuntimeError> {
        for k in lo + 1..=hi {
            let mut m = k;
            while m > lo && self.less_at(m, m - 1)? {
                self.swap(m, m - 1)?;
                m -= 1;
            }
        }
        Ok(())
    }

    fn heap_sort(&mut self, lo: i64, hi: i64) -> Result<(), RuntimeError> {
        let len = hi - lo + 1;
        for root in (0..len / 2).rev() {
            self.sift_down(lo, root, len)?;
        }
        for end in (1..len).rev() {
            self.swap(lo, lo + end)?;
            self.sift_down(lo, 0, end)?;
        }
        Ok(())
    }

    /// Restore the max-heap property below `root` within `base..base + len`
    fn sift_down(&mut self, base: i64, mut root: i64, len: i64) -> Result<(), RuntimeError> {
        loop {
            let mut child = 2 * root + 1;
            if child >= len {
                return Ok(());
            }
            if child + 1 < len && self.less_at(base + child, base + child + 1)? {
                child += 1;
            }
            if !self.less_at(base + root, base + child)? {
                return Ok(());
            }
            self.swap(base + root, base + child)?;
            root = child;
        }
    }
}
