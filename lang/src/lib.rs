//! Table manipulation library for an embeddable scripting runtime.
//!
//! The [`vm`] module is the host: values, tables, metatable hooks and the
//! call/compare primitives. The [`tablib`] module is the library proper,
//! written exclusively against that host interface so it works the same on
//! native tables and on objects that merely mimic one.

pub mod error;
pub mod tablib;
pub mod vm;
