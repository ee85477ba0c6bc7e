pub mod runtime;
pub mod table;
pub mod value;

// Re-export commonly used types
pub use crate::error::{ErrorKind, RuntimeError};
pub use runtime::{Limits, VM};
pub use table::{Table, TableRef};
pub use value::Value;

#[cfg(test)]
mod tests;
