//! Handler module - the state machine's reducer
//!
//! - `update`: the pure `reduce()` transition function

pub(crate) mod update;

#[cfg(test)]
mod tests;

pub use update::reduce;
