//! Graph engine: construction, cycle detection and linearization.

pub mod builder;
pub mod cycle;
pub mod linearize;

pub use builder::Graph;
pub use cycle::{CyclePath, find_cycle};
pub use linearize::{Linearization, linearize};
