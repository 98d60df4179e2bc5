//! In-process collaborators.

pub mod bool_exp;
pub mod memory;

pub use bool_exp::BoolExpCompiler;
pub use memory::{InMemoryDependencyGraph, InMemoryPermissionStore};
