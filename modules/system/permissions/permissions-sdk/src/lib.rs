#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Permissions SDK
//!
//! This crate provides the public contract of the `permissions` module:
//!
//! - [`PermissionDefinition`], [`PermissionRule`] - Authored rules per kind
//! - [`FieldCatalog`] - Field snapshot a rule is compiled against
//! - [`CompiledPermission`] - Artifacts consumed by query-time enforcement
//! - [`DependencyEdge`] - Schema dependencies incurred by compilation
//! - [`PredicateCompiler`], [`PermissionStore`], [`DependencyGraph`] - Collaborator traits
//! - [`PermissionError`] - Error taxonomy with breadcrumb paths
//! - [`backend_only`] - Visibility decision for backend-only writes

pub mod api;
pub mod backend_only;
pub mod catalog;
pub mod compiled;
pub mod dependency;
pub mod error;
pub mod models;
pub mod rules;

pub use api::{DependencyGraph, PermissionStore, PredicateCompiler, StoredPermission};
pub use backend_only::{SecretStatus, Visibility, decide};
pub use catalog::{ColumnType, ComputedFieldReturn, FieldCatalog, FieldInfo, FieldKind};
pub use compiled::{
    CompiledDelete, CompiledFilter, CompiledInsert, CompiledPermission, CompiledPredicate,
    CompiledSelect, CompiledUpdate, CompiledValue, PresetAssignments,
};
pub use dependency::{DependencyEdge, DependencyReason, DependencySet, DependencyTarget};
pub use error::{
    ErrorCategory, ErrorPath, GraphError, PathSegment, PermissionError, PermissionErrorKind,
    PredicateCompileError, StoreError,
};
pub use models::{
    FieldName, PermissionKey, PermissionKind, ResourceName, RoleName, SessionVariable,
};
pub use rules::{
    ColumnSpec, DeleteRule, Document, InsertRule, PermissionDefinition, PermissionRule,
    PresetDocument, SelectRule, UpdateRule,
};
