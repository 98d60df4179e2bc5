//! Collaborator contracts consumed by the permissions module.
//!
//! The module depends on these traits only; concrete query backends,
//! dependency graphs and stores are injected as `Arc<dyn ...>`:
//!
//! ```ignore
//! let lifecycle = PermissionLifecycle::new(compiler, store, graph);
//! lifecycle.create(&resource, &catalog, definition).await?;
//! ```

use async_trait::async_trait;

use crate::catalog::{ColumnType, FieldCatalog};
use crate::compiled::{CompiledPredicate, CompiledValue};
use crate::dependency::DependencyEdge;
use crate::error::{GraphError, PredicateCompileError, StoreError};
use crate::models::{PermissionKey, ResourceName};
use crate::rules::Document;

/// Compiles declarative predicate and value documents.
///
/// Compilation is synchronous and must not mutate shared state.
pub trait PredicateCompiler: Send + Sync {
    /// Compile a boolean predicate against `resource` and its catalog.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateCompileError`] with a breadcrumb inside `predicate`.
    fn compile_predicate(
        &self,
        resource: &ResourceName,
        catalog: &FieldCatalog,
        predicate: &Document,
    ) -> Result<CompiledPredicate, PredicateCompileError>;

    /// Compile a preset value for `column` of type `column_type`.
    ///
    /// The returned variant decides whether the value is static or reads a
    /// session variable.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateCompileError`] when the value does not fit the column type.
    fn compile_value(
        &self,
        resource: &ResourceName,
        column: &str,
        column_type: &ColumnType,
        value: &Document,
    ) -> Result<CompiledValue, PredicateCompileError>;
}

/// Raw definition persisted for one permission.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPermission {
    pub definition: Document,
    pub comment: Option<String>,
}

/// Keyed store of raw permission definitions.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn insert(
        &self,
        key: &PermissionKey,
        definition: Document,
        comment: Option<String>,
    ) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn delete(&self, key: &PermissionKey) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn update_comment(
        &self,
        key: &PermissionKey,
        comment: Option<String>,
    ) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    async fn fetch(&self, key: &PermissionKey) -> Result<Option<StoredPermission>, StoreError>;
}

/// Sink for schema dependency edges.
#[async_trait]
pub trait DependencyGraph: Send + Sync {
    /// Register the edges incurred by the permission `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the graph rejects the edges.
    async fn register(&self, key: &PermissionKey, edges: Vec<DependencyEdge>)
    -> Result<(), GraphError>;

    /// Remove every edge previously registered for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the graph fails.
    async fn unregister(&self, key: &PermissionKey) -> Result<(), GraphError>;
}
