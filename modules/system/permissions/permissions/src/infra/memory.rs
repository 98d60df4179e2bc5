//! In-memory permission store and dependency graph.
//!
//! Used for single-process deployments and tests. Both are `Send + Sync`;
//! callers still serialize metadata edits themselves.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use permissions_sdk::{
    DependencyEdge, DependencyGraph, DependencyTarget, Document, GraphError, PermissionKey,
    PermissionStore, ResourceName, StoreError, StoredPermission,
};

#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    entries: RwLock<HashMap<PermissionKey, StoredPermission>>,
}

impl InMemoryPermissionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Keys of every permission defined on `resource`.
    #[must_use]
    pub fn keys_for(&self, resource: &ResourceName) -> Vec<PermissionKey> {
        let mut keys: Vec<_> = self
            .entries
            .read()
            .keys()
            .filter(|k| &k.resource == resource)
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn insert(
        &self,
        key: &PermissionKey,
        definition: Document,
        comment: Option<String>,
    ) -> Result<(), StoreError> {
        self.entries.write().insert(
            key.clone(),
            StoredPermission {
                definition,
                comment,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &PermissionKey) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn update_comment(
        &self,
        key: &PermissionKey,
        comment: Option<String>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(key)
            .ok_or_else(|| StoreError::Backend(format!("no stored entry for {key}")))?;
        entry.comment = comment;
        Ok(())
    }

    async fn fetch(&self, key: &PermissionKey) -> Result<Option<StoredPermission>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDependencyGraph {
    edges: RwLock<HashMap<PermissionKey, Vec<DependencyEdge>>>,
}

impl InMemoryDependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Edges registered for `key`, empty when none.
    #[must_use]
    pub fn edges_for(&self, key: &PermissionKey) -> Vec<DependencyEdge> {
        self.edges.read().get(key).cloned().unwrap_or_default()
    }

    /// Permissions that must be invalidated when `target` changes.
    #[must_use]
    pub fn dependents_of(&self, target: &DependencyTarget) -> Vec<PermissionKey> {
        let mut keys: Vec<_> = self
            .edges
            .read()
            .iter()
            .filter(|(_, edges)| edges.iter().any(|e| &e.target == target))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    #[must_use]
    pub fn registered_keys(&self) -> usize {
        self.edges.read().len()
    }
}

#[async_trait]
impl DependencyGraph for InMemoryDependencyGraph {
    async fn register(
        &self,
        key: &PermissionKey,
        edges: Vec<DependencyEdge>,
    ) -> Result<(), GraphError> {
        self.edges.write().insert(key.clone(), edges);
        Ok(())
    }

    async fn unregister(&self, key: &PermissionKey) -> Result<(), GraphError> {
        self.edges.write().remove(key);
        Ok(())
    }
}
