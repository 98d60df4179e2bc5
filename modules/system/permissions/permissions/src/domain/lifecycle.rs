use std::sync::Arc;

use permissions_sdk::{
    DependencyGraph, FieldCatalog, PermissionDefinition, PermissionError, PermissionErrorKind,
    PermissionKey, PermissionKind, PermissionRule, PermissionStore, PredicateCompiler,
    ResourceName, RoleName, StoredPermission,
};

use super::compiler::{CompilationOutput, compile_rule};

fn collaborator_failed(
    op: &str,
    key: &PermissionKey,
    e: impl Into<PermissionError>,
) -> PermissionError {
    let err = e.into();
    tracing::warn!(
        operation = op,
        permission = %key,
        error = %err,
        "permission collaborator failed"
    );
    err
}

/// Create, drop, comment and inspect role permissions.
///
/// Conflict checks run before compilation and compilation runs before any
/// write, so a rejected request leaves the store and the dependency graph
/// untouched. Operations are read-then-write; callers serialize them.
pub struct PermissionLifecycle {
    compiler: Arc<dyn PredicateCompiler>,
    store: Arc<dyn PermissionStore>,
    graph: Arc<dyn DependencyGraph>,
}

impl PermissionLifecycle {
    #[must_use]
    pub fn new(
        compiler: Arc<dyn PredicateCompiler>,
        store: Arc<dyn PermissionStore>,
        graph: Arc<dyn DependencyGraph>,
    ) -> Self {
        Self {
            compiler,
            store,
            graph,
        }
    }

    /// Compile `definition` without touching storage or the graph.
    ///
    /// # Errors
    ///
    /// Any schema, validation or predicate compiler error.
    pub fn compile(
        &self,
        resource: &ResourceName,
        catalog: &FieldCatalog,
        definition: &PermissionDefinition,
    ) -> Result<CompilationOutput, PermissionError> {
        compile_rule(self.compiler.as_ref(), resource, catalog, &definition.rule)
    }

    /// Compile and persist a new permission, then register its edges.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` when the key is taken
    /// - any compilation error, in which case nothing is written
    /// - `Internal` when a collaborator fails
    #[tracing::instrument(
        skip_all,
        fields(resource = %resource, role = %definition.role, kind = %definition.kind())
    )]
    pub async fn create(
        &self,
        resource: &ResourceName,
        catalog: &FieldCatalog,
        definition: PermissionDefinition,
    ) -> Result<CompilationOutput, PermissionError> {
        let key = PermissionKey::new(
            resource.clone(),
            definition.role.clone(),
            definition.kind(),
        );

        if self.lookup(&key).await?.is_some() {
            return Err(PermissionErrorKind::AlreadyExists(key).into());
        }

        let output = self.compile(resource, catalog, &definition)?;
        let document = definition.rule.to_document()?;

        self.store
            .insert(&key, document, definition.comment)
            .await
            .map_err(|e| collaborator_failed("insert", &key, e))?;
        self.graph
            .register(&key, output.dependencies.clone())
            .await
            .map_err(|e| collaborator_failed("register", &key, e))?;

        tracing::info!(
            dependencies = output.dependencies.len(),
            backend_only = output.permission.backend_only(),
            "permission created"
        );
        Ok(output)
    }

    /// Remove a permission and its dependency edges.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no such permission exists
    /// - `Internal` when a collaborator fails
    #[tracing::instrument(skip_all, fields(resource = %resource, role = %role, kind = %kind))]
    pub async fn drop_permission(
        &self,
        resource: &ResourceName,
        role: &RoleName,
        kind: PermissionKind,
    ) -> Result<(), PermissionError> {
        let key = PermissionKey::new(resource.clone(), role.clone(), kind);
        self.require(&key).await?;

        self.store
            .delete(&key)
            .await
            .map_err(|e| collaborator_failed("delete", &key, e))?;
        self.graph
            .unregister(&key)
            .await
            .map_err(|e| collaborator_failed("unregister", &key, e))?;

        tracing::info!("permission dropped");
        Ok(())
    }

    /// Replace the comment of an existing permission.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no such permission exists
    /// - `Internal` when the store fails
    #[tracing::instrument(skip_all, fields(resource = %resource, role = %role, kind = %kind))]
    pub async fn set_comment(
        &self,
        resource: &ResourceName,
        role: &RoleName,
        kind: PermissionKind,
        comment: Option<String>,
    ) -> Result<(), PermissionError> {
        let key = PermissionKey::new(resource.clone(), role.clone(), kind);
        self.require(&key).await?;

        self.store
            .update_comment(&key, comment)
            .await
            .map_err(|e| collaborator_failed("update_comment", &key, e))
    }

    /// Drop every kind of permission `role` holds on `resource`.
    ///
    /// Returns the kinds that were actually dropped.
    ///
    /// # Errors
    ///
    /// `Internal` when a collaborator fails; missing kinds are skipped.
    #[tracing::instrument(skip_all, fields(resource = %resource, role = %role))]
    pub async fn purge(
        &self,
        resource: &ResourceName,
        role: &RoleName,
    ) -> Result<Vec<PermissionKind>, PermissionError> {
        let mut dropped = Vec::new();
        for kind in PermissionKind::ALL {
            match self.drop_permission(resource, role, kind).await {
                Ok(()) => dropped.push(kind),
                Err(e) if matches!(e.kind, PermissionErrorKind::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(dropped = dropped.len(), "purged role permissions");
        Ok(dropped)
    }

    /// Stored definition document and comment.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no such permission exists
    /// - `Internal` when the store fails
    pub async fn fetch(
        &self,
        resource: &ResourceName,
        role: &RoleName,
        kind: PermissionKind,
    ) -> Result<StoredPermission, PermissionError> {
        let key = PermissionKey::new(resource.clone(), role.clone(), kind);
        self.require(&key).await
    }

    /// Recompile a stored permission against a fresh catalog.
    ///
    /// Used when the resource's fields change: the stored definition is
    /// compiled again and its dependency edges are re-registered.
    ///
    /// # Errors
    ///
    /// - `NotFound` when no such permission exists
    /// - `InvalidDocument` when the stored definition no longer parses
    /// - any compilation error, in which case the old edges stay registered
    #[tracing::instrument(skip_all, fields(resource = %resource, role = %role, kind = %kind))]
    pub async fn recompile(
        &self,
        resource: &ResourceName,
        role: &RoleName,
        kind: PermissionKind,
        catalog: &FieldCatalog,
    ) -> Result<CompilationOutput, PermissionError> {
        let key = PermissionKey::new(resource.clone(), role.clone(), kind);
        let stored = self.require(&key).await?;

        let rule = PermissionRule::from_document(kind, stored.definition).map_err(|e| {
            PermissionError::from(PermissionErrorKind::InvalidDocument(e.to_string()))
        })?;
        let output = compile_rule(self.compiler.as_ref(), resource, catalog, &rule)?;

        self.graph
            .register(&key, output.dependencies.clone())
            .await
            .map_err(|e| collaborator_failed("register", &key, e))?;

        tracing::debug!(dependencies = output.dependencies.len(), "permission recompiled");
        Ok(output)
    }

    async fn lookup(
        &self,
        key: &PermissionKey,
    ) -> Result<Option<StoredPermission>, PermissionError> {
        self.store
            .fetch(key)
            .await
            .map_err(|e| collaborator_failed("fetch", key, e))
    }

    async fn require(&self, key: &PermissionKey) -> Result<StoredPermission, PermissionError> {
        self.lookup(key)
            .await?
            .ok_or_else(|| PermissionErrorKind::NotFound(key.clone()).into())
    }
}
