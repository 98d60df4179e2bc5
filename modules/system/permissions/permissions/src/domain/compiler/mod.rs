//! Rule compilation.
//!
//! One algorithm per permission kind, selected by an exhaustive match over
//! [`PermissionRule`]. Each produces a [`CompiledPermission`] and the
//! dependency edges it incurred:
//!
//! | Kind | Columns | Predicates | Presets | Flags |
//! |------|---------|------------|---------|-------|
//! | insert | insertable (default all) | `check` | yes | `backend_only` |
//! | select | allowed + computed fields | `filter` | no | `limit`, `allow_aggregations` |
//! | update | updatable, no relationships | `filter`, `check` | yes | `backend_only` |
//! | delete | - | `filter` | no | `backend_only` |
//!
//! Errors are reported relative to the rule document and nested under
//! `permission` here.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::compile_delete;
pub use insert::compile_insert;
pub use select::compile_select;
pub use update::compile_update;

use permissions_sdk::{
    CompiledPermission, CompiledPredicate, DependencyEdge, Document, FieldCatalog,
    PermissionError, PermissionRule, PredicateCompiler, ResourceName,
};

/// A compiled permission with its dependency edges.
#[derive(Debug, Clone)]
pub struct CompilationOutput {
    pub permission: CompiledPermission,
    pub dependencies: Vec<DependencyEdge>,
}

/// Compile `rule` for `resource` against a catalog snapshot.
///
/// # Errors
///
/// Any schema, validation or predicate compiler error, with its breadcrumb
/// nested under `permission`.
pub fn compile_rule(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    rule: &PermissionRule,
) -> Result<CompilationOutput, PermissionError> {
    let (permission, dependencies) = compile_by_kind(compiler, resource, catalog, rule)
        .map_err(|e| e.within("permission"))?;

    tracing::debug!(
        resource = %resource,
        kind = %rule.kind(),
        dependencies = dependencies.len(),
        "compiled permission rule"
    );

    Ok(CompilationOutput {
        permission,
        dependencies,
    })
}

fn compile_by_kind(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    rule: &PermissionRule,
) -> Result<(CompiledPermission, Vec<DependencyEdge>), PermissionError> {
    Ok(match rule {
        PermissionRule::Insert(r) => {
            let (p, deps) = compile_insert(compiler, resource, catalog, r)?;
            (CompiledPermission::Insert(p), deps)
        }
        PermissionRule::Select(r) => {
            let (p, deps) = compile_select(compiler, resource, catalog, r)?;
            (CompiledPermission::Select(p), deps)
        }
        PermissionRule::Update(r) => {
            let (p, deps) = compile_update(compiler, resource, catalog, r)?;
            (CompiledPermission::Update(p), deps)
        }
        PermissionRule::Delete(r) => {
            let (p, deps) = compile_delete(compiler, resource, catalog, r)?;
            (CompiledPermission::Delete(p), deps)
        }
    })
}

/// Compile the predicate stored under `field` of the rule document.
fn compile_predicate_at(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    predicate: &Document,
    field: &str,
) -> Result<CompiledPredicate, PermissionError> {
    compiler
        .compile_predicate(resource, catalog, predicate)
        .map_err(|e| PermissionError::from(e).within(field))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests;
