use permissions_sdk::{
    CompiledDelete, DeleteRule, DependencyEdge, DependencySet, FieldCatalog, PermissionError,
    PredicateCompiler, ResourceName,
};

use super::compile_predicate_at;

/// Compile a delete rule.
///
/// # Errors
///
/// Errors under `filter`.
pub fn compile_delete(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    rule: &DeleteRule,
) -> Result<(CompiledDelete, Vec<DependencyEdge>), PermissionError> {
    let filter = compile_predicate_at(compiler, resource, catalog, &rule.filter, "filter")?;

    let mut deps = DependencySet::for_resource(resource);
    deps.extend(filter.dependencies);

    let compiled = CompiledDelete {
        resource: resource.clone(),
        filter: filter.filter,
        backend_only: rule.backend_only == Some(true),
        required_headers: filter.session_variables,
    };

    Ok((compiled, deps.into_vec()))
}
