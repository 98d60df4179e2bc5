use permissions_sdk::{
    ColumnSpec, CompiledUpdate, DependencyEdge, DependencyReason, DependencySet, FieldCatalog,
    FieldKind, PermissionError, PermissionErrorKind, PredicateCompiler, ResourceName, UpdateRule,
};

use super::compile_predicate_at;
use crate::domain::columns::{resolve_columns, without_presets};
use crate::domain::presets::resolve_optional_presets;

/// Compile an update rule.
///
/// # Errors
///
/// Errors under `columns`, `filter`, `check` or `preset.<column>`.
pub fn compile_update(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    rule: &UpdateRule,
) -> Result<(CompiledUpdate, Vec<DependencyEdge>), PermissionError> {
    reject_relationships(&rule.columns, catalog).map_err(|e| e.within("columns"))?;
    let allowed_columns =
        resolve_columns(&rule.columns, resource, catalog).map_err(|e| e.within("columns"))?;

    let filter = compile_predicate_at(compiler, resource, catalog, &rule.filter, "filter")?;

    let check = rule
        .check
        .as_ref()
        .map(|c| compile_predicate_at(compiler, resource, catalog, c, "check"))
        .transpose()?;

    let presets = resolve_optional_presets(compiler, resource, catalog, rule.preset.as_ref())
        .map_err(|e| e.within("preset"))?;

    let updatable_without_preset = without_presets(&allowed_columns, &presets.assignments);

    let mut required_headers = filter.session_variables;
    required_headers.extend(presets.required_headers);

    let mut deps = DependencySet::for_resource(resource);
    deps.extend(filter.dependencies);
    let check_filter = check.map(|c| {
        deps.extend(c.dependencies);
        c.filter
    });
    deps.extend(presets.dependencies);
    deps.extend(
        allowed_columns
            .iter()
            .map(|c| DependencyEdge::on_column(resource, c, DependencyReason::Untyped)),
    );

    let compiled = CompiledUpdate {
        updatable_without_preset,
        resource: resource.clone(),
        filter: filter.filter,
        check: check_filter,
        presets: presets.assignments,
        backend_only: rule.backend_only == Some(true),
        required_headers,
    };

    Ok((compiled, deps.into_vec()))
}

fn reject_relationships(spec: &ColumnSpec, catalog: &FieldCatalog) -> Result<(), PermissionError> {
    let ColumnSpec::Explicit(names) = spec else {
        return Ok(());
    };
    for name in names {
        if let Some(FieldKind::Relationship { .. }) = catalog.field(name).map(|f| &f.kind) {
            return Err(PermissionErrorKind::RelationshipNotAllowed { name: name.clone() }.into());
        }
    }
    Ok(())
}
