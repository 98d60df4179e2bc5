use permissions_sdk::{
    ColumnSpec, CompiledInsert, DependencyEdge, DependencyReason, DependencySet, FieldCatalog,
    InsertRule, PermissionError, PredicateCompiler, ResourceName,
};

use super::compile_predicate_at;
use crate::domain::columns::{ensure_column, resolve_columns, without_presets};
use crate::domain::presets::resolve_optional_presets;

/// Compile an insert rule.
///
/// # Errors
///
/// Errors under `check`, `preset.<column>` or `columns`.
pub fn compile_insert(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    rule: &InsertRule,
) -> Result<(CompiledInsert, Vec<DependencyEdge>), PermissionError> {
    let check = compile_predicate_at(compiler, resource, catalog, &rule.check, "check")?;

    let presets = resolve_optional_presets(compiler, resource, catalog, rule.preset.as_ref())
        .map_err(|e| e.within("preset"))?;

    let spec = rule.columns.clone().unwrap_or(ColumnSpec::All);
    let insertable = resolve_columns(&spec, resource, catalog).map_err(|e| e.within("columns"))?;
    for column in &insertable {
        ensure_column(column, resource, catalog).map_err(|e| e.within("columns"))?;
    }

    let insertable_without_preset = without_presets(&insertable, &presets.assignments);

    let mut required_headers = check.session_variables;
    required_headers.extend(presets.required_headers);

    let mut deps = DependencySet::for_resource(resource);
    deps.extend(check.dependencies);
    deps.extend(presets.dependencies);
    deps.extend(
        insertable
            .iter()
            .map(|c| DependencyEdge::on_column(resource, c, DependencyReason::Untyped)),
    );

    let compiled = CompiledInsert {
        insertable_without_preset,
        check: check.filter,
        presets: presets.assignments,
        backend_only: rule.backend_only == Some(true),
        required_headers,
    };

    Ok((compiled, deps.into_vec()))
}
