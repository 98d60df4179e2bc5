//! Preset resolution for insert and update rules.

use std::collections::BTreeSet;

use permissions_sdk::{
    CompiledValue, DependencyEdge, DependencyReason, FieldCatalog, PermissionError,
    PermissionErrorKind, PredicateCompiler, PresetAssignments, PresetDocument, ResourceName,
    SessionVariable,
};

use super::columns::ensure_column;

/// Typed presets plus what they require and depend on.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPresets {
    pub assignments: PresetAssignments,
    pub required_headers: BTreeSet<SessionVariable>,
    pub dependencies: Vec<DependencyEdge>,
}

/// Compile every preset value against its column's type.
///
/// Static values add a `SchemaType` edge on the column so type drift
/// invalidates the permission; session-variable values add a
/// `SessionVariable` edge and a required header. Errors are nested under the
/// column name.
///
/// # Errors
///
/// - `UnknownColumn` (or a kind-specific error) for a preset on a non-column
/// - `Compiler` when the value compiler rejects the document
pub fn resolve_presets(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    presets: &PresetDocument,
) -> Result<ResolvedPresets, PermissionError> {
    let mut resolved = ResolvedPresets::default();

    for (column, value) in presets {
        ensure_column(column, resource, catalog).map_err(|e| e.within(column.clone()))?;
        let column_type = catalog.column_type(column).ok_or_else(|| {
            PermissionError::from(PermissionErrorKind::UnknownColumn {
                column: column.clone(),
                resource: resource.clone(),
            })
            .within(column.clone())
        })?;

        let compiled = compiler
            .compile_value(resource, column, column_type, value)
            .map_err(|e| PermissionError::from(e).within(column.clone()))?;

        match &compiled {
            CompiledValue::Static { .. } => {
                resolved.dependencies.push(DependencyEdge::on_column(
                    resource,
                    column,
                    DependencyReason::SchemaType,
                ));
            }
            CompiledValue::SessionVariable { variable, .. } => {
                resolved
                    .dependencies
                    .push(DependencyEdge::on_session_variable(resource, variable.clone()));
                resolved.required_headers.insert(variable.clone());
            }
        }

        resolved.assignments.insert(column.clone(), compiled);
    }

    Ok(resolved)
}

/// Resolve optional presets; `None` yields no assignments.
///
/// # Errors
///
/// Same as [`resolve_presets`].
pub fn resolve_optional_presets(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    presets: Option<&PresetDocument>,
) -> Result<ResolvedPresets, PermissionError> {
    presets.map_or_else(
        || Ok(ResolvedPresets::default()),
        |p| resolve_presets(compiler, resource, catalog, p),
    )
}
