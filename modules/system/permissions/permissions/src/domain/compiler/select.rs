use permissions_sdk::{
    CompiledSelect, ComputedFieldReturn, DependencyEdge, DependencyReason, DependencySet,
    FieldCatalog, FieldKind, FieldName, PermissionError, PermissionErrorKind, PredicateCompiler,
    ResourceName, SelectRule,
};

use super::compile_predicate_at;
use crate::domain::columns::resolve_columns;

/// Compile a select rule.
///
/// # Errors
///
/// Errors under `columns`, `filter`, `computed_fields` or `limit`.
pub fn compile_select(
    compiler: &dyn PredicateCompiler,
    resource: &ResourceName,
    catalog: &FieldCatalog,
    rule: &SelectRule,
) -> Result<(CompiledSelect, Vec<DependencyEdge>), PermissionError> {
    let allowed_columns =
        resolve_columns(&rule.columns, resource, catalog).map_err(|e| e.within("columns"))?;

    let filter = compile_predicate_at(compiler, resource, catalog, &rule.filter, "filter")?;

    let allowed_computed_fields = rule
        .computed_fields
        .iter()
        .map(|name| check_computed_field(name, resource, catalog))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.within("computed_fields"))?;

    if let Some(limit) = rule.limit
        && limit <= 0
    {
        return Err(
            PermissionError::from(PermissionErrorKind::NonPositiveLimit { limit }).within("limit"),
        );
    }

    let mut deps = DependencySet::for_resource(resource);
    deps.extend(filter.dependencies);
    deps.extend(
        allowed_columns
            .iter()
            .map(|c| DependencyEdge::on_column(resource, c, DependencyReason::Untyped)),
    );
    deps.extend(
        allowed_computed_fields
            .iter()
            .map(|f| DependencyEdge::on_computed_field(resource, f, DependencyReason::Untyped)),
    );

    let compiled = CompiledSelect {
        allowed_columns,
        allowed_computed_fields,
        filter: filter.filter,
        limit: rule.limit,
        allow_aggregations: rule.allow_aggregations,
        required_headers: filter.session_variables,
    };

    Ok((compiled, deps.into_vec()))
}

/// Accept `name` only if it is a scalar computed field.
fn check_computed_field(
    name: &str,
    resource: &ResourceName,
    catalog: &FieldCatalog,
) -> Result<FieldName, PermissionError> {
    match catalog.field(name).map(|f| &f.kind) {
        Some(FieldKind::ComputedField {
            returns: ComputedFieldReturn::Scalar(_),
        }) => Ok(name.to_owned()),
        Some(FieldKind::ComputedField {
            returns: ComputedFieldReturn::SetOfResource(target),
        }) => Err(PermissionErrorKind::InvalidComputedFieldKind {
            field: name.to_owned(),
            target: target.clone(),
        }
        .into()),
        Some(FieldKind::Column { .. } | FieldKind::Relationship { .. }) | None => {
            Err(PermissionErrorKind::UnknownComputedField {
                field: name.to_owned(),
                resource: resource.clone(),
            }
            .into())
        }
    }
}
