//! Column specification resolution.

use std::collections::BTreeMap;

use permissions_sdk::{
    ColumnSpec, FieldCatalog, FieldKind, FieldName, PermissionError, PermissionErrorKind,
    ResourceName,
};

/// Resolve `spec` to a concrete column list.
///
/// `All` expands to every column in catalog order. An explicit list is
/// returned unchanged once every entry is checked to be a column.
///
/// # Errors
///
/// - `UnknownColumn` when a name is absent from the catalog
/// - `RelationshipUsedAsColumn` / `ComputedFieldUsedAsColumn` when a name is
///   another kind of field
pub fn resolve_columns(
    spec: &ColumnSpec,
    resource: &ResourceName,
    catalog: &FieldCatalog,
) -> Result<Vec<FieldName>, PermissionError> {
    match spec {
        ColumnSpec::All => Ok(catalog.columns().map(ToOwned::to_owned).collect()),
        ColumnSpec::Explicit(names) => {
            for name in names {
                ensure_column(name, resource, catalog)?;
            }
            Ok(names.clone())
        }
    }
}

/// Check that `name` is a column of `resource`.
///
/// # Errors
///
/// Same as [`resolve_columns`].
pub fn ensure_column(
    name: &str,
    resource: &ResourceName,
    catalog: &FieldCatalog,
) -> Result<(), PermissionError> {
    let kind = match catalog.field(name).map(|f| &f.kind) {
        Some(FieldKind::Column { .. }) => return Ok(()),
        Some(FieldKind::Relationship { .. }) => PermissionErrorKind::RelationshipUsedAsColumn {
            name: name.to_owned(),
            resource: resource.clone(),
        },
        Some(FieldKind::ComputedField { .. }) => PermissionErrorKind::ComputedFieldUsedAsColumn {
            name: name.to_owned(),
            resource: resource.clone(),
        },
        None => PermissionErrorKind::UnknownColumn {
            column: name.to_owned(),
            resource: resource.clone(),
        },
    };
    Err(kind.into())
}

/// `columns` minus the keys of `presets`, order preserved.
pub(crate) fn without_presets<V>(
    columns: &[FieldName],
    presets: &BTreeMap<FieldName, V>,
) -> Vec<FieldName> {
    columns
        .iter()
        .filter(|c| !presets.contains_key(*c))
        .cloned()
        .collect()
}
