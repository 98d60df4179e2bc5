//! Field catalog of a resource.
//!
//! The catalog is a snapshot taken by the caller at compile time. Field order
//! is the catalog's own order and is preserved wherever columns are expanded.

use serde::{Deserialize, Serialize};

use crate::models::{FieldName, ResourceName};

/// Database type of a column or scalar computed field (e.g. `integer`, `text`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnType(pub String);

impl ColumnType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// What a computed field returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum ComputedFieldReturn {
    /// A single scalar value.
    Scalar(ColumnType),
    /// A set of rows of another resource.
    SetOfResource(ResourceName),
}

/// Kind of a catalog field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Column { column_type: ColumnType },
    Relationship { target: ResourceName },
    ComputedField { returns: ComputedFieldReturn },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: FieldName,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// Ordered field catalog of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    fields: Vec<FieldInfo>,
}

impl FieldCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Later definitions of the same name shadow earlier ones.
    #[must_use]
    pub fn column(mut self, name: impl Into<FieldName>, column_type: &str) -> Self {
        self.push(name.into(), FieldKind::Column {
            column_type: ColumnType::new(column_type),
        });
        self
    }

    #[must_use]
    pub fn relationship(mut self, name: impl Into<FieldName>, target: ResourceName) -> Self {
        self.push(name.into(), FieldKind::Relationship { target });
        self
    }

    #[must_use]
    pub fn computed_field(mut self, name: impl Into<FieldName>, returns: ComputedFieldReturn) -> Self {
        self.push(name.into(), FieldKind::ComputedField { returns });
        self
    }

    fn push(&mut self, name: FieldName, kind: FieldKind) {
        self.fields.retain(|f| f.name != name);
        self.fields.push(FieldInfo { name, kind });
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Type of the column `name`, or `None` when it is absent or not a column.
    #[must_use]
    pub fn column_type(&self, name: &str) -> Option<&ColumnType> {
        match self.field(name).map(|f| &f.kind) {
            Some(FieldKind::Column { column_type }) => Some(column_type),
            _ => None,
        }
    }

    /// Column names in catalog order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|f| match f.kind {
            FieldKind::Column { .. } => Some(f.name.as_str()),
            FieldKind::Relationship { .. } | FieldKind::ComputedField { .. } => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> FieldCatalog {
        FieldCatalog::new()
            .column("id", "integer")
            .relationship("author", ResourceName::public("authors"))
            .column("title", "text")
            .computed_field(
                "word_count",
                ComputedFieldReturn::Scalar(ColumnType::new("integer")),
            )
    }

    #[test]
    fn columns_keep_catalog_order_and_skip_other_fields() {
        let cat = catalog();
        assert_eq!(cat.columns().collect::<Vec<_>>(), vec!["id", "title"]);
    }

    #[test]
    fn column_type_only_for_columns() {
        let cat = catalog();
        assert_eq!(cat.column_type("title"), Some(&ColumnType::new("text")));
        assert_eq!(cat.column_type("author"), None);
        assert_eq!(cat.column_type("missing"), None);
    }

    #[test]
    fn redefining_a_field_replaces_it() {
        let cat = FieldCatalog::new().column("a", "text").column("a", "integer");
        assert_eq!(cat.fields().count(), 1);
        assert_eq!(cat.column_type("a"), Some(&ColumnType::new("integer")));
    }

    #[test]
    fn catalog_deserializes_from_field_list() {
        let cat: FieldCatalog = serde_json::from_value(json!([
            {"name": "id", "kind": "column", "column_type": "integer"},
            {"name": "tags", "kind": "computed_field",
             "returns": {"type": "set_of_resource", "of": "tags"}},
        ]))
        .unwrap();

        assert_eq!(cat.columns().collect::<Vec<_>>(), vec!["id"]);
        assert!(matches!(
            cat.field("tags").map(|f| &f.kind),
            Some(FieldKind::ComputedField {
                returns: ComputedFieldReturn::SetOfResource(_)
            })
        ));
    }
}
