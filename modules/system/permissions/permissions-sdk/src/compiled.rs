//! Compiled permission artifacts.
//!
//! These are consumed by the query-time enforcement path, which trusts the
//! validated columns, filters and presets without re-checking the catalog.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::ColumnType;
use crate::dependency::DependencyEdge;
use crate::models::{FieldName, ResourceName, SessionVariable};

/// Executable boolean filter produced by the predicate compiler.
///
/// Opaque to this crate; the enforcement path knows how to interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompiledFilter(serde_json::Value);

impl CompiledFilter {
    #[must_use]
    pub fn new(expr: serde_json::Value) -> Self {
        Self(expr)
    }

    /// The filter that admits every row.
    #[must_use]
    pub fn always_true() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }

    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Output of compiling one predicate document.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub filter: CompiledFilter,
    pub dependencies: Vec<DependencyEdge>,
    pub session_variables: BTreeSet<SessionVariable>,
}

/// Typed preset value produced by the value compiler.
///
/// Which variant a document becomes is decided by the value compiler alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompiledValue {
    /// A compile-time literal.
    Static {
        column_type: ColumnType,
        value: serde_json::Value,
    },
    /// A value read from the request session.
    SessionVariable {
        column_type: ColumnType,
        variable: SessionVariable,
    },
}

impl CompiledValue {
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static { .. })
    }
}

/// Column → compiled preset value.
pub type PresetAssignments = BTreeMap<FieldName, CompiledValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledInsert {
    /// Insertable columns minus preset columns, in catalog order.
    pub insertable_without_preset: Vec<FieldName>,
    pub check: CompiledFilter,
    pub presets: PresetAssignments,
    pub backend_only: bool,
    pub required_headers: BTreeSet<SessionVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledSelect {
    pub allowed_columns: Vec<FieldName>,
    pub allowed_computed_fields: Vec<FieldName>,
    pub filter: CompiledFilter,
    pub limit: Option<i64>,
    pub allow_aggregations: bool,
    pub required_headers: BTreeSet<SessionVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledUpdate {
    /// Updatable columns minus preset columns, in catalog order.
    pub updatable_without_preset: Vec<FieldName>,
    pub resource: ResourceName,
    /// Pre-update condition.
    pub filter: CompiledFilter,
    /// Post-update condition; `None` means always true.
    pub check: Option<CompiledFilter>,
    pub presets: PresetAssignments,
    pub backend_only: bool,
    pub required_headers: BTreeSet<SessionVariable>,
}

impl CompiledUpdate {
    /// Post-update condition, with an absent check read as always true.
    #[must_use]
    pub fn effective_check(&self) -> CompiledFilter {
        self.check.clone().unwrap_or_else(CompiledFilter::always_true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledDelete {
    pub resource: ResourceName,
    pub filter: CompiledFilter,
    pub backend_only: bool,
    pub required_headers: BTreeSet<SessionVariable>,
}

/// Compiled artifact of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompiledPermission {
    Insert(CompiledInsert),
    Select(CompiledSelect),
    Update(CompiledUpdate),
    Delete(CompiledDelete),
}

impl CompiledPermission {
    #[must_use]
    pub fn as_insert(&self) -> Option<&CompiledInsert> {
        match self {
            Self::Insert(p) => Some(p),
            Self::Select(_) | Self::Update(_) | Self::Delete(_) => None,
        }
    }

    #[must_use]
    pub fn as_select(&self) -> Option<&CompiledSelect> {
        match self {
            Self::Select(p) => Some(p),
            Self::Insert(_) | Self::Update(_) | Self::Delete(_) => None,
        }
    }

    #[must_use]
    pub fn as_update(&self) -> Option<&CompiledUpdate> {
        match self {
            Self::Update(p) => Some(p),
            Self::Insert(_) | Self::Select(_) | Self::Delete(_) => None,
        }
    }

    #[must_use]
    pub fn as_delete(&self) -> Option<&CompiledDelete> {
        match self {
            Self::Delete(p) => Some(p),
            Self::Insert(_) | Self::Select(_) | Self::Update(_) => None,
        }
    }

    /// Whether the permission is restricted to backend requests. Reads are never.
    #[must_use]
    pub fn backend_only(&self) -> bool {
        match self {
            Self::Insert(p) => p.backend_only,
            Self::Update(p) => p.backend_only,
            Self::Delete(p) => p.backend_only,
            Self::Select(_) => false,
        }
    }

    #[must_use]
    pub fn required_headers(&self) -> &BTreeSet<SessionVariable> {
        match self {
            Self::Insert(p) => &p.required_headers,
            Self::Select(p) => &p.required_headers,
            Self::Update(p) => &p.required_headers,
            Self::Delete(p) => &p.required_headers,
        }
    }
}
