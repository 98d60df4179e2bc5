//! Schema dependency edges produced by compilation.
//!
//! Edges are handed to the external dependency graph, which uses them to
//! invalidate compiled permissions when the schema changes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{FieldName, ResourceName, SessionVariable};

/// Why a permission depends on a schema element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyReason {
    /// The resource the permission is defined on.
    Parent,
    Column,
    ComputedField,
    /// The type of a column holding a static preset.
    SchemaType,
    SessionVariable,
    Untyped,
}

/// The schema element depended upon.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DependencyTarget {
    Resource { resource: ResourceName },
    Column { resource: ResourceName, column: FieldName },
    ComputedField { resource: ResourceName, field: FieldName },
    SessionVariable { variable: SessionVariable },
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: ResourceName,
    pub reason: DependencyReason,
    pub target: DependencyTarget,
}

impl DependencyEdge {
    /// Dependency of a permission on its own resource.
    #[must_use]
    pub fn parent(resource: &ResourceName) -> Self {
        Self {
            source: resource.clone(),
            reason: DependencyReason::Parent,
            target: DependencyTarget::Resource {
                resource: resource.clone(),
            },
        }
    }

    #[must_use]
    pub fn on_column(resource: &ResourceName, column: &str, reason: DependencyReason) -> Self {
        Self {
            source: resource.clone(),
            reason,
            target: DependencyTarget::Column {
                resource: resource.clone(),
                column: column.to_owned(),
            },
        }
    }

    #[must_use]
    pub fn on_computed_field(
        resource: &ResourceName,
        field: &str,
        reason: DependencyReason,
    ) -> Self {
        Self {
            source: resource.clone(),
            reason,
            target: DependencyTarget::ComputedField {
                resource: resource.clone(),
                field: field.to_owned(),
            },
        }
    }

    #[must_use]
    pub fn on_session_variable(resource: &ResourceName, variable: SessionVariable) -> Self {
        Self {
            source: resource.clone(),
            reason: DependencyReason::SessionVariable,
            target: DependencyTarget::SessionVariable { variable },
        }
    }

    #[must_use]
    pub fn is_parent_of(&self, resource: &ResourceName) -> bool {
        self.reason == DependencyReason::Parent
            && matches!(&self.target, DependencyTarget::Resource { resource: r } if r == resource)
    }
}

/// De-duplicating, deterministically ordered set of edges for one permission.
///
/// Always seeded with the parent edge, so a compiled permission carries exactly
/// one `Parent` edge on its own resource even when a predicate compiler also
/// reports one.
#[derive(Debug, Clone)]
pub struct DependencySet {
    edges: BTreeSet<DependencyEdge>,
}

impl DependencySet {
    #[must_use]
    pub fn for_resource(resource: &ResourceName) -> Self {
        let mut edges = BTreeSet::new();
        edges.insert(DependencyEdge::parent(resource));
        Self { edges }
    }

    pub fn insert(&mut self, edge: DependencyEdge) {
        self.edges.insert(edge);
    }

    pub fn extend(&mut self, edges: impl IntoIterator<Item = DependencyEdge>) {
        self.edges.extend(edges);
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<DependencyEdge> {
        self.edges.into_iter().collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn duplicate_parent_edges_collapse() {
        let r = ResourceName::public("articles");
        let mut deps = DependencySet::for_resource(&r);
        deps.insert(DependencyEdge::parent(&r));
        deps.insert(DependencyEdge::on_column(&r, "id", DependencyReason::Untyped));
        deps.insert(DependencyEdge::on_column(&r, "id", DependencyReason::Untyped));

        let edges = deps.into_vec();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges.iter().filter(|e| e.is_parent_of(&r)).count(), 1);
    }

    #[test]
    fn parent_edge_of_other_resource_is_not_own_parent() {
        let own = ResourceName::public("articles");
        let other = ResourceName::public("authors");
        assert!(!DependencyEdge::parent(&other).is_parent_of(&own));
    }
}
