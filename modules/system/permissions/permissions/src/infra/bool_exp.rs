//! In-process predicate compiler for column comparison documents.
//!
//! Understands documents of the form
//!
//! ```json
//! {"_and": [{"owner_id": {"_eq": "X-User-Id"}}, {"published": {"_eq": true}}]}
//! ```
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `_and`, `_or` | list of nested predicates |
//! | `_not` | nested predicate |
//! | column / scalar computed field | map of operators (`_eq`, `_neq`, `_gt`, `_lt`, `_gte`, `_lte`, `_in`, `_nin`, `_is_null`) |
//!
//! String operands starting with [`SESSION_VARIABLE_PREFIX`] (case-insensitive)
//! read session variables. Relationship traversal is not supported: it needs
//! the target resource's catalog, which a single-resource snapshot lacks.

use std::collections::BTreeSet;

use permissions_sdk::{
    ColumnType, CompiledFilter, CompiledPredicate, CompiledValue, ComputedFieldReturn,
    DependencyEdge, DependencyReason, Document, FieldCatalog, FieldKind, PredicateCompileError,
    PredicateCompiler, ResourceName, SessionVariable,
};
use serde_json::{Value, json};

/// Prefix marking a string operand as a session variable reference.
pub const SESSION_VARIABLE_PREFIX: &str = "x-";

const COMPARISON_OPERATORS: &[(&str, &str)] = &[
    ("_eq", "eq"),
    ("_neq", "neq"),
    ("_gt", "gt"),
    ("_lt", "lt"),
    ("_gte", "gte"),
    ("_lte", "lte"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolExpCompiler;

impl BoolExpCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Accumulates what a predicate references while it is compiled.
struct Scope<'a> {
    resource: &'a ResourceName,
    catalog: &'a FieldCatalog,
    dependencies: Vec<DependencyEdge>,
    session_variables: BTreeSet<SessionVariable>,
}

impl Scope<'_> {
    fn compile(&mut self, doc: &Value) -> Result<Value, PredicateCompileError> {
        let Value::Object(map) = doc else {
            return Err(PredicateCompileError::new(format!(
                "expected an object, got {doc}"
            )));
        };

        let mut conjuncts = Vec::with_capacity(map.len());
        for (key, value) in map {
            let compiled = self.compile_entry(key, value).map_err(|e| e.at(key.clone()))?;
            conjuncts.push(compiled);
        }

        Ok(match conjuncts.len() {
            1 => conjuncts.remove(0),
            _ => json!({ "and": conjuncts }),
        })
    }

    fn compile_entry(&mut self, key: &str, value: &Value) -> Result<Value, PredicateCompileError> {
        match key {
            "_and" | "_or" => {
                let Value::Array(items) = value else {
                    return Err(PredicateCompileError::new(format!(
                        "\"{key}\" expects a list of predicates"
                    )));
                };
                let compiled = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.compile(item).map_err(|e| e.at(i)))
                    .collect::<Result<Vec<_>, _>>()?;
                let op = if key == "_and" { "and" } else { "or" };
                Ok(json!({ op: compiled }))
            }
            "_not" => Ok(json!({ "not": self.compile(value)? })),
            field => self.compile_field(field, value),
        }
    }

    fn compile_field(&mut self, field: &str, ops: &Value) -> Result<Value, PredicateCompileError> {
        let reason = match self.catalog.field(field).map(|f| &f.kind) {
            Some(FieldKind::Column { .. }) => DependencyReason::Column,
            Some(FieldKind::ComputedField {
                returns: ComputedFieldReturn::Scalar(_),
            }) => DependencyReason::ComputedField,
            Some(FieldKind::ComputedField {
                returns: ComputedFieldReturn::SetOfResource(_),
            }) => {
                return Err(PredicateCompileError::new(format!(
                    "computed field \"{field}\" returns a set and cannot be compared"
                )));
            }
            Some(FieldKind::Relationship { target }) => {
                return Err(PredicateCompileError::new(format!(
                    "relationship \"{field}\" to {target} cannot be traversed here"
                )));
            }
            None => {
                return Err(PredicateCompileError::new(format!(
                    "no such field \"{field}\" on {}",
                    self.resource
                )));
            }
        };

        let Value::Object(ops) = ops else {
            return Err(PredicateCompileError::new(
                "expected a map of comparison operators",
            ));
        };

        let edge = if reason == DependencyReason::ComputedField {
            DependencyEdge::on_computed_field(self.resource, field, reason)
        } else {
            DependencyEdge::on_column(self.resource, field, reason)
        };
        self.dependencies.push(edge);

        let mut comparisons = Vec::with_capacity(ops.len());
        for (op, operand) in ops {
            let compiled = self
                .compile_comparison(field, op, operand)
                .map_err(|e| e.at(op.clone()))?;
            comparisons.push(compiled);
        }

        Ok(match comparisons.len() {
            1 => comparisons.remove(0),
            _ => json!({ "and": comparisons }),
        })
    }

    fn compile_comparison(
        &mut self,
        field: &str,
        op: &str,
        operand: &Value,
    ) -> Result<Value, PredicateCompileError> {
        if let Some((_, name)) = COMPARISON_OPERATORS.iter().find(|(k, _)| *k == op) {
            let value = self.operand(operand);
            return Ok(json!({ "op": name, "field": field, "value": value }));
        }
        match op {
            "_in" | "_nin" => {
                let Value::Array(items) = operand else {
                    return Err(PredicateCompileError::new(format!(
                        "\"{op}\" expects a list of values"
                    )));
                };
                let values: Vec<Value> = items.iter().map(|v| self.operand(v)).collect();
                let name = if op == "_in" { "in" } else { "nin" };
                Ok(json!({ "op": name, "field": field, "values": values }))
            }
            "_is_null" => {
                let Value::Bool(is_null) = operand else {
                    return Err(PredicateCompileError::new("\"_is_null\" expects a boolean"));
                };
                Ok(json!({ "op": "is_null", "field": field, "value": is_null }))
            }
            other => Err(PredicateCompileError::new(format!(
                "unknown operator \"{other}\""
            ))),
        }
    }

    fn operand(&mut self, operand: &Value) -> Value {
        match session_variable(operand) {
            Some(variable) => {
                let compiled = json!({ "session": variable.as_str() });
                self.session_variables.insert(variable);
                compiled
            }
            None => operand.clone(),
        }
    }
}

fn session_variable(value: &Value) -> Option<SessionVariable> {
    match value {
        Value::String(s) if s.to_lowercase().starts_with(SESSION_VARIABLE_PREFIX) => {
            Some(SessionVariable::new(s))
        }
        _ => None,
    }
}

fn literal_fits(column_type: &ColumnType, value: &Value) -> bool {
    match column_type.0.as_str() {
        "integer" | "int" | "int4" | "int8" | "bigint" | "smallint" => value.is_i64() || value.is_u64(),
        "numeric" | "float" | "float8" | "real" | "double precision" => value.is_number(),
        "boolean" | "bool" => value.is_boolean(),
        "text" | "varchar" | "uuid" | "citext" => value.is_string(),
        _ => !value.is_null(),
    }
}

impl PredicateCompiler for BoolExpCompiler {
    fn compile_predicate(
        &self,
        resource: &ResourceName,
        catalog: &FieldCatalog,
        predicate: &Document,
    ) -> Result<CompiledPredicate, PredicateCompileError> {
        if matches!(predicate, Value::Object(m) if m.is_empty()) {
            return Ok(CompiledPredicate {
                filter: CompiledFilter::always_true(),
                dependencies: Vec::new(),
                session_variables: BTreeSet::new(),
            });
        }

        let mut scope = Scope {
            resource,
            catalog,
            dependencies: Vec::new(),
            session_variables: BTreeSet::new(),
        };
        let filter = scope.compile(predicate)?;

        Ok(CompiledPredicate {
            filter: CompiledFilter::new(filter),
            dependencies: scope.dependencies,
            session_variables: scope.session_variables,
        })
    }

    fn compile_value(
        &self,
        _resource: &ResourceName,
        column: &str,
        column_type: &ColumnType,
        value: &Document,
    ) -> Result<CompiledValue, PredicateCompileError> {
        if let Some(variable) = session_variable(value) {
            return Ok(CompiledValue::SessionVariable {
                column_type: column_type.clone(),
                variable,
            });
        }
        if !literal_fits(column_type, value) {
            return Err(PredicateCompileError::new(format!(
                "value {value} does not fit column \"{column}\" of type {}",
                column_type.0
            )));
        }
        Ok(CompiledValue::Static {
            column_type: column_type.clone(),
            value: value.clone(),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn resource() -> ResourceName {
        ResourceName::public("articles")
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::new()
            .column("id", "integer")
            .column("owner_id", "text")
            .column("published", "boolean")
            .relationship("author", ResourceName::public("authors"))
    }

    #[test]
    fn empty_predicate_is_always_true() {
        let out = BoolExpCompiler
            .compile_predicate(&resource(), &catalog(), &json!({}))
            .unwrap();
        assert_eq!(out.filter, CompiledFilter::always_true());
        assert!(out.dependencies.is_empty());
    }

    #[test]
    fn session_variables_and_columns_are_collected() {
        let out = BoolExpCompiler
            .compile_predicate(
                &resource(),
                &catalog(),
                &json!({"_and": [
                    {"owner_id": {"_eq": "X-User-Id"}},
                    {"published": {"_eq": true}},
                ]}),
            )
            .unwrap();

        assert_eq!(
            out.session_variables.into_iter().collect::<Vec<_>>(),
            vec![SessionVariable::new("x-user-id")]
        );
        assert_eq!(out.dependencies.len(), 2);
        assert_eq!(
            out.filter.as_value(),
            &json!({"and": [
                {"op": "eq", "field": "owner_id", "value": {"session": "x-user-id"}},
                {"op": "eq", "field": "published", "value": true},
            ]})
        );
    }

    #[test]
    fn unknown_operator_reports_breadcrumb() {
        let err = BoolExpCompiler
            .compile_predicate(
                &resource(),
                &catalog(),
                &json!({"_or": [{"id": {"_like": 1}}]}),
            )
            .unwrap_err();
        assert_eq!(err.path.to_string(), "_or[0].id._like");
    }

    #[test]
    fn relationships_are_rejected() {
        let err = BoolExpCompiler
            .compile_predicate(&resource(), &catalog(), &json!({"author": {"id": {"_eq": 1}}}))
            .unwrap_err();
        assert_eq!(err.path.to_string(), "author");
    }

    #[test]
    fn values_are_classified() {
        let text = ColumnType::new("text");
        let compiled = BoolExpCompiler
            .compile_value(&resource(), "owner_id", &text, &json!("x-user-id"))
            .unwrap();
        assert!(!compiled.is_static());

        let compiled = BoolExpCompiler
            .compile_value(&resource(), "owner_id", &text, &json!("alice"))
            .unwrap();
        assert!(compiled.is_static());

        let int = ColumnType::new("integer");
        assert!(
            BoolExpCompiler
                .compile_value(&resource(), "id", &int, &json!("seven"))
                .is_err()
        );
    }
}
