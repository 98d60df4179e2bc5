use std::collections::BTreeSet;

use permissions_sdk::{
    ColumnSpec, ColumnType, CompiledFilter, CompiledPredicate, CompiledValue, ComputedFieldReturn,
    DeleteRule, DependencyEdge, DependencyReason, DependencyTarget, Document, ErrorCategory,
    FieldCatalog, InsertRule, PermissionErrorKind, PermissionRule, PredicateCompileError,
    PredicateCompiler, ResourceName, SelectRule, SessionVariable, UpdateRule,
};
use serde_json::json;

use super::*;
use crate::infra::BoolExpCompiler;

fn articles() -> ResourceName {
    ResourceName::public("articles")
}

fn catalog() -> FieldCatalog {
    FieldCatalog::new()
        .column("a", "integer")
        .column("b", "text")
        .column("c", "text")
        .relationship("author", ResourceName::public("authors"))
        .computed_field(
            "summary",
            ComputedFieldReturn::Scalar(ColumnType::new("text")),
        )
        .computed_field(
            "tags",
            ComputedFieldReturn::SetOfResource(ResourceName::public("tags")),
        )
}

fn compile(rule: &PermissionRule) -> Result<CompilationOutput, PermissionError> {
    compile_rule(&BoolExpCompiler, &articles(), &catalog(), rule)
}

fn select_rule(columns: ColumnSpec) -> SelectRule {
    SelectRule {
        columns,
        filter: json!({}),
        limit: None,
        allow_aggregations: false,
        computed_fields: Vec::new(),
    }
}

fn parent_edges(deps: &[DependencyEdge]) -> usize {
    deps.iter()
        .filter(|e| e.reason == DependencyReason::Parent)
        .count()
}

/// Predicate compiler that also reports the parent resource as a dependency.
struct ParentReportingCompiler;

impl PredicateCompiler for ParentReportingCompiler {
    fn compile_predicate(
        &self,
        resource: &ResourceName,
        _catalog: &FieldCatalog,
        _predicate: &Document,
    ) -> Result<CompiledPredicate, PredicateCompileError> {
        Ok(CompiledPredicate {
            filter: CompiledFilter::always_true(),
            dependencies: vec![DependencyEdge::parent(resource)],
            session_variables: BTreeSet::new(),
        })
    }

    fn compile_value(
        &self,
        _resource: &ResourceName,
        _column: &str,
        column_type: &ColumnType,
        value: &Document,
    ) -> Result<CompiledValue, PredicateCompileError> {
        Ok(CompiledValue::Static {
            column_type: column_type.clone(),
            value: value.clone(),
        })
    }
}

// === Insert ===

#[test]
fn insert_excludes_preset_columns() {
    let rule = PermissionRule::Insert(InsertRule {
        check: json!({}),
        preset: Some([("b".to_owned(), json!("draft"))].into_iter().collect()),
        columns: Some(ColumnSpec::Explicit(vec![
            "a".to_owned(),
            "b".to_owned(),
            "c".to_owned(),
        ])),
        backend_only: None,
    });

    let out = compile(&rule).unwrap();
    let insert = out.permission.as_insert().unwrap();
    assert_eq!(insert.insertable_without_preset, vec!["a", "c"]);
    assert!(insert.presets.contains_key("b"));
    assert!(!insert.backend_only);
    assert!(out.dependencies.contains(&DependencyEdge::on_column(
        &articles(),
        "b",
        DependencyReason::SchemaType
    )));
}

#[test]
fn insert_defaults_to_all_columns() {
    let rule = PermissionRule::Insert(InsertRule {
        check: json!({}),
        preset: None,
        columns: None,
        backend_only: Some(false),
    });

    let out = compile(&rule).unwrap();
    let insert = out.permission.as_insert().unwrap();
    assert_eq!(insert.insertable_without_preset, vec!["a", "b", "c"]);
    for column in ["a", "b", "c"] {
        assert!(out.dependencies.contains(&DependencyEdge::on_column(
            &articles(),
            column,
            DependencyReason::Untyped
        )));
    }
}

#[test]
fn insert_backend_only_only_when_explicitly_true() {
    for (flag, expected) in [(None, false), (Some(false), false), (Some(true), true)] {
        let rule = PermissionRule::Insert(InsertRule {
            check: json!({}),
            preset: None,
            columns: None,
            backend_only: flag,
        });
        let out = compile(&rule).unwrap();
        assert_eq!(out.permission.backend_only(), expected);
    }
}

#[test]
fn insert_collects_headers_from_check_and_presets() {
    let rule = PermissionRule::Insert(InsertRule {
        check: json!({"b": {"_eq": "X-Org-Id"}}),
        preset: Some([("c".to_owned(), json!("x-user-id"))].into_iter().collect()),
        columns: None,
        backend_only: None,
    });

    let out = compile(&rule).unwrap();
    let headers: Vec<_> = out.permission.required_headers().iter().cloned().collect();
    assert_eq!(
        headers,
        vec![SessionVariable::new("x-org-id"), SessionVariable::new("x-user-id")]
    );
    assert!(out.dependencies.iter().any(|e| matches!(
        &e.target,
        DependencyTarget::SessionVariable { variable } if variable.as_str() == "x-user-id"
    )));
}

#[test]
fn insert_preset_on_unknown_column_fails_under_preset_path() {
    let rule = PermissionRule::Insert(InsertRule {
        check: json!({}),
        preset: Some([("nope".to_owned(), json!(1))].into_iter().collect()),
        columns: None,
        backend_only: None,
    });

    let err = compile(&rule).unwrap_err();
    assert_eq!(err.path.to_string(), "permission.preset.nope");
    assert!(matches!(err.kind, PermissionErrorKind::UnknownColumn { .. }));
}

#[test]
fn insert_check_error_keeps_compiler_breadcrumb() {
    let rule = PermissionRule::Insert(InsertRule {
        check: json!({"a": {"_like": 1}}),
        preset: None,
        columns: None,
        backend_only: None,
    });

    let err = compile(&rule).unwrap_err();
    assert_eq!(err.path.to_string(), "permission.check.a._like");
    assert_eq!(err.category(), ErrorCategory::Compiler);
}

// === Select ===

#[test]
fn select_all_columns_resolve_exactly() {
    let out = compile(&PermissionRule::Select(select_rule(ColumnSpec::All))).unwrap();
    assert_eq!(out.permission.as_select().unwrap().allowed_columns, vec!["a", "b", "c"]);
}

#[test]
fn select_unknown_column_fails() {
    let rule = select_rule(ColumnSpec::Explicit(vec!["a".to_owned(), "z".to_owned()]));
    let err = compile(&PermissionRule::Select(rule)).unwrap_err();
    assert_eq!(err.path.to_string(), "permission.columns");
    assert_eq!(
        err.kind,
        PermissionErrorKind::UnknownColumn {
            column: "z".to_owned(),
            resource: articles(),
        }
    );
}

#[test]
fn select_rejects_set_returning_computed_field() {
    let mut rule = select_rule(ColumnSpec::All);
    rule.computed_fields = vec!["tags".to_owned()];

    let err = compile(&PermissionRule::Select(rule)).unwrap_err();
    assert_eq!(err.path.to_string(), "permission.computed_fields");
    assert_eq!(
        err.kind,
        PermissionErrorKind::InvalidComputedFieldKind {
            field: "tags".to_owned(),
            target: ResourceName::public("tags"),
        }
    );
    assert!(err.to_string().contains("auto-derived"));
}

#[test]
fn select_accepts_scalar_computed_field() {
    let mut rule = select_rule(ColumnSpec::All);
    rule.computed_fields = vec!["summary".to_owned()];

    let out = compile(&PermissionRule::Select(rule)).unwrap();
    assert_eq!(
        out.permission.as_select().unwrap().allowed_computed_fields,
        vec!["summary"]
    );
    assert!(out.dependencies.contains(&DependencyEdge::on_computed_field(
        &articles(),
        "summary",
        DependencyReason::Untyped
    )));
}

#[test]
fn select_unknown_computed_field_fails() {
    let mut rule = select_rule(ColumnSpec::All);
    rule.computed_fields = vec!["a".to_owned()];

    let err = compile(&PermissionRule::Select(rule)).unwrap_err();
    assert!(matches!(err.kind, PermissionErrorKind::UnknownComputedField { .. }));
}

#[test]
fn select_limit_must_be_positive() {
    for limit in [0, -3] {
        let mut rule = select_rule(ColumnSpec::All);
        rule.limit = Some(limit);
        let err = compile(&PermissionRule::Select(rule)).unwrap_err();
        assert_eq!(err.kind, PermissionErrorKind::NonPositiveLimit { limit });
        assert_eq!(err.path.to_string(), "permission.limit");
    }

    let mut rule = select_rule(ColumnSpec::All);
    rule.limit = Some(5);
    rule.allow_aggregations = true;
    let out = compile(&PermissionRule::Select(rule)).unwrap();
    let select = out.permission.as_select().unwrap();
    assert_eq!(select.limit, Some(5));
    assert!(select.allow_aggregations);
}

// === Update ===

#[test]
fn update_rejects_relationship_columns() {
    let rule = PermissionRule::Update(UpdateRule {
        columns: ColumnSpec::Explicit(vec!["a".to_owned(), "author".to_owned()]),
        preset: None,
        filter: json!({}),
        check: None,
        backend_only: None,
    });

    let err = compile(&rule).unwrap_err();
    assert_eq!(
        err.kind,
        PermissionErrorKind::RelationshipNotAllowed {
            name: "author".to_owned()
        }
    );
    assert!(err.to_string().contains("relationships can't be used in update"));
}

#[test]
fn update_without_check_means_always_true() {
    let rule = PermissionRule::Update(UpdateRule {
        columns: ColumnSpec::All,
        preset: Some([("c".to_owned(), json!("X-User-Id"))].into_iter().collect()),
        filter: json!({"a": {"_gt": 0}}),
        check: None,
        backend_only: None,
    });

    let out = compile(&rule).unwrap();
    let update = out.permission.as_update().unwrap();
    assert_eq!(update.check, None);
    assert_eq!(update.effective_check(), CompiledFilter::always_true());
    assert_eq!(update.updatable_without_preset, vec!["a", "b"]);
    assert_eq!(update.resource, articles());
    assert!(update.required_headers.contains(&SessionVariable::new("x-user-id")));
}

#[test]
fn update_check_dependencies_are_recorded() {
    let rule = PermissionRule::Update(UpdateRule {
        columns: ColumnSpec::Explicit(vec!["a".to_owned()]),
        preset: None,
        filter: json!({}),
        check: Some(json!({"b": {"_eq": "published"}})),
        backend_only: Some(true),
    });

    let out = compile(&rule).unwrap();
    assert!(out.permission.as_update().unwrap().check.is_some());
    assert!(out.permission.backend_only());
    assert!(out.dependencies.contains(&DependencyEdge::on_column(
        &articles(),
        "b",
        DependencyReason::Column
    )));
}

#[test]
fn update_check_session_variables_are_not_required_headers() {
    let rule = PermissionRule::Update(UpdateRule {
        columns: ColumnSpec::All,
        preset: None,
        filter: json!({}),
        check: Some(json!({"b": {"_eq": "X-Check-Only"}})),
        backend_only: None,
    });

    let out = compile(&rule).unwrap();
    assert!(out.permission.required_headers().is_empty());
    assert!(out.dependencies.contains(&DependencyEdge::on_column(
        &articles(),
        "b",
        DependencyReason::Column
    )));
}

#[test]
fn update_headers_come_from_filter_and_presets() {
    let rule = PermissionRule::Update(UpdateRule {
        columns: ColumnSpec::All,
        preset: Some([("c".to_owned(), json!("X-User-Id"))].into_iter().collect()),
        filter: json!({"b": {"_eq": "X-Org-Id"}}),
        check: Some(json!({"a": {"_eq": "X-Check-Only"}})),
        backend_only: None,
    });

    let out = compile(&rule).unwrap();
    let headers: Vec<_> = out.permission.required_headers().iter().cloned().collect();
    assert_eq!(
        headers,
        vec![SessionVariable::new("x-org-id"), SessionVariable::new("x-user-id")]
    );
}

// === Delete ===

#[test]
fn delete_depends_on_parent_and_filter() {
    let rule = PermissionRule::Delete(DeleteRule {
        filter: json!({"a": {"_eq": 1}}),
        backend_only: None,
    });

    let out = compile(&rule).unwrap();
    assert_eq!(out.dependencies.len(), 2);
    assert_eq!(out.permission.as_delete().unwrap().resource, articles());
    assert!(out.permission.required_headers().is_empty());
}

// === Cross-kind ===

fn one_rule_of_each_kind() -> Vec<PermissionRule> {
    vec![
        PermissionRule::Insert(InsertRule {
            check: json!({}),
            preset: None,
            columns: None,
            backend_only: None,
        }),
        PermissionRule::Select(select_rule(ColumnSpec::All)),
        PermissionRule::Update(UpdateRule {
            columns: ColumnSpec::All,
            preset: None,
            filter: json!({}),
            check: Some(json!({})),
            backend_only: None,
        }),
        PermissionRule::Delete(DeleteRule {
            filter: json!({}),
            backend_only: None,
        }),
    ]
}

#[test]
fn every_kind_has_exactly_one_parent_edge() {
    for rule in one_rule_of_each_kind() {
        let out = compile(&rule).unwrap();
        assert_eq!(parent_edges(&out.dependencies), 1, "{}", rule.kind());
        assert!(out.dependencies.iter().any(|e| e.is_parent_of(&articles())));
    }
}

#[test]
fn parent_edge_reported_by_predicate_compiler_is_not_duplicated() {
    for rule in one_rule_of_each_kind() {
        let out = compile_rule(&ParentReportingCompiler, &articles(), &catalog(), &rule).unwrap();
        assert_eq!(parent_edges(&out.dependencies), 1, "{}", rule.kind());
    }
}
