//! Authored permission rules.
//!
//! Predicate and preset value documents share one generic document type,
//! [`Document`] (null/bool/number/string/list/ordered map).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{FieldName, PermissionKind, RoleName};

/// Generic tagged document used for predicates and preset values.
pub type Document = serde_json::Value;

/// Column → value document presets.
pub type PresetDocument = BTreeMap<FieldName, Document>;

/// Which columns a rule grants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnSpec {
    /// Every column of the resource (`"*"`).
    #[default]
    All,
    /// An explicit list, kept in the authored order.
    Explicit(Vec<FieldName>),
}

impl Serialize for ColumnSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("*"),
            Self::Explicit(columns) => columns.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ColumnSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Star(String),
            List(Vec<FieldName>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Star(s) if s == "*" => Ok(Self::All),
            Repr::Star(other) => Err(serde::de::Error::custom(format!(
                "expected \"*\" or a list of columns, got \"{other}\""
            ))),
            Repr::List(columns) => Ok(Self::Explicit(columns)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertRule {
    pub check: Document,
    #[serde(default, alias = "set", skip_serializing_if = "Option::is_none")]
    pub preset: Option<PresetDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectRule {
    pub columns: ColumnSpec,
    pub filter: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default)]
    pub allow_aggregations: bool,
    #[serde(default)]
    pub computed_fields: Vec<FieldName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRule {
    pub columns: ColumnSpec,
    #[serde(default, alias = "set", skip_serializing_if = "Option::is_none")]
    pub preset: Option<PresetDocument>,
    pub filter: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteRule {
    pub filter: Document,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_only: Option<bool>,
}

/// A rule of one of the four kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionRule {
    Insert(InsertRule),
    Select(SelectRule),
    Update(UpdateRule),
    Delete(DeleteRule),
}

impl PermissionRule {
    #[must_use]
    pub fn kind(&self) -> PermissionKind {
        match self {
            Self::Insert(_) => PermissionKind::Insert,
            Self::Select(_) => PermissionKind::Select,
            Self::Update(_) => PermissionKind::Update,
            Self::Delete(_) => PermissionKind::Delete,
        }
    }

    /// The rule as a raw document, the form kept in storage.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if the rule cannot be represented as JSON.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match self {
            Self::Insert(r) => serde_json::to_value(r),
            Self::Select(r) => serde_json::to_value(r),
            Self::Update(r) => serde_json::to_value(r),
            Self::Delete(r) => serde_json::to_value(r),
        }
    }

    /// Parse a raw rule document of the given kind.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if the document does not match the rule shape.
    pub fn from_document(kind: PermissionKind, doc: Document) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            PermissionKind::Insert => Self::Insert(serde_json::from_value(doc)?),
            PermissionKind::Select => Self::Select(serde_json::from_value(doc)?),
            PermissionKind::Update => Self::Update(serde_json::from_value(doc)?),
            PermissionKind::Delete => Self::Delete(serde_json::from_value(doc)?),
        })
    }
}

/// Authored permission: role, rule and optional comment.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionDefinition {
    pub role: RoleName,
    pub rule: PermissionRule,
    pub comment: Option<String>,
}

impl PermissionDefinition {
    #[must_use]
    pub fn new(role: RoleName, rule: PermissionRule) -> Self {
        Self {
            role,
            rule,
            comment: None,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> PermissionKind {
        self.rule.kind()
    }
}
