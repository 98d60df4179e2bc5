//! Error types for permission compilation and lifecycle.
//!
//! Every [`PermissionError`] carries a breadcrumb [`ErrorPath`] naming the
//! sub-field that failed (e.g. `permission.filter`). Errors are meant to be
//! shown verbatim to the author of the permission definition.

use std::fmt;

use thiserror::Error;

use crate::models::{FieldName, PermissionKey, ResourceName};

/// One step of an [`ErrorPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key, e.g. a rule field or a column name.
    Field(String),
    /// Position in a list, e.g. an operand of `_or`.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Breadcrumb path into the authored document.
///
/// Renders as `permission.check._or[0].id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPath(Vec<PathSegment>);

impl ErrorPath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Prepend a segment; used as an error bubbles out of a nested field.
    pub fn push_front(&mut self, segment: impl Into<PathSegment>) {
        self.0.insert(0, segment.into());
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn display_prefix(&self) -> String {
        if self.is_root() {
            String::new()
        } else {
            format!("{self}: ")
        }
    }
}

impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for ErrorPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Coarse classification of [`PermissionErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    Validation,
    Conflict,
    Compiler,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionErrorKind {
    #[error("column \"{column}\" does not exist on {resource}")]
    UnknownColumn {
        column: FieldName,
        resource: ResourceName,
    },

    #[error("\"{name}\" is a relationship on {resource}, expected a column")]
    RelationshipUsedAsColumn {
        name: FieldName,
        resource: ResourceName,
    },

    #[error("\"{name}\" is a computed field on {resource}, expected a column")]
    ComputedFieldUsedAsColumn {
        name: FieldName,
        resource: ResourceName,
    },

    #[error("computed field \"{field}\" does not exist on {resource}")]
    UnknownComputedField {
        field: FieldName,
        resource: ResourceName,
    },

    #[error(
        "computed field \"{field}\" returns set of {target}; permissions for this field are \
         auto-derived from the permission on its returning resource and cannot be specified manually"
    )]
    InvalidComputedFieldKind {
        field: FieldName,
        target: ResourceName,
    },

    #[error("resource {resource} does not exist")]
    UnknownResource { resource: ResourceName },

    #[error("limit must be a positive integer, got {limit}")]
    NonPositiveLimit { limit: i64 },

    #[error("relationships can't be used in update: \"{name}\"")]
    RelationshipNotAllowed { name: FieldName },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("{0} already exists")]
    AlreadyExists(PermissionKey),

    #[error("{0} does not exist")]
    NotFound(PermissionKey),

    #[error("{0}")]
    Compiler(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PermissionErrorKind {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownColumn { .. }
            | Self::RelationshipUsedAsColumn { .. }
            | Self::ComputedFieldUsedAsColumn { .. }
            | Self::UnknownComputedField { .. }
            | Self::InvalidComputedFieldKind { .. }
            | Self::UnknownResource { .. } => ErrorCategory::Schema,
            Self::NonPositiveLimit { .. }
            | Self::RelationshipNotAllowed { .. }
            | Self::InvalidDocument(_) => ErrorCategory::Validation,
            Self::AlreadyExists(_) | Self::NotFound(_) => ErrorCategory::Conflict,
            Self::Compiler(_) => ErrorCategory::Compiler,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownColumn { .. } => "unknown_column",
            Self::RelationshipUsedAsColumn { .. } => "relationship_used_as_column",
            Self::ComputedFieldUsedAsColumn { .. } => "computed_field_used_as_column",
            Self::UnknownComputedField { .. } => "unknown_computed_field",
            Self::InvalidComputedFieldKind { .. } => "invalid_computed_field_kind",
            Self::UnknownResource { .. } => "unknown_resource",
            Self::NonPositiveLimit { .. } => "non_positive_limit",
            Self::RelationshipNotAllowed { .. } => "relationship_not_allowed",
            Self::InvalidDocument(_) => "invalid_document",
            Self::AlreadyExists(_) => "already_exists",
            Self::NotFound(_) => "not_found",
            Self::Compiler(_) => "predicate_compile_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// A failed permission operation with the breadcrumb of the failing field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{kind}", .path.display_prefix())]
pub struct PermissionError {
    pub path: ErrorPath,
    pub kind: PermissionErrorKind,
}

impl PermissionError {
    #[must_use]
    pub fn new(kind: PermissionErrorKind) -> Self {
        Self {
            path: ErrorPath::root(),
            kind,
        }
    }

    /// Nest this error under `segment`.
    #[must_use]
    pub fn within(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.push_front(segment);
        self
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(PermissionErrorKind::Internal(message.into()))
    }
}

impl From<PermissionErrorKind> for PermissionError {
    fn from(kind: PermissionErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Opaque failure reported by the predicate compiler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{message}", .path.display_prefix())]
pub struct PredicateCompileError {
    /// Breadcrumb inside the predicate document.
    pub path: ErrorPath,
    pub message: String,
}

impl PredicateCompileError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: ErrorPath::root(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn at(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.push_front(segment);
        self
    }
}

impl From<PredicateCompileError> for PermissionError {
    fn from(e: PredicateCompileError) -> Self {
        Self {
            path: e.path,
            kind: PermissionErrorKind::Compiler(e.message),
        }
    }
}

/// Failure of the permission store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failure of the dependency graph.
#[derive(Debug, Clone, Error)]
pub enum GraphError {
    #[error("dependency graph error: {0}")]
    Backend(String),
}

impl From<StoreError> for PermissionError {
    fn from(e: StoreError) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<GraphError> for PermissionError {
    fn from(e: GraphError) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<serde_json::Error> for PermissionError {
    fn from(e: serde_json::Error) -> Self {
        Self::internal(e.to_string())
    }
}
