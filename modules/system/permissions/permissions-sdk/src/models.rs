//! Identity types for permissions.
//!
//! A persisted permission is identified by the triple
//! ([`ResourceName`], [`RoleName`], [`PermissionKind`]), bundled as
//! [`PermissionKey`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Schema used when a resource is referenced by bare name.
pub const DEFAULT_SCHEMA: &str = "public";

/// Name of a column, relationship or computed field inside a resource.
pub type FieldName = String;

/// Qualified name of a table-like resource (`schema.name`).
///
/// Accepts either a bare string (resolved in [`DEFAULT_SCHEMA`]) or an
/// object `{"schema": "...", "name": "..."}` when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceName {
    pub schema: String,
    pub name: String,
}

impl ResourceName {
    #[must_use]
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// A resource in [`DEFAULT_SCHEMA`].
    #[must_use]
    pub fn public(name: impl Into<String>) -> Self {
        Self::new(DEFAULT_SCHEMA, name)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

impl<'de> Deserialize<'de> for ResourceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(String),
            Qualified { schema: String, name: String },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Bare(name) => Self::public(name),
            Repr::Qualified { schema, name } => Self::new(schema, name),
        })
    }
}

/// Access-control principal a permission is granted to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    /// Create a role name.
    ///
    /// # Errors
    ///
    /// Returns an error message when the name is empty or only whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("role name must not be empty".to_owned());
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RoleName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Request-scoped named value usable in predicates and presets.
///
/// Names are case-insensitive and stored lowercased, so `X-User-Id` and
/// `x-user-id` denote the same variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionVariable(String);

impl SessionVariable {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionVariable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

/// The closed set of permission kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    Insert,
    Select,
    Update,
    Delete,
}

impl PermissionKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Insert, Self::Select, Self::Update, Self::Delete];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Select => "select",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a persisted permission.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionKey {
    pub resource: ResourceName,
    pub role: RoleName,
    pub kind: PermissionKind,
}

impl PermissionKey {
    #[must_use]
    pub fn new(resource: ResourceName, role: RoleName, kind: PermissionKind) -> Self {
        Self {
            resource,
            role,
            kind,
        }
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} permission for role '{}' on {}", self.kind, self.role, self.resource)
    }
}
