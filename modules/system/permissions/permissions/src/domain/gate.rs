//! Request-level backend-only visibility.

use permissions_sdk::{CompiledPermission, SecretStatus, Visibility, decide};
use secrecy::{ExposeSecret, SecretString};

use crate::config::PermissionsConfig;

/// Decides per request whether a compiled write permission applies.
#[derive(Debug, Clone)]
pub struct BackendOnlyGate {
    header: String,
    admin_secret: Option<SecretString>,
}

impl BackendOnlyGate {
    #[must_use]
    pub fn new(config: &PermissionsConfig) -> Self {
        Self {
            header: config.backend_only_header.trim().to_owned(),
            admin_secret: config.admin_secret.clone(),
        }
    }

    /// Classify the secret presented with a request.
    #[must_use]
    pub fn secret_status(&self, provided: Option<&str>) -> SecretStatus {
        match &self.admin_secret {
            None => SecretStatus::NotConfigured,
            Some(expected) if provided == Some(expected.expose_secret()) => SecretStatus::Provided,
            Some(_) => SecretStatus::Mismatch,
        }
    }

    /// Whether the request opts into backend-only permissions.
    ///
    /// Header names compare case-insensitively; the value must be `true`
    /// (any case, surrounding whitespace ignored).
    #[must_use]
    pub fn use_backend_only<'a, I>(&self, headers: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        headers.into_iter().any(|(name, value)| {
            name.trim().eq_ignore_ascii_case(&self.header)
                && value.trim().eq_ignore_ascii_case("true")
        })
    }

    /// Visibility of `permission` for a request carrying `provided_secret`
    /// and `headers`.
    #[must_use]
    pub fn visibility<'a, I>(
        &self,
        permission: &CompiledPermission,
        provided_secret: Option<&str>,
        headers: I,
    ) -> Visibility
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        decide(
            permission.backend_only(),
            self.secret_status(provided_secret),
            self.use_backend_only(headers),
        )
    }
}
