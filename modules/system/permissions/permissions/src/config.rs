//! Configuration for the permissions module.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Header a client sets to request backend-only write permissions.
pub const DEFAULT_BACKEND_ONLY_HEADER: &str = "x-use-backend-only-permissions";

/// Module configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionsConfig {
    /// Request header that opts into backend-only permissions. Matched
    /// case-insensitively.
    pub backend_only_header: String,

    /// Shared secret trusted backends present with their requests.
    /// `None` means no secret is configured.
    #[serde(deserialize_with = "deserialize_secret")]
    pub admin_secret: Option<SecretString>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            backend_only_header: DEFAULT_BACKEND_ONLY_HEADER.to_owned(),
            admin_secret: None,
        }
    }
}

fn deserialize_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}
