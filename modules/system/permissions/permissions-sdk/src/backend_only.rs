//! Visibility of backend-only write operations.
//!
//! ## Decision matrix
//!
//! | `backend_only` | secret | `use_backend_only_header` | Result |
//! |----------------|--------|---------------------------|--------|
//! | false          | any    | any                       | Visible |
//! | true           | configured, mismatch | any         | Hidden |
//! | true           | not configured / provided | true   | Visible |
//! | true           | not configured / provided | false  | Hidden |

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// State of the admin secret for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStatus {
    /// No secret is configured on the server.
    NotConfigured,
    /// A secret is configured and the request presented it.
    Provided,
    /// A secret is configured and the request did not present it correctly.
    Mismatch,
}

impl SecretStatus {
    /// Build from the two flags "configured" and "correctly provided".
    #[must_use]
    pub fn from_flags(configured: bool, correctly_provided: bool) -> Self {
        match (configured, correctly_provided) {
            (false, _) => Self::NotConfigured,
            (true, true) => Self::Provided,
            (true, false) => Self::Mismatch,
        }
    }
}

/// Decide whether a write operation is visible to a request.
#[must_use]
pub fn decide(
    backend_only: bool,
    secret: SecretStatus,
    use_backend_only_header: bool,
) -> Visibility {
    if !backend_only {
        return Visibility::Visible;
    }
    match secret {
        SecretStatus::Mismatch => Visibility::Hidden,
        SecretStatus::NotConfigured | SecretStatus::Provided => {
            if use_backend_only_header {
                Visibility::Visible
            } else {
                Visibility::Hidden
            }
        }
    }
}
