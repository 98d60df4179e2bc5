use permissions_sdk::{ErrorPath, PathSegment, PermissionError, PermissionErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Structured failure returned by the command surface.
///
/// `path` is a JSON path into the submitted command, e.g.
/// `$.args.permission.check._or[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{path}: {error}")]
pub struct CommandError {
    pub path: String,
    pub code: &'static str,
    pub error: String,
}

impl CommandError {
    /// Error located under the command's `args` object.
    #[must_use]
    pub fn in_args(err: &PermissionError) -> Self {
        let mut path = err.path.clone();
        path.push_front("args");
        Self::at(&path, &err.kind)
    }

    /// Error for a command that did not parse.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::at(
            &ErrorPath::root(),
            &PermissionErrorKind::InvalidDocument(message.into()),
        )
    }

    fn at(path: &ErrorPath, kind: &PermissionErrorKind) -> Self {
        Self {
            path: json_path(path),
            code: kind.code(),
            error: kind.to_string(),
        }
    }
}

impl From<PermissionError> for CommandError {
    fn from(err: PermissionError) -> Self {
        Self::in_args(&err)
    }
}

fn json_path(path: &ErrorPath) -> String {
    let mut rendered = String::from("$");
    for segment in path.segments() {
        match segment {
            PathSegment::Field(name) => {
                rendered.push('.');
                rendered.push_str(name);
            }
            PathSegment::Index(index) => {
                rendered.push('[');
                rendered.push_str(&index.to_string());
                rendered.push(']');
            }
        }
    }
    rendered
}
