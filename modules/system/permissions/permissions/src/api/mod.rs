//! Declarative command surface.
//!
//! Commands arrive as JSON documents:
//!
//! ```json
//! {"type": "create_select_permission",
//!  "args": {"table": "articles", "role": "editor", "permission": {"columns": "*", "filter": {}}}}
//! ```
//!
//! and answer `{"message": "success"}` or a [`CommandError`].

pub mod commands;
pub mod error;

pub use commands::{
    Acknowledgement, CatalogSource, CreatePermissionArgs, DropPermissionArgs, PermissionCommand,
    PermissionCommands, SetCommentArgs,
};
pub use error::CommandError;
