use std::sync::Arc;

use permissions_sdk::{
    DeleteRule, FieldCatalog, InsertRule, PermissionDefinition, PermissionError,
    PermissionErrorKind, PermissionKind, PermissionRule, ResourceName, RoleName, SelectRule,
    UpdateRule,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::CommandError;
use crate::domain::lifecycle::PermissionLifecycle;

/// Field catalogs of the resources commands may target.
pub trait CatalogSource: Send + Sync {
    /// Current catalog of `resource`, `None` when the resource is unknown.
    fn catalog(&self, resource: &ResourceName) -> Option<FieldCatalog>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePermissionArgs<R> {
    pub table: ResourceName,
    pub role: RoleName,
    pub permission: R,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropPermissionArgs {
    pub table: ResourceName,
    pub role: RoleName,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetCommentArgs {
    pub table: ResourceName,
    pub role: RoleName,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One metadata command, tagged by `type` with its `args`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum PermissionCommand {
    CreateInsertPermission(CreatePermissionArgs<InsertRule>),
    CreateSelectPermission(CreatePermissionArgs<SelectRule>),
    CreateUpdatePermission(CreatePermissionArgs<UpdateRule>),
    CreateDeletePermission(CreatePermissionArgs<DeleteRule>),
    DropInsertPermission(DropPermissionArgs),
    DropSelectPermission(DropPermissionArgs),
    DropUpdatePermission(DropPermissionArgs),
    DropDeletePermission(DropPermissionArgs),
    SetInsertPermissionComment(SetCommentArgs),
    SetSelectPermissionComment(SetCommentArgs),
    SetUpdatePermissionComment(SetCommentArgs),
    SetDeletePermissionComment(SetCommentArgs),
}

/// Successful command reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    pub message: &'static str,
}

impl Acknowledgement {
    #[must_use]
    pub fn success() -> Self {
        Self { message: "success" }
    }
}

/// Executes [`PermissionCommand`]s against a lifecycle.
pub struct PermissionCommands {
    lifecycle: Arc<PermissionLifecycle>,
    catalogs: Arc<dyn CatalogSource>,
}

impl PermissionCommands {
    #[must_use]
    pub fn new(lifecycle: Arc<PermissionLifecycle>, catalogs: Arc<dyn CatalogSource>) -> Self {
        Self {
            lifecycle,
            catalogs,
        }
    }

    /// Parse and run a raw command document.
    ///
    /// # Errors
    ///
    /// `invalid_document` when the document does not parse, otherwise
    /// whatever [`Self::run`] reports.
    pub async fn run_document(&self, document: Value) -> Result<Acknowledgement, CommandError> {
        let command: PermissionCommand = serde_json::from_value(document).map_err(|e| {
            tracing::debug!(error = %e, "rejected malformed permission command");
            CommandError::malformed(e.to_string())
        })?;
        self.run(command).await
    }

    /// Run one command.
    ///
    /// # Errors
    ///
    /// The lifecycle error, with its path rooted at `$.args`.
    pub async fn run(&self, command: PermissionCommand) -> Result<Acknowledgement, CommandError> {
        use PermissionCommand as C;

        match command {
            C::CreateInsertPermission(a) => {
                self.create(&a.table, a.role, PermissionRule::Insert(a.permission), a.comment)
                    .await?;
            }
            C::CreateSelectPermission(a) => {
                self.create(&a.table, a.role, PermissionRule::Select(a.permission), a.comment)
                    .await?;
            }
            C::CreateUpdatePermission(a) => {
                self.create(&a.table, a.role, PermissionRule::Update(a.permission), a.comment)
                    .await?;
            }
            C::CreateDeletePermission(a) => {
                self.create(&a.table, a.role, PermissionRule::Delete(a.permission), a.comment)
                    .await?;
            }
            C::DropInsertPermission(a) => self.drop_permission(&a, PermissionKind::Insert).await?,
            C::DropSelectPermission(a) => self.drop_permission(&a, PermissionKind::Select).await?,
            C::DropUpdatePermission(a) => self.drop_permission(&a, PermissionKind::Update).await?,
            C::DropDeletePermission(a) => self.drop_permission(&a, PermissionKind::Delete).await?,
            C::SetInsertPermissionComment(a) => {
                self.set_comment(a, PermissionKind::Insert).await?;
            }
            C::SetSelectPermissionComment(a) => {
                self.set_comment(a, PermissionKind::Select).await?;
            }
            C::SetUpdatePermissionComment(a) => {
                self.set_comment(a, PermissionKind::Update).await?;
            }
            C::SetDeletePermissionComment(a) => {
                self.set_comment(a, PermissionKind::Delete).await?;
            }
        }
        Ok(Acknowledgement::success())
    }

    async fn create(
        &self,
        table: &ResourceName,
        role: RoleName,
        rule: PermissionRule,
        comment: Option<String>,
    ) -> Result<(), PermissionError> {
        let catalog = self.catalogs.catalog(table).ok_or_else(|| {
            PermissionError::from(PermissionErrorKind::UnknownResource {
                resource: table.clone(),
            })
            .within("table")
        })?;

        let mut definition = PermissionDefinition::new(role, rule);
        definition.comment = comment;

        self.lifecycle.create(table, &catalog, definition).await?;
        Ok(())
    }

    async fn drop_permission(
        &self,
        args: &DropPermissionArgs,
        kind: PermissionKind,
    ) -> Result<(), PermissionError> {
        self.lifecycle
            .drop_permission(&args.table, &args.role, kind)
            .await
    }

    async fn set_comment(
        &self,
        args: SetCommentArgs,
        kind: PermissionKind,
    ) -> Result<(), PermissionError> {
        self.lifecycle
            .set_comment(&args.table, &args.role, kind, args.comment)
            .await
    }
}
