#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use permissions::api::{CatalogSource, PermissionCommands};
use permissions::domain::lifecycle::PermissionLifecycle;
use permissions::infra::{BoolExpCompiler, InMemoryDependencyGraph, InMemoryPermissionStore};
use permissions_sdk::{ColumnType, ComputedFieldReturn, FieldCatalog, ResourceName};

/// Fixed catalogs keyed by resource.
#[derive(Default)]
pub struct StaticCatalogs {
    catalogs: HashMap<ResourceName, FieldCatalog>,
}

impl StaticCatalogs {
    #[must_use]
    pub fn with(mut self, resource: ResourceName, catalog: FieldCatalog) -> Self {
        self.catalogs.insert(resource, catalog);
        self
    }
}

impl CatalogSource for StaticCatalogs {
    fn catalog(&self, resource: &ResourceName) -> Option<FieldCatalog> {
        self.catalogs.get(resource).cloned()
    }
}

pub fn articles() -> ResourceName {
    ResourceName::public("articles")
}

pub fn articles_catalog() -> FieldCatalog {
    FieldCatalog::new()
        .column("id", "integer")
        .column("title", "text")
        .column("author_id", "integer")
        .column("published", "boolean")
        .relationship("author", ResourceName::public("authors"))
        .computed_field(
            "title_length",
            ComputedFieldReturn::Scalar(ColumnType::new("integer")),
        )
        .computed_field(
            "related",
            ComputedFieldReturn::SetOfResource(articles()),
        )
}

pub struct TestEnv {
    pub commands: PermissionCommands,
    pub lifecycle: Arc<PermissionLifecycle>,
    pub store: Arc<InMemoryPermissionStore>,
    pub graph: Arc<InMemoryDependencyGraph>,
}

pub fn setup() -> TestEnv {
    let store = Arc::new(InMemoryPermissionStore::new());
    let graph = Arc::new(InMemoryDependencyGraph::new());
    let lifecycle = Arc::new(PermissionLifecycle::new(
        Arc::new(BoolExpCompiler::new()),
        store.clone(),
        graph.clone(),
    ));
    let catalogs = StaticCatalogs::default().with(articles(), articles_catalog());
    let commands = PermissionCommands::new(lifecycle.clone(), Arc::new(catalogs));

    TestEnv {
        commands,
        lifecycle,
        store,
        graph,
    }
}
