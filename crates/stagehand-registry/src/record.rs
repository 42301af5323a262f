//! Registration records — static metadata describing one loadable unit.
//!
//! A record names a component and carries a factory closure that builds it.
//! Factories are registered explicitly at program start and invoked only
//! during the registry's initialization pass, keeping resolution lazy
//! without string-based dynamic loading.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stagehand_core::{parse_requires, Component, RequirementSpec, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Registry categories, one list of records each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Context/data type declarations.
    ContextTypes,
    /// External data sources. Optional at initialization.
    DataSources,
    /// Model providers.
    ModelProviders,
    /// External-system connectors.
    Connectors,
    /// Privileged infrastructure nodes (router, classifier, planner, ...).
    Infrastructure,
    /// Backing services.
    Services,
    /// Ordinary work units.
    Capabilities,
    /// Prompt customizers.
    Customizers,
}

impl Category {
    /// Fixed dependency order for the initialization pass.
    pub const INIT_ORDER: [Category; 8] = [
        Category::ContextTypes,
        Category::DataSources,
        Category::ModelProviders,
        Category::Connectors,
        Category::Infrastructure,
        Category::Services,
        Category::Capabilities,
        Category::Customizers,
    ];

    /// Whether a load failure in this category degrades instead of aborting.
    pub fn is_optional(&self) -> bool {
        matches!(self, Category::DataSources)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ContextTypes => "context_types",
            Self::DataSources => "data_sources",
            Self::ModelProviders => "model_providers",
            Self::Connectors => "connectors",
            Self::Infrastructure => "infrastructure",
            Self::Services => "services",
            Self::Capabilities => "capabilities",
            Self::Customizers => "customizers",
        };
        write!(f, "{}", s)
    }
}

/// What an external-system connector talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    ControlSystem,
    Archiver,
}

/// Factory closure producing a live component instance.
pub type ComponentFactory = Arc<dyn Fn() -> Result<Arc<dyn Component>> + Send + Sync>;

/// Immutable metadata describing one loadable unit. Created at application
/// start, never mutated, owned by the registry that loaded it.
#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub factory: ComponentFactory,
    /// Always-active components are injected into every plan's candidate set.
    pub always_active: bool,
    /// Internal sub-node names, for units that decompose further.
    pub internal_sub_nodes: Vec<String>,
    pub connector_kind: Option<ConnectorKind>,
    pub provides: Vec<String>,
    pub requires: Vec<RequirementSpec>,
    /// Optional entries are skipped (with a warning) if their factory fails.
    pub optional: bool,
}

impl Registration {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Component>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
            always_active: false,
            internal_sub_nodes: Vec::new(),
            connector_kind: None,
            provides: Vec::new(),
            requires: Vec::new(),
            optional: false,
        }
    }

    pub fn always_active(mut self) -> Self {
        self.always_active = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn connector(mut self, kind: ConnectorKind) -> Self {
        self.connector_kind = Some(kind);
        self
    }

    pub fn sub_nodes(mut self, nodes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.internal_sub_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    pub fn provides(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.provides = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn requires(mut self, specs: impl IntoIterator<Item = RequirementSpec>) -> Self {
        self.requires = specs.into_iter().collect();
        self
    }

    /// Parse a `requires` list from configuration values (string or pair
    /// shorthand). Malformed entries reject at construction time.
    pub fn requires_from_config(mut self, entries: &[Value]) -> Result<Self> {
        self.requires = parse_requires(entries)?;
        Ok(self)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("always_active", &self.always_active)
            .field("internal_sub_nodes", &self.internal_sub_nodes)
            .field("connector_kind", &self.connector_kind)
            .field("provides", &self.provides)
            .field("requires", &self.requires)
            .field("optional", &self.optional)
            .finish()
    }
}

/// One complete set of registrations, grouped by category, plus the
/// exclusions an extension set may carry.
#[derive(Clone, Debug, Default)]
pub struct RegistrationSet {
    records: BTreeMap<Category, Vec<Registration>>,
    exclusions: BTreeMap<Category, Vec<String>>,
}

impl RegistrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: Category, registration: Registration) -> &mut Self {
        self.records.entry(category).or_default().push(registration);
        self
    }

    /// Exclude a name from the merged result, regardless of origin.
    pub fn exclude(&mut self, category: Category, name: impl Into<String>) -> &mut Self {
        self.exclusions.entry(category).or_default().push(name.into());
        self
    }

    pub fn records(&self, category: Category) -> &[Registration] {
        self.records.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn exclusions(&self) -> &BTreeMap<Category, Vec<String>> {
        &self.exclusions
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        BTreeMap<Category, Vec<Registration>>,
        BTreeMap<Category, Vec<String>>,
    ) {
        (self.records, self.exclusions)
    }
}
