//! The component registry — maps registration metadata to live instances.
//!
//! Two construction modes: standalone (one source supplies every category)
//! and extended (a base configuration merged with an extension's additions,
//! overrides, and exclusions). Resolution is lazy: factories run only during
//! the explicit `initialize()` pass, in a fixed category order.

use crate::record::{Category, Registration, RegistrationSet};
use stagehand_core::{validate_contract, Component, Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Infrastructure names a complete configuration is expected to supply.
const REQUIRED_INFRASTRUCTURE: [&str; 5] = [
    "router",
    "classifier",
    "planner",
    "error-handler",
    "task-extractor",
];

/// Always-on capabilities a complete configuration is expected to supply.
const ALWAYS_ON_CAPABILITIES: [&str; 2] = ["respond", "clarify"];

/// Registry lifecycle. `Ready` is terminal for the process lifetime;
/// `clear()` is a test-only reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryState {
    Uninitialized,
    Configured,
    Ready,
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Configured => write!(f, "configured"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

pub struct ComponentRegistry {
    state: RegistryState,
    records: BTreeMap<Category, Vec<Registration>>,
    instances: BTreeMap<Category, Vec<(String, Arc<dyn Component>)>>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("state", &self.state)
            .field(
                "records",
                &self
                    .records
                    .iter()
                    .map(|(cat, regs)| (cat, regs.len()))
                    .collect::<BTreeMap<_, _>>(),
            )
            .field(
                "instances",
                &self
                    .instances
                    .iter()
                    .map(|(cat, insts)| (cat, insts.len()))
                    .collect::<BTreeMap<_, _>>(),
            )
            .finish()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self {
            state: RegistryState::Uninitialized,
            records: BTreeMap::new(),
            instances: BTreeMap::new(),
        }
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Build from one complete registration set.
    ///
    /// Missing well-known infrastructure or always-on capabilities are a
    /// warning, not a failure: a standalone provider may supply equivalents
    /// under different names.
    pub fn build_standalone(set: RegistrationSet) -> Self {
        let (records, _exclusions) = set.into_parts();

        let infra: HashSet<&str> = records
            .get(&Category::Infrastructure)
            .map(|rs| rs.iter().map(|r| r.name.as_str()).collect())
            .unwrap_or_default();
        for required in REQUIRED_INFRASTRUCTURE {
            if !infra.contains(required) {
                warn!(name = required, "standalone set missing expected infrastructure node");
            }
        }

        let caps: HashSet<&str> = records
            .get(&Category::Capabilities)
            .map(|rs| rs.iter().map(|r| r.name.as_str()).collect())
            .unwrap_or_default();
        for required in ALWAYS_ON_CAPABILITIES {
            if !caps.contains(required) {
                warn!(name = required, "standalone set missing expected always-on capability");
            }
        }

        Self {
            state: RegistryState::Configured,
            records,
            instances: BTreeMap::new(),
        }
    }

    /// Build by merging an extension onto a base configuration.
    ///
    /// Per category: extension records whose name matches a base record
    /// replace it in place; the rest are appended. The extension's
    /// exclusions are then applied, removing matching names regardless of
    /// origin. Duplicate names remaining after that are a hard error.
    pub fn build_extended(base: RegistrationSet, extension: RegistrationSet) -> Result<Self> {
        let (base_records, _) = base.into_parts();
        let (ext_records, exclusions) = extension.into_parts();

        let mut merged: BTreeMap<Category, Vec<Registration>> = base_records;
        for (category, additions) in ext_records {
            let slot = merged.entry(category).or_default();
            for record in additions {
                match slot.iter_mut().find(|r| r.name == record.name) {
                    Some(existing) => {
                        debug!(category = %category, name = %record.name, "extension overrides base registration");
                        *existing = record;
                    }
                    None => slot.push(record),
                }
            }
        }

        for (category, names) in &exclusions {
            if let Some(slot) = merged.get_mut(category) {
                slot.retain(|r| {
                    let keep = !names.contains(&r.name);
                    if !keep {
                        debug!(category = %category, name = %r.name, "registration excluded");
                    }
                    keep
                });
            }
        }

        let registry = Self {
            state: RegistryState::Configured,
            records: merged,
            instances: BTreeMap::new(),
        };
        match registry.validate().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(registry),
        }
    }

    /// Scan for configuration errors (duplicate names per category) without
    /// importing or instantiating anything.
    pub fn validate(&self) -> Vec<Error> {
        let mut issues = Vec::new();
        for (category, records) in &self.records {
            let mut seen: HashSet<&str> = HashSet::new();
            for record in records {
                if !seen.insert(record.name.as_str()) {
                    issues.push(Error::duplicate_registration(
                        category.to_string(),
                        record.name.clone(),
                    ));
                }
            }
        }
        issues
    }

    /// Resolve every category in dependency order, instantiating each record
    /// through its factory and running the one-time contract self-check.
    ///
    /// A failure in a required entry aborts the pass with an error naming
    /// the category, key, and cause. Optional entries (the data-sources
    /// category, and records flagged optional) are logged and skipped,
    /// leaving the system degraded but running. Idempotent: a second call
    /// on a ready registry is a no-op.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            RegistryState::Ready => {
                debug!("registry already initialized");
                return Ok(());
            }
            RegistryState::Uninitialized => {
                return Err(Error::BadRegistryState {
                    state: self.state.to_string(),
                    expected: RegistryState::Configured.to_string(),
                });
            }
            RegistryState::Configured => {}
        }

        if let Some(err) = self.validate().into_iter().next() {
            return Err(err);
        }

        for category in Category::INIT_ORDER {
            let Some(records) = self.records.get(&category) else {
                continue;
            };
            let mut loaded: Vec<(String, Arc<dyn Component>)> = Vec::new();
            for record in records {
                let skippable = category.is_optional() || record.optional;
                let instance = match (record.factory)() {
                    Ok(instance) => instance,
                    Err(e) if skippable => {
                        warn!(category = %category, name = %record.name, error = %e,
                              "optional registration failed to load, skipping");
                        continue;
                    }
                    Err(e) => {
                        return Err(Error::init_failed(
                            category.to_string(),
                            record.name.clone(),
                            e.to_string(),
                        ));
                    }
                };
                if let Err(e) = validate_contract(instance.as_ref()) {
                    if skippable {
                        warn!(category = %category, name = %record.name, error = %e,
                              "optional registration failed contract check, skipping");
                        continue;
                    }
                    return Err(Error::init_failed(
                        category.to_string(),
                        record.name.clone(),
                        e.to_string(),
                    ));
                }
                if instance.name() != record.name {
                    warn!(category = %category, registered = %record.name, actual = %instance.name(),
                          "instance name differs from registration key");
                }
                loaded.push((record.name.clone(), instance));
            }
            debug!(category = %category, count = loaded.len(), "category resolved");
            self.instances.insert(category, loaded);
        }

        self.state = RegistryState::Ready;
        info!(
            components = self.instances.values().map(Vec::len).sum::<usize>(),
            "registry ready"
        );
        Ok(())
    }

    /// Resolve one named instance. Only meaningful on a ready registry.
    pub fn resolve(&self, category: Category, name: &str) -> Option<Arc<dyn Component>> {
        self.instances
            .get(&category)?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, instance)| instance.clone())
    }

    /// All instances of a category, in registration order.
    pub fn resolve_all(&self, category: Category) -> Vec<Arc<dyn Component>> {
        self.instances
            .get(&category)
            .map(|entries| entries.iter().map(|(_, i)| i.clone()).collect())
            .unwrap_or_default()
    }

    /// Registered names of a category, in registration order.
    pub fn names(&self, category: Category) -> Vec<&str> {
        self.records
            .get(&category)
            .map(|rs| rs.iter().map(|r| r.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Test-only reset back to `Uninitialized`, dropping records and
    /// instances.
    pub fn clear(&mut self) {
        self.records.clear();
        self.instances.clear();
        self.state = RegistryState::Uninitialized;
    }
}
