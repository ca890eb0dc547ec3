//! Optional operation registry and run semantics.

use std::collections::HashMap;

use reflow_core::{ErrorAggregator, RequestContext, SystemFault};

use crate::report::{OperationStatus, RunReport};

/// The effect run when an optional operation fires.
///
/// An effect may append to the aggregator directly; returning an `Err` is
/// equivalent to recording one unexpected fault. Either way the fault stays
/// inside this operation's boundary.
pub trait OperationEffect: Send + Sync {
    fn run(&self, ctx: &RequestContext, errors: &mut ErrorAggregator) -> anyhow::Result<()>;
}

impl<F> OperationEffect for F
where
    F: Fn(&RequestContext, &mut ErrorAggregator) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, ctx: &RequestContext, errors: &mut ErrorAggregator) -> anyhow::Result<()> {
        self(ctx, errors)
    }
}

/// A toggleable secondary operation with dependencies.
///
/// Whether it runs by default is operation-specific; per-request overrides
/// come from `RunConfig`.
pub struct OperationSpec {
    name: String,
    depends_on: Vec<String>,
    enabled_by_default: bool,
    effect: Box<dyn OperationEffect>,
}

impl OperationSpec {
    /// Declare an operation. Disabled by default until stated otherwise.
    pub fn new(name: impl Into<String>, effect: impl OperationEffect + 'static) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            enabled_by_default: false,
            effect: Box::new(effect),
        }
    }

    /// Add a prerequisite operation by name.
    pub fn depends_on(mut self, dep: impl Into<String>) -> Self {
        self.depends_on.push(dep.into());
        self
    }

    /// Set the operation's default-enabled flag.
    pub fn enabled_by_default(mut self, enabled: bool) -> Self {
        self.enabled_by_default = enabled;
        self
    }

    /// Operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prerequisite operation names.
    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

impl std::fmt::Debug for OperationSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationSpec")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("enabled_by_default", &self.enabled_by_default)
            .finish_non_exhaustive()
    }
}

/// Registry configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("operation '{0}' is already registered")]
    DuplicateName(String),

    #[error("operation '{name}' depends on unregistered operation '{dependency}'")]
    UnknownDependency { name: String, dependency: String },

    #[error("run config references unknown operation '{0}'")]
    UnknownOperation(String),
}

/// Set-once per-request enable/disable overrides.
///
/// Names not mentioned fall back to each operation's default. The config is
/// fixed before the run starts; nothing toggles mid-lifecycle.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    overrides: HashMap<String, bool>,
}

impl RunConfig {
    /// All operations at their defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force an operation on for this run.
    pub fn enable(mut self, name: impl Into<String>) -> Self {
        self.overrides.insert(name.into(), true);
        self
    }

    /// Force an operation off for this run.
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.overrides.insert(name.into(), false);
        self
    }

    fn override_for(&self, name: &str) -> Option<bool> {
        self.overrides.get(name).copied()
    }
}

/// Insertion-ordered registry of optional operations.
///
/// Configured once per concrete command type and immutable thereafter.
/// `register` rejects an operation whose dependency is not already present,
/// which also makes dependency cycles unrepresentable.
#[derive(Default)]
pub struct OptionalOperationRegistry {
    operations: Vec<OperationSpec>,
    index: HashMap<String, usize>,
}

impl OptionalOperationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation after all of its dependencies.
    pub fn register(&mut self, spec: OperationSpec) -> Result<(), RegistryError> {
        if self.index.contains_key(spec.name()) {
            return Err(RegistryError::DuplicateName(spec.name().to_string()));
        }
        for dep in spec.dependencies() {
            if !self.index.contains_key(dep) {
                return Err(RegistryError::UnknownDependency {
                    name: spec.name().to_string(),
                    dependency: dep.clone(),
                });
            }
        }
        self.index.insert(spec.name().to_string(), self.operations.len());
        self.operations.push(spec);
        Ok(())
    }

    /// Whether an operation is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.name())
    }

    /// Check a run config against the registered names.
    pub fn validate_config(&self, config: &RunConfig) -> Result<(), RegistryError> {
        for name in config.overrides.keys() {
            if !self.contains(name) {
                return Err(RegistryError::UnknownOperation(name.clone()));
            }
        }
        Ok(())
    }

    /// Execute the set once, in registration order.
    ///
    /// Per operation: skipped when disabled, skipped when any dependency did
    /// not complete cleanly (disabled, skipped, and failed all count as
    /// not-satisfied), otherwise executed with its fault caught and recorded.
    /// No unrelated operation's outcome affects another.
    pub fn run(
        &self,
        config: &RunConfig,
        ctx: &RequestContext,
        errors: &mut ErrorAggregator,
    ) -> RunReport {
        let mut report = RunReport::new();
        for spec in &self.operations {
            let enabled = config
                .override_for(spec.name())
                .unwrap_or(spec.enabled_by_default);
            if !enabled {
                tracing::debug!(operation = spec.name(), "optional operation disabled");
                report.record(spec.name(), OperationStatus::Disabled);
                continue;
            }

            let unsatisfied = spec.dependencies().iter().find(|dep| {
                !report
                    .status(dep)
                    .map(OperationStatus::is_completed)
                    .unwrap_or(false)
            });
            if let Some(dep) = unsatisfied {
                tracing::debug!(
                    operation = spec.name(),
                    dependency = dep.as_str(),
                    "optional operation skipped, dependency not satisfied"
                );
                report.record(spec.name(), OperationStatus::SkippedDependency(dep.clone()));
                continue;
            }

            let faults_before = errors.system_fault_count();
            let status = match spec.effect.run(ctx, errors) {
                Ok(()) if errors.system_fault_count() == faults_before => {
                    OperationStatus::Completed
                }
                Ok(()) => OperationStatus::Failed,
                Err(cause) => {
                    errors.add_system_fault(SystemFault::internal(cause));
                    OperationStatus::Failed
                }
            };
            tracing::debug!(
                operation = spec.name(),
                status = status.as_str(),
                "optional operation ran"
            );
            report.record(spec.name(), status);
        }
        report
    }
}

impl std::fmt::Debug for OptionalOperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalOperationRegistry")
            .field("operations", &self.operations)
            .finish()
    }
}
